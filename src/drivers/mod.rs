//! Drivers Module - ready-made drivers for the host's pages and app
//!
//! - **Page** - page lifecycle, page data, custom methods
//! - **Share** - share / favorites hooks (page sub-driver)
//! - **Exit state** - save and restore state across cold starts (page sub-driver)
//! - **App** - app lifecycle and global data
//! - **App events** - process-wide host notifications
//! - **Theme** - current light/dark theme

pub mod app;
pub mod app_events;
pub mod exit_state;
pub mod page;
pub mod share;
pub mod theme;

use std::rc::Rc;

use crate::error::Result;
use crate::framework::table::CallbackTable;
use crate::host::PageRef;

/// Installs a sub-driver's slots into a page callback table.
///
/// Exposed under `others["equip"]` for sub-drivers built with `auto_equip: false`.
pub type Equip = Rc<dyn Fn(&mut CallbackTable<PageRef>) -> Result<()>>;

pub use app::{use_app_driver, AppConfig, AppOptions, APP_DRIVER};
pub use app_events::{use_app_events_driver, APP_EVENTS_DRIVER};
pub use exit_state::{exit_state_driver, ExitStateOptions};
pub use page::{use_page_driver, PageConfig, PageFeatures, PageOptions, PAGE_DRIVER};
pub use share::{share_driver, ShareOptions};
pub use theme::{use_theme_driver, ThemeOptions, THEME_DRIVER};
