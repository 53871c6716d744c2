//! # spark-mina
//!
//! Reactive lifecycle drivers for mini-program hosts.
//!
//! Integrates with [spark-signals](https://github.com/RLabs-Inc/spark-signals):
//! any driver output can be mirrored into a signal with [`Stream::watch`].
//!
//! ## Architecture
//!
//! The host owns long-lived page and app objects and drives them through
//! named lifecycle callbacks. A *driver* builds that callback table, registers
//! it with the host once per usage site, and hands the application streams
//! instead of callbacks:
//!
//! ```text
//! PageOptions ─▶ normalize methods ─▶ callback table ─▶ sub-drivers ─▶ lifetimes ─▶ Platform::register_page
//!                                          │
//! host calls onLoad/onShow/... ────────────┴─▶ outputs (load, show, data, dataChange, ...)
//! inputs["data"] ─▶ state sync ─▶ PageInstance::set_data
//! ```
//!
//! ## Modules
//!
//! - [`channel`] - Sinks and replay-latest streams
//! - [`framework`] - Callback tables, method normalizer, lifetime weaver,
//!   reserved-name guard, singleton manager, state sync, composition
//! - [`drivers`] - Page, app, share, exit-state, app-events and theme drivers
//! - [`host`] - Host platform contract and an in-process mock host
//! - [`logging`] - Logger bootstrap
//!
//! ## Example
//!
//! ```ignore
//! use spark_mina::*;
//!
//! let platform = Rc::new(MockPlatform::new());
//! let ctx = Context::new(platform.clone());
//!
//! let page = use_page_driver(&ctx, PageOptions {
//!     data: json!({ "count": 0 }),
//!     ..Default::default()
//! })?;
//! page.inputs.value("data").unwrap().next(json!({ "count": 1 }));
//! ```

pub mod channel;
pub mod drivers;
pub mod error;
pub mod framework;
pub mod host;
pub mod logging;

pub use channel::{combine_latest, tee, Sink, Stream, Unsubscribe};

pub use error::{Error, Result};

pub use framework::{
    callback, compose, detect_reserved, equip_lifetimes, normalize, normalize_one, Callback,
    CallbackTable, Channels, Context, DriverInstance, GeneralDriver, Lifetime, LifetimeDescriptor,
    Lifetimes, MethodDecl, MethodDescriptor, MethodSpec, MethodTable, Mode, NamedHandler, Others,
    Position, SingletonRegistry, Site, SiteState, Slot, StateChange, StateHost, StateSync,
    RESERVED_APP_NAMES, RESERVED_PAGE_NAMES,
};

pub use drivers::{
    exit_state_driver, share_driver, use_app_driver, use_app_events_driver, use_page_driver,
    use_theme_driver, AppConfig, AppOptions, Equip, ExitStateOptions, PageConfig, PageFeatures,
    PageOptions, ShareOptions, ThemeOptions, APP_DRIVER, APP_EVENTS_DRIVER, PAGE_DRIVER,
    THEME_DRIVER,
};

pub use host::mock::{MockApp, MockPage, MockPlatform};
pub use host::{
    AppInstance, AppRef, GlobalEvent, PageInstance, PageRef, Platform, RenderCallback, SystemInfo,
    Theme,
};

pub use logging::init_logging;
