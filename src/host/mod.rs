//! Host platform contract.
//!
//! The host owns the long-lived page and app objects. The framework only ever
//! touches it through these traits:
//! - [`Platform`] registers callback tables and delivers process-wide events
//! - [`PageInstance`] / [`AppInstance`] are the receivers passed to every
//!   lifecycle callback
//!
//! [`mock`] provides an in-process host used by tests and demos.

pub mod mock;

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::framework::state_sync::StateHost;
use crate::framework::table::CallbackTable;

/// Shared handle to a live page object.
pub type PageRef = Rc<dyn PageInstance>;

/// Shared handle to the live app object.
pub type AppRef = Rc<dyn AppInstance>;

/// Callback run by the host once a state update has been rendered.
pub type RenderCallback = Box<dyn FnOnce()>;

// =============================================================================
// Host Objects
// =============================================================================

/// A live page object.
pub trait PageInstance {
    /// Route the page was registered under.
    fn route(&self) -> String;

    /// Current page data. Updated synchronously by [`PageInstance::set_data`].
    fn data(&self) -> Value;

    /// Merge `patch` into the page data.
    ///
    /// The data is updated before this returns; `on_rendered` runs later, once
    /// the view has caught up (or never, if rendering fails).
    fn set_data(&self, patch: Value, on_rendered: Option<RenderCallback>);

    /// State saved by the page's `onSaveExitState` before the previous exit,
    /// if the host restored it.
    fn exit_state(&self) -> Option<Value>;
}

/// The live app object.
pub trait AppInstance {
    /// Current global data.
    fn global_data(&self) -> Value;

    /// Merge `patch` into the global data, synchronously.
    fn set_global_data(&self, patch: Value);
}

impl StateHost for PageRef {
    fn state(&self) -> Value {
        self.data()
    }

    fn apply_state(&self, patch: Value, on_rendered: Option<RenderCallback>) {
        self.set_data(patch, on_rendered);
    }
}

impl StateHost for AppRef {
    fn state(&self) -> Value {
        self.global_data()
    }

    fn apply_state(&self, patch: Value, _on_rendered: Option<RenderCallback>) {
        // Global data has no view, nothing to acknowledge.
        self.set_global_data(patch);
    }
}

// =============================================================================
// Platform
// =============================================================================

/// Process-wide notifications any number of listeners can subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GlobalEvent {
    Error,
    PageNotFound,
    UnhandledRejection,
    ThemeChange,
    AudioInterruptionBegin,
    AudioInterruptionEnd,
    AppShow,
    AppHide,
}

impl GlobalEvent {
    /// Every event, in subscription order.
    pub const ALL: [GlobalEvent; 8] = [
        GlobalEvent::Error,
        GlobalEvent::PageNotFound,
        GlobalEvent::UnhandledRejection,
        GlobalEvent::ThemeChange,
        GlobalEvent::AudioInterruptionBegin,
        GlobalEvent::AudioInterruptionEnd,
        GlobalEvent::AppShow,
        GlobalEvent::AppHide,
    ];

    /// Output channel name used by the app-events driver.
    pub fn channel_name(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::PageNotFound => "pageNotFound",
            Self::UnhandledRejection => "unhandledRejection",
            Self::ThemeChange => "themeChange",
            Self::AudioInterruptionBegin => "audioInterruptionBegin",
            Self::AudioInterruptionEnd => "audioInterruptionEnd",
            Self::AppShow => "appShow",
            Self::AppHide => "appHide",
        }
    }
}

/// UI theme reported by the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Parse the host's theme string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

/// Static facts about the host environment.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    /// `None` when the host has dark-mode support switched off.
    pub theme: Option<Theme>,
    pub system: String,
    pub sdk_version: String,
}

/// Host registration and global event entry points.
pub trait Platform {
    /// Materialize a page object from a callback table.
    fn register_page(&self, table: CallbackTable<PageRef>);

    /// Materialize the app object from a callback table.
    fn register_app(&self, table: CallbackTable<AppRef>);

    /// Listen to a process-wide event.
    fn subscribe(&self, event: GlobalEvent, listener: Box<dyn Fn(&Value)>);

    fn system_info(&self) -> SystemInfo;
}
