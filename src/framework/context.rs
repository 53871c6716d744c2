//! Runtime Context - the explicit store every driver is constructed against.
//!
//! Holds what would otherwise be module-level globals:
//! - the host [`Platform`]
//! - the singleton registry (one memoized driver per usage site)
//! - the process-wide app holder, filled by the app driver's `onLaunch`
//!
//! Create one `Context` at startup, before any driver is used, and pass it by
//! reference to every `use_*_driver` call. Nothing is registered at module load.

use std::rc::Rc;

use super::singleton::SingletonRegistry;
use crate::channel::Stream;
use crate::host::{AppRef, Platform};

pub struct Context {
    platform: Rc<dyn Platform>,
    singletons: SingletonRegistry,
    app: Stream<Option<AppRef>>,
}

impl Context {
    pub fn new(platform: Rc<dyn Platform>) -> Self {
        Self {
            platform,
            singletons: SingletonRegistry::new(),
            app: Stream::replay(1),
        }
    }

    pub fn platform(&self) -> &Rc<dyn Platform> {
        &self.platform
    }

    pub fn singletons(&self) -> &SingletonRegistry {
        &self.singletons
    }

    /// Latest live app object, replayed to late subscribers.
    pub fn app(&self) -> &Stream<Option<AppRef>> {
        &self.app
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("singletons", &self.singletons.len())
            .field("app_launched", &self.app.value().flatten().is_some())
            .finish()
    }
}
