//! Singleton Context Manager - run a driver's setup once per usage site.
//!
//! Driver setup registers a table with the host, which must not happen twice.
//! A [`GeneralDriver`] wraps the setup function; every `use_driver` call is keyed
//! by the *site* it comes from (the caller's source location by default):
//!
//! ```text
//! Uninitialized --use_driver(opts)--> run setup, memoize --> Ready
//! Ready         --use_driver(any)---> same Rc<DriverInstance>, options ignored
//! ```
//!
//! A setup that fails leaves the site Uninitialized. There is no torn-down
//! state: if the host destroys and recreates its object, the memoized
//! instance goes stale.

use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::panic::Location;
use std::rc::Rc;

use log::debug;

use super::context::Context;
use super::driver::DriverInstance;
use crate::error::Result;

// =============================================================================
// Usage Sites
// =============================================================================

/// Identity of a logical call site.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Site {
    /// Source location of a `#[track_caller]` entry point.
    Location {
        file: &'static str,
        line: u32,
        column: u32,
    },
    /// Explicit key chosen by the caller.
    Named(&'static str),
}

impl Site {
    /// Location of whoever called the surrounding `#[track_caller]` chain.
    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self::Location {
            file: location.file(),
            line: location.line(),
            column: location.column(),
        }
    }

    pub const fn named(key: &'static str) -> Self {
        Self::Named(key)
    }
}

/// Lifecycle of one registry entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SiteState {
    Uninitialized,
    Ready,
}

// =============================================================================
// Registry
// =============================================================================

type SiteKey = (&'static str, Site);

/// Memoized driver instances keyed by driver name and usage site.
#[derive(Default)]
pub struct SingletonRegistry {
    entries: RefCell<HashMap<SiteKey, Rc<DriverInstance>>>,
}

impl SingletonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Memoized instance for `(driver, site)`, running `init` on first use.
    ///
    /// `init` may itself use other drivers; no borrow is held while it runs.
    pub fn get_or_try_init(
        &self,
        driver: &'static str,
        site: Site,
        init: impl FnOnce() -> Result<DriverInstance>,
    ) -> Result<Rc<DriverInstance>> {
        let key = (driver, site);
        if let Some(existing) = self.entries.borrow().get(&key) {
            debug!("driver={} site={:?} status=reused", driver, site);
            return Ok(existing.clone());
        }

        let instance = Rc::new(init()?);
        let stored = self
            .entries
            .borrow_mut()
            .entry(key)
            .or_insert(instance)
            .clone();
        debug!("driver={} site={:?} status=initialized", driver, site);
        Ok(stored)
    }

    pub fn state(&self, driver: &'static str, site: Site) -> SiteState {
        if self.entries.borrow().contains_key(&(driver, site)) {
            SiteState::Ready
        } else {
            SiteState::Uninitialized
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

// =============================================================================
// General Driver
// =============================================================================

/// Driver setup function.
pub type DriverFactory<O> = fn(&Context, O) -> Result<DriverInstance>;

/// A driver factory with singleton semantics per usage site.
pub struct GeneralDriver<O> {
    name: &'static str,
    factory: DriverFactory<O>,
    _options: PhantomData<fn(O)>,
}

impl<O> GeneralDriver<O> {
    pub const fn new(name: &'static str, factory: DriverFactory<O>) -> Self {
        Self {
            name,
            factory,
            _options: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Use the driver at the caller's source location.
    #[track_caller]
    pub fn use_driver(&self, ctx: &Context, options: O) -> Result<Rc<DriverInstance>> {
        self.use_at(ctx, Site::caller(), options)
    }

    /// Use the driver at an explicit site.
    ///
    /// Only the first successful call's `options` take effect.
    pub fn use_at(&self, ctx: &Context, site: Site, options: O) -> Result<Rc<DriverInstance>> {
        ctx.singletons()
            .get_or_try_init(self.name, site, || (self.factory)(ctx, options))
    }

    /// Run the setup unconditionally, bypassing the registry.
    pub fn create(&self, ctx: &Context, options: O) -> Result<DriverInstance> {
        (self.factory)(ctx, options)
    }
}
