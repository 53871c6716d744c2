//! Driver Instance and Sub-Driver Composer.
//!
//! A driver hands back three maps:
//! - `inputs`  - sinks the application pushes into (`data`, method sinks, ...)
//! - `outputs` - streams the application subscribes to (`load`, `dataChange`, ...)
//! - `others`  - helpers exposed for manual wiring (e.g. a sub-driver's `equip`)
//!
//! Channel payload types differ (`Value`, `StateChange`, host handles), so the
//! channel maps store type-erased streams and are read back with a typed lookup:
//!
//! ```ignore
//! let load = driver.outputs.get::<Value>("load").unwrap();
//! let page = driver.outputs.get::<Option<PageRef>>("page").unwrap();
//! ```

use std::any::Any;
use std::collections::BTreeMap;

use serde_json::Value;

use crate::channel::Stream;

// =============================================================================
// Channels
// =============================================================================

/// Named, heterogeneously typed streams.
#[derive(Default)]
pub struct Channels {
    entries: BTreeMap<String, Box<dyn Any>>,
}

impl Channels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a channel.
    pub fn insert<T: Clone + 'static>(&mut self, name: impl Into<String>, stream: Stream<T>) {
        self.entries.insert(name.into(), Box::new(stream));
    }

    /// Stream under `name` if it carries `T`.
    pub fn get<T: Clone + 'static>(&self, name: &str) -> Option<Stream<T>> {
        self.entries
            .get(name)
            .and_then(|entry| entry.downcast_ref::<Stream<T>>())
            .cloned()
    }

    /// Shorthand for JSON-valued channels.
    pub fn value(&self, name: &str) -> Option<Stream<Value>> {
        self.get::<Value>(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shallow merge; on a name clash `other` wins.
    pub fn extend(&mut self, other: Channels) {
        self.entries.extend(other.entries);
    }
}

impl std::fmt::Debug for Channels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

// =============================================================================
// Others
// =============================================================================

/// Named auxiliary values.
#[derive(Default)]
pub struct Others {
    entries: BTreeMap<String, Box<dyn Any>>,
}

impl Others {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: 'static>(&mut self, name: impl Into<String>, value: T) {
        self.entries.insert(name.into(), Box::new(value));
    }

    /// Clone of the value under `name` if it is a `T`.
    pub fn get<T: Clone + 'static>(&self, name: &str) -> Option<T> {
        self.entries
            .get(name)
            .and_then(|entry| entry.downcast_ref::<T>())
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Others {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

// =============================================================================
// Driver Instance
// =============================================================================

/// What a driver factory produces.
#[derive(Debug, Default)]
pub struct DriverInstance {
    pub inputs: Channels,
    pub outputs: Channels,
    pub others: Others,
}

impl DriverInstance {
    /// Instance of a disabled driver.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.outputs.is_empty() && self.others.is_empty()
    }
}

/// Merge sub-driver channels into the parent, in order.
///
/// Only `inputs` and `outputs` are merged; each sub-driver keeps its own
/// `others`. Names are expected to be disjoint. When they are not, the later
/// sub-driver silently replaces the earlier channel.
pub fn compose(parent: &mut DriverInstance, subs: impl IntoIterator<Item = DriverInstance>) {
    for sub in subs {
        parent.inputs.extend(sub.inputs);
        parent.outputs.extend(sub.outputs);
    }
}
