//! Callback Table - the named slots handed to the host at registration.
//!
//! A table maps slot names to either a callback or a plain data value
//! (`data`, `globalData`, pass-through fields). Callbacks take the host object
//! as an explicit receiver instead of relying on call-site binding:
//!
//! ```ignore
//! let mut table: CallbackTable<PageRef> = CallbackTable::new();
//! table.insert_callback("onShow", |page, _args| {
//!     println!("{} shown", page.route());
//!     Value::Null
//! });
//! ```

use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value;

/// Slot callback: `(receiver, args) -> return value`.
pub type Callback<H> = Rc<dyn Fn(&H, &Value) -> Value>;

/// Wrap a closure as a [`Callback`].
pub fn callback<H, F>(f: F) -> Callback<H>
where
    F: Fn(&H, &Value) -> Value + 'static,
{
    Rc::new(f)
}

/// Content of one named slot.
pub enum Slot<H> {
    Callback(Callback<H>),
    Value(Value),
}

impl<H> Clone for Slot<H> {
    fn clone(&self) -> Self {
        match self {
            Self::Callback(f) => Self::Callback(f.clone()),
            Self::Value(v) => Self::Value(v.clone()),
        }
    }
}

impl<H> std::fmt::Debug for Slot<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Callback(_) => f.write_str("Callback(..)"),
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
        }
    }
}

impl<H> From<Value> for Slot<H> {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl<H> From<Callback<H>> for Slot<H> {
    fn from(f: Callback<H>) -> Self {
        Self::Callback(f)
    }
}

/// Named slots, later writes replace earlier ones.
pub struct CallbackTable<H> {
    slots: BTreeMap<String, Slot<H>>,
}

impl<H> Default for CallbackTable<H> {
    fn default() -> Self {
        Self {
            slots: BTreeMap::new(),
        }
    }
}

impl<H> Clone for CallbackTable<H> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
        }
    }
}

impl<H> std::fmt::Debug for CallbackTable<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.slots.iter()).finish()
    }
}

impl<H> CallbackTable<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a slot, replacing whatever was there.
    pub fn insert(&mut self, name: impl Into<String>, slot: impl Into<Slot<H>>) {
        self.slots.insert(name.into(), slot.into());
    }

    /// Set a callback slot.
    pub fn insert_callback<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&H, &Value) -> Value + 'static,
    {
        self.slots.insert(name.into(), Slot::Callback(Rc::new(f)));
    }

    /// Set a data slot.
    pub fn insert_value(&mut self, name: impl Into<String>, value: Value) {
        self.slots.insert(name.into(), Slot::Value(value));
    }

    pub fn get(&self, name: &str) -> Option<&Slot<H>> {
        self.slots.get(name)
    }

    /// Callback at `name`, if the slot holds one.
    pub fn callback(&self, name: &str) -> Option<Callback<H>> {
        match self.slots.get(name) {
            Some(Slot::Callback(f)) => Some(f.clone()),
            _ => None,
        }
    }

    /// Data value at `name`, if the slot holds one.
    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.slots.get(name) {
            Some(Slot::Value(v)) => Some(v),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn has_callback(&self, name: &str) -> bool {
        matches!(self.slots.get(name), Some(Slot::Callback(_)))
    }

    pub fn remove(&mut self, name: &str) -> Option<Slot<H>> {
        self.slots.remove(name)
    }

    /// Slot names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Invoke the callback at `name` with an explicit receiver.
    ///
    /// Returns `None` if the slot is missing or holds data.
    pub fn invoke(&self, name: &str, receiver: &H, args: &Value) -> Option<Value> {
        // Clone out first so the callback may reach back into whoever owns the table.
        let f = self.callback(name)?;
        Some(f(receiver, args))
    }
}
