//! Lifetime Weaver - layer extra behavior onto named callback slots.
//!
//! Lets user code and sub-drivers hook a slot the framework already owns
//! without replacing it:
//!
//! | existing slot | mode        | result                                      |
//! |---------------|-------------|---------------------------------------------|
//! | none          | any         | new behavior only                           |
//! | some          | `Overwrite` | new behavior only                           |
//! | some          | `Inject`    | new + original, ordered by `Position`       |
//!
//! Both behaviors receive the same receiver and arguments. An injected slot
//! returns the original callback's value.

use serde_json::Value;

use super::table::{callback, Callback, CallbackTable};
use crate::error::{Error, Result};

/// Where injected behavior runs relative to the original.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Position {
    #[default]
    Pre,
    Post,
}

/// Whether the original callback survives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Inject,
    Overwrite,
}

/// How one behavior attaches to one slot.
pub struct LifetimeDescriptor<H> {
    pub position: Position,
    pub mode: Mode,
    pub handler: Option<Callback<H>>,
}

impl<H> Default for LifetimeDescriptor<H> {
    fn default() -> Self {
        Self {
            position: Position::default(),
            mode: Mode::default(),
            handler: None,
        }
    }
}

impl<H> LifetimeDescriptor<H> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&H, &Value) -> Value + 'static,
    {
        Self {
            handler: Some(callback(f)),
            ..Self::default()
        }
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}

/// A bare callback (pre/inject) or a full descriptor.
pub enum Lifetime<H> {
    Handler(Callback<H>),
    Descriptor(LifetimeDescriptor<H>),
}

impl<H> Lifetime<H> {
    pub fn handler<F>(f: F) -> Self
    where
        F: Fn(&H, &Value) -> Value + 'static,
    {
        Self::Handler(callback(f))
    }
}

impl<H> From<LifetimeDescriptor<H>> for Lifetime<H> {
    fn from(descriptor: LifetimeDescriptor<H>) -> Self {
        Self::Descriptor(descriptor)
    }
}

impl<H> From<Callback<H>> for Lifetime<H> {
    fn from(f: Callback<H>) -> Self {
        Self::Handler(f)
    }
}

/// Slot name → lifetime, applied in order.
pub type Lifetimes<H> = Vec<(String, Lifetime<H>)>;

/// Weave `lifetimes` into `table` in place.
///
/// All entries are validated before any slot is touched, so a failing call
/// leaves the table unchanged.
pub fn equip_lifetimes<H: 'static>(
    table: &mut CallbackTable<H>,
    lifetimes: Lifetimes<H>,
) -> Result<&mut CallbackTable<H>> {
    let mut resolved = Vec::with_capacity(lifetimes.len());
    for (name, lifetime) in lifetimes {
        let (position, mode, handler) = match lifetime {
            Lifetime::Handler(f) => (Position::Pre, Mode::Inject, f),
            Lifetime::Descriptor(LifetimeDescriptor {
                position,
                mode,
                handler,
            }) => match handler {
                Some(f) => (position, mode, f),
                None => return Err(Error::InvalidLifetime { name }),
            },
        };
        resolved.push((name, position, mode, handler));
    }

    for (name, position, mode, handler) in resolved {
        let original = table.callback(&name);
        match (original, mode) {
            (Some(original), Mode::Inject) => {
                let woven = match position {
                    Position::Pre => callback(move |receiver: &H, args: &Value| {
                        handler(receiver, args);
                        original(receiver, args)
                    }),
                    Position::Post => callback(move |receiver: &H, args: &Value| {
                        let result = original(receiver, args);
                        handler(receiver, args);
                        result
                    }),
                };
                table.insert(name, woven);
            }
            _ => table.insert(name, handler),
        }
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    fn table_with_original(log: &Log) -> CallbackTable<()> {
        let mut table = CallbackTable::new();
        let log = log.clone();
        table.insert_callback("onShow", move |_: &(), args: &Value| {
            log.borrow_mut().push(format!("O{args}"));
            json!("original")
        });
        table
    }

    fn new_behavior(log: Log) -> impl Fn(&(), &Value) -> Value + 'static {
        move |_: &(), args: &Value| {
            log.borrow_mut().push(format!("N{args}"));
            json!("new")
        }
    }

    #[test]
    fn test_inject_pre_runs_new_first() {
        let log: Log = Rc::default();
        let mut table = table_with_original(&log);

        equip_lifetimes(
            &mut table,
            vec![("onShow".into(), Lifetime::handler(new_behavior(log.clone())))],
        )
        .unwrap();

        let result = table.invoke("onShow", &(), &json!(1));
        assert_eq!(*log.borrow(), vec!["N1", "O1"]);
        assert_eq!(result, Some(json!("original")));
    }

    #[test]
    fn test_inject_post_runs_new_after() {
        let log: Log = Rc::default();
        let mut table = table_with_original(&log);

        equip_lifetimes(
            &mut table,
            vec![(
                "onShow".into(),
                LifetimeDescriptor::new(new_behavior(log.clone()))
                    .position(Position::Post)
                    .into(),
            )],
        )
        .unwrap();

        table.invoke("onShow", &(), &json!(2));
        assert_eq!(*log.borrow(), vec!["O2", "N2"]);
    }

    #[test]
    fn test_overwrite_drops_original() {
        let log: Log = Rc::default();
        let mut table = table_with_original(&log);

        equip_lifetimes(
            &mut table,
            vec![(
                "onShow".into(),
                LifetimeDescriptor::new(new_behavior(log.clone()))
                    .mode(Mode::Overwrite)
                    .into(),
            )],
        )
        .unwrap();

        let result = table.invoke("onShow", &(), &json!(3));
        assert_eq!(*log.borrow(), vec!["N3"]);
        assert_eq!(result, Some(json!("new")));
    }

    #[test]
    fn test_empty_slot_gets_new_behavior() {
        let log: Log = Rc::default();
        let mut table: CallbackTable<()> = CallbackTable::new();
        table.insert_value("onHide", json!("not a callback"));

        equip_lifetimes(
            &mut table,
            vec![("onHide".into(), Lifetime::handler(new_behavior(log.clone())))],
        )
        .unwrap();

        table.invoke("onHide", &(), &json!(4));
        assert_eq!(*log.borrow(), vec!["N4"]);
    }

    #[test]
    fn test_receiver_is_passed_through() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut table: CallbackTable<&'static str> = CallbackTable::new();
        let original_seen = seen.clone();
        table.insert_callback("onLoad", move |receiver: &&'static str, _: &Value| {
            original_seen.borrow_mut().push(format!("O:{receiver}"));
            Value::Null
        });
        let new_seen = seen.clone();
        equip_lifetimes(
            &mut table,
            vec![(
                "onLoad".into(),
                Lifetime::handler(move |receiver: &&'static str, _: &Value| {
                    new_seen.borrow_mut().push(format!("N:{receiver}"));
                    Value::Null
                }),
            )],
        )
        .unwrap();

        table.invoke("onLoad", &"page-a", &Value::Null);
        assert_eq!(*seen.borrow(), vec!["N:page-a", "O:page-a"]);
    }

    #[test]
    fn test_descriptor_without_handler_fails_atomically() {
        let log: Log = Rc::default();
        let mut table = table_with_original(&log);

        let result = equip_lifetimes(
            &mut table,
            vec![
                ("onHide".into(), Lifetime::handler(new_behavior(log.clone()))),
                ("onShow".into(), LifetimeDescriptor::default().into()),
            ],
        );

        match result {
            Err(Error::InvalidLifetime { name }) => assert_eq!(name, "onShow"),
            _ => panic!("expected InvalidLifetime"),
        }
        assert!(!table.contains("onHide"));
    }

    #[test]
    fn test_stacked_injections() {
        let log: Log = Rc::default();
        let mut table = table_with_original(&log);
        let first = log.clone();
        let second = log.clone();

        equip_lifetimes(
            &mut table,
            vec![
                (
                    "onShow".into(),
                    Lifetime::handler(move |_: &(), _: &Value| {
                        first.borrow_mut().push("A".into());
                        Value::Null
                    }),
                ),
                (
                    "onShow".into(),
                    LifetimeDescriptor::new(move |_: &(), _: &Value| {
                        second.borrow_mut().push("B".into());
                        Value::Null
                    })
                    .position(Position::Post)
                    .into(),
                ),
            ],
        )
        .unwrap();

        table.invoke("onShow", &(), &json!(0));
        assert_eq!(*log.borrow(), vec!["A", "O0", "B"]);
    }
}
