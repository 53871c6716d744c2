//! Exit-state sub-driver - keep page state across a host cold start.
//!
//! The host asks `onSaveExitState` for a blob before it kills a page in the
//! background and hands that blob back on the next `onLoad`. The driver:
//! - answers `onSaveExitState` with the latest `exitState` input, stamped with an
//!   expiry unless the application already provided one
//! - emits the restored blob on the `exitState` output right after `onLoad`

use std::rc::Rc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::debug;
use serde_json::{json, Map, Value};

use super::Equip;
use crate::channel::Stream;
use crate::error::{Error, Result};
use crate::framework::driver::DriverInstance;
use crate::framework::lifetimes::{equip_lifetimes, LifetimeDescriptor, Position};
use crate::framework::table::CallbackTable;
use crate::host::PageRef;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone, Copy, Debug)]
pub struct ExitStateOptions {
    pub enabled: bool,
    /// Equip the table immediately.
    pub auto_equip: bool,
    /// Lifetime of a saved blob that carries no `expireTimeStamp`.
    pub ttl: Duration,
}

impl Default for ExitStateOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            auto_equip: false,
            ttl: DAY,
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

fn has_expiry(fields: &Map<String, Value>) -> bool {
    match fields.get("expireTimeStamp") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

fn expiry(ttl: Duration) -> u64 {
    now_millis().saturating_add(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX))
}

/// Blob handed to the host for `state`.
fn saved_state(state: Option<Value>, ttl: Duration) -> Value {
    match state {
        Some(Value::Object(fields)) if has_expiry(&fields) => Value::Object(fields),
        state => json!({
            "data": state.unwrap_or(Value::Null),
            "expireTimeStamp": expiry(ttl),
        }),
    }
}

/// Build the exit-state sub-driver.
///
/// The table must already define an `onLoad` callback, even when `auto_equip`
/// is off, since equipping hooks into it.
pub fn exit_state_driver(
    table: &mut CallbackTable<PageRef>,
    options: ExitStateOptions,
) -> Result<DriverInstance> {
    if !options.enabled {
        return Ok(DriverInstance::empty());
    }
    if !table.has_callback("onLoad") {
        return Err(Error::MissingPrerequisite {
            driver: "exit-state",
            slot: "onLoad",
        });
    }

    let exit_state_in = Stream::of(json!({}));
    let exit_state_out: Stream<Value> = Stream::replay(1);
    let ttl = options.ttl;

    let equip: Equip = {
        let exit_state_in = exit_state_in.clone();
        let exit_state_out = exit_state_out.clone();

        Rc::new(move |table: &mut CallbackTable<PageRef>| -> Result<()> {
            let restored = exit_state_out.clone();
            equip_lifetimes(
                table,
                vec![(
                    "onLoad".to_string(),
                    LifetimeDescriptor::new(move |page: &PageRef, _: &Value| {
                        if let Some(state) = page.exit_state() {
                            debug!("exit state restored route={}", page.route());
                            restored.next(state);
                        }
                        Value::Null
                    })
                    .position(Position::Post)
                    .into(),
                )],
            )?;

            if !table.contains("onSaveExitState") {
                let latest = exit_state_in.clone();
                table.insert_callback("onSaveExitState", move |_: &PageRef, _: &Value| {
                    saved_state(latest.value(), ttl)
                });
            }
            Ok(())
        })
    };

    if options.auto_equip {
        equip(table)?;
    }

    let mut instance = DriverInstance::empty();
    instance.inputs.insert("exitState", exit_state_in);
    instance.outputs.insert("exitState", exit_state_out);
    instance.others.insert("equip", equip);
    Ok(instance)
}
