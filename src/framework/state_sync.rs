//! State-Sync Pipeline - push values into a host-held state blob.
//!
//! The host applies state in two phases: its live state changes synchronously,
//! while the view acknowledges later through a callback. Each submission is
//! reported on both edges:
//!
//! ```text
//! input ──┐
//!         ├─ combine_latest ─▶ prev = snapshot
//! host ───┘                    host.apply_state(change, on_rendered)
//!                              cur = snapshot
//!                              changes.next({prev, cur, change})
//!                              current.next(cur)
//!                   ...later   rendered.next(snapshot)
//! ```
//!
//! # Invariants
//! - A submission made before the host object exists waits for it; only the
//!   latest submission and the latest host object are used.
//! - `prev` is read right before *this* submission's apply, so for consecutive
//!   submissions `prev[k + 1] == cur[k]`. No coalescing, no deduplication.
//! - The change record is emitted before the plain `cur` snapshot, and both
//!   before that submission's render acknowledgment, even if the host runs the
//!   render callback inside `apply_state`.
//! - Submissions are applied one at a time. One pushed from inside a
//!   subscriber waits until the current one has emitted both events.
//! - A render acknowledgment that never arrives is not an error; `rendered`
//!   just never emits for it.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::channel::{combine_latest, Stream};
use crate::host::RenderCallback;

/// Host object holding a mutable state blob.
pub trait StateHost {
    /// Structural snapshot of the live state.
    fn state(&self) -> Value;

    /// Merge `patch` into the live state before returning; run `on_rendered`
    /// once the change has been rendered, if the host renders at all.
    fn apply_state(&self, patch: Value, on_rendered: Option<RenderCallback>);
}

/// Both edges of one applied submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    /// Host state right before the apply call.
    pub prev: Value,
    /// Host state right after the apply call.
    pub cur: Value,
    /// The submitted value as given.
    pub change: Value,
}

/// Streams of one pipeline.
#[derive(Clone, Debug)]
pub struct StateSync {
    /// Submissions.
    pub input: Stream<Value>,
    /// Host state after each apply (replay 1).
    pub current: Stream<Value>,
    /// `{prev, cur, change}` per apply (replay 1).
    pub changes: Stream<StateChange>,
    /// Host state at each render acknowledgment (replay 1).
    pub rendered: Stream<Value>,
}

impl StateSync {
    /// Wire `input` to the latest host object in `host`.
    ///
    /// With a `seed`, the output streams start out replaying it (the change
    /// stream replays `{prev: null, cur: seed, change: seed}`); without one
    /// they start empty and the change stream replays an all-null record.
    pub fn attach<H>(host: &Stream<Option<H>>, input: Stream<Value>, seed: Option<Value>) -> Self
    where
        H: StateHost + Clone + 'static,
    {
        let (current, changes, rendered) = match seed {
            Some(seed) => (
                Stream::replay_of(1, seed.clone()),
                Stream::replay_of(
                    1,
                    StateChange {
                        prev: Value::Null,
                        cur: seed.clone(),
                        change: seed.clone(),
                    },
                ),
                Stream::replay_of(1, seed),
            ),
            None => (
                Stream::replay(1),
                Stream::replay_of(
                    1,
                    StateChange {
                        prev: Value::Null,
                        cur: Value::Null,
                        change: Value::Null,
                    },
                ),
                Stream::replay(1),
            ),
        };

        let sync = Self {
            input: input.clone(),
            current,
            changes,
            rendered,
        };

        // Submissions pushed while one is being applied (e.g. from a change
        // subscriber) run after it, in order.
        let applying = Cell::new(false);
        let pending: RefCell<VecDeque<(H, Value)>> = RefCell::new(VecDeque::new());
        let pipeline = sync.clone();
        let _ = combine_latest(host, &input).subscribe(move |(host, change)| {
            let Some(host) = host else {
                trace!("state sync: no live host object, submission held");
                return;
            };
            if applying.get() {
                trace!("state sync: apply in progress, submission queued");
                pending.borrow_mut().push_back((host.clone(), change.clone()));
                return;
            }

            applying.set(true);
            pipeline.apply(host, change);
            loop {
                let next = pending.borrow_mut().pop_front();
                match next {
                    Some((host, change)) => pipeline.apply(&host, &change),
                    None => break,
                }
            }
            applying.set(false);
        });

        sync
    }

    fn apply<H>(&self, host: &H, change: &Value)
    where
        H: StateHost + Clone + 'static,
    {
        let prev = host.state();

        // Render callbacks that fire inside apply_state are parked until the
        // synchronous edge has been reported.
        let applying = Rc::new(Cell::new(true));
        let parked: Rc<RefCell<Option<Value>>> = Rc::new(RefCell::new(None));
        let on_rendered: RenderCallback = {
            let applying = applying.clone();
            let parked = parked.clone();
            let rendered = self.rendered.clone();
            let host = host.clone();
            Box::new(move || {
                let snapshot = host.state();
                if applying.get() {
                    *parked.borrow_mut() = Some(snapshot);
                } else {
                    rendered.next(snapshot);
                }
            })
        };

        host.apply_state(change.clone(), Some(on_rendered));
        let cur = host.state();
        applying.set(false);

        debug!("state sync: applied change={} cur={}", change, cur);
        self.changes.next(StateChange {
            prev,
            cur: cur.clone(),
            change: change.clone(),
        });
        self.current.next(cur);

        let early = parked.borrow_mut().take();
        if let Some(snapshot) = early {
            self.rendered.next(snapshot);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Minimal host: shallow merge, render callbacks queued until flushed.
    #[derive(Clone, Default)]
    struct Blob {
        state: Rc<RefCell<Value>>,
        pending: Rc<RefCell<Vec<RenderCallback>>>,
        render_inline: bool,
    }

    impl Blob {
        fn new(state: Value) -> Self {
            Self {
                state: Rc::new(RefCell::new(state)),
                ..Self::default()
            }
        }

        fn flush(&self) {
            let pending: Vec<_> = self.pending.borrow_mut().drain(..).collect();
            for callback in pending {
                callback();
            }
        }
    }

    impl StateHost for Blob {
        fn state(&self) -> Value {
            self.state.borrow().clone()
        }

        fn apply_state(&self, patch: Value, on_rendered: Option<RenderCallback>) {
            {
                let mut state = self.state.borrow_mut();
                if let (Some(target), Value::Object(patch)) = (state.as_object_mut(), patch) {
                    target.extend(patch);
                }
            }
            if let Some(callback) = on_rendered {
                if self.render_inline {
                    callback();
                } else {
                    self.pending.borrow_mut().push(callback);
                }
            }
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    enum Event {
        Change(StateChange),
        Current(Value),
        Rendered(Value),
    }

    fn record(sync: &StateSync) -> Rc<RefCell<Vec<Event>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let e = events.clone();
        let _ = sync.changes.subscribe(move |c| e.borrow_mut().push(Event::Change(c.clone())));
        let e = events.clone();
        let _ = sync.current.subscribe(move |v| e.borrow_mut().push(Event::Current(v.clone())));
        let e = events.clone();
        let _ = sync.rendered.subscribe(move |v| e.borrow_mut().push(Event::Rendered(v.clone())));
        events.borrow_mut().clear();
        events
    }

    #[test]
    fn test_counter_scenario() {
        let blob = Blob::new(json!({ "count": 0 }));
        let host = Stream::replay_of(1, Some(blob.clone()));
        let sync = StateSync::attach(&host, Stream::empty(), Some(json!({ "count": 0 })));
        let events = record(&sync);

        sync.input.next(json!({ "count": 1 }));
        assert_eq!(
            *events.borrow(),
            vec![
                Event::Change(StateChange {
                    prev: json!({ "count": 0 }),
                    cur: json!({ "count": 1 }),
                    change: json!({ "count": 1 }),
                }),
                Event::Current(json!({ "count": 1 })),
            ]
        );

        blob.flush();
        assert_eq!(
            events.borrow().last(),
            Some(&Event::Rendered(json!({ "count": 1 })))
        );
    }

    #[test]
    fn test_prev_chains_to_previous_cur() {
        let blob = Blob::new(json!({ "a": 0 }));
        let host = Stream::replay_of(1, Some(blob.clone()));
        let sync = StateSync::attach(&host, Stream::empty(), None);

        let changes = Rc::new(RefCell::new(Vec::new()));
        let c = changes.clone();
        let _ = sync.changes.subscribe(move |change| c.borrow_mut().push(change.clone()));
        changes.borrow_mut().clear();

        for i in 1..=4 {
            sync.input.next(json!({ "a": i }));
        }

        let changes = changes.borrow();
        assert_eq!(changes.len(), 4);
        for pair in changes.windows(2) {
            assert_eq!(pair[1].prev, pair[0].cur);
        }
    }

    #[test]
    fn test_submission_waits_for_host() {
        let host: Stream<Option<Blob>> = Stream::replay(1);
        let sync = StateSync::attach(&host, Stream::empty(), Some(json!({})));
        let events = record(&sync);

        sync.input.next(json!({ "early": 1 }));
        sync.input.next(json!({ "early": 2 }));
        assert!(events.borrow().is_empty());

        let blob = Blob::new(json!({}));
        host.next(Some(blob.clone()));

        // Only the latest submission is applied.
        assert_eq!(blob.state(), json!({ "early": 2 }));
        assert_eq!(events.borrow().len(), 2);
    }

    #[test]
    fn test_unloaded_host_is_skipped() {
        let blob = Blob::new(json!({}));
        let host = Stream::replay_of(1, Some(blob.clone()));
        let sync = StateSync::attach(&host, Stream::empty(), None);

        host.next(None);
        let events = record(&sync);
        sync.input.next(json!({ "x": 1 }));

        assert!(events.borrow().is_empty());
        assert_eq!(blob.state(), json!({}));
    }

    #[test]
    fn test_change_is_raw_submission() {
        let blob = Blob::new(json!({ "keep": true }));
        let host = Stream::replay_of(1, Some(blob));
        let sync = StateSync::attach(&host, Stream::empty(), None);

        sync.input.next(json!({ "x": 1 }));
        let change = sync.changes.value().unwrap();
        assert_eq!(change.change, json!({ "x": 1 }));
        assert_eq!(change.cur, json!({ "keep": true, "x": 1 }));
    }

    #[test]
    fn test_inline_render_reported_last() {
        let mut blob = Blob::new(json!({}));
        blob.render_inline = true;
        let host = Stream::replay_of(1, Some(blob));
        let sync = StateSync::attach(&host, Stream::empty(), None);
        let events = record(&sync);

        sync.input.next(json!({ "x": 1 }));

        let events = events.borrow();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], Event::Change(_)));
        assert!(matches!(events[1], Event::Current(_)));
        assert_eq!(events[2], Event::Rendered(json!({ "x": 1 })));
    }

    #[test]
    fn test_submission_from_subscriber_runs_after_current() {
        let blob = Blob::new(json!({ "count": 0 }));
        let host = Stream::replay_of(1, Some(blob.clone()));
        let sync = StateSync::attach(&host, Stream::empty(), None);
        let events = record(&sync);

        let input = sync.input.clone();
        let _ = sync.changes.subscribe(move |change| {
            if change.cur == json!({ "count": 1 }) {
                input.next(json!({ "count": 2 }));
            }
        });

        sync.input.next(json!({ "count": 1 }));

        assert_eq!(blob.state(), json!({ "count": 2 }));
        assert_eq!(sync.current.value(), Some(json!({ "count": 2 })));
        assert_eq!(
            *events.borrow(),
            vec![
                Event::Change(StateChange {
                    prev: json!({ "count": 0 }),
                    cur: json!({ "count": 1 }),
                    change: json!({ "count": 1 }),
                }),
                Event::Current(json!({ "count": 1 })),
                Event::Change(StateChange {
                    prev: json!({ "count": 1 }),
                    cur: json!({ "count": 2 }),
                    change: json!({ "count": 2 }),
                }),
                Event::Current(json!({ "count": 2 })),
            ]
        );
    }

    #[test]
    fn test_missing_render_ack_is_silent() {
        let blob = Blob::new(json!({}));
        let host = Stream::replay_of(1, Some(blob));
        let sync = StateSync::attach(&host, Stream::empty(), None);

        sync.input.next(json!({ "x": 1 }));
        // Never flushed.
        assert_eq!(sync.rendered.value(), None);
        assert_eq!(sync.current.value(), Some(json!({ "x": 1 })));
    }

    #[test]
    fn test_seeded_outputs() {
        let host: Stream<Option<Blob>> = Stream::replay(1);
        let seeded = StateSync::attach(&host, Stream::empty(), Some(json!({ "n": 0 })));
        assert_eq!(seeded.current.value(), Some(json!({ "n": 0 })));
        assert_eq!(
            seeded.changes.value(),
            Some(StateChange {
                prev: Value::Null,
                cur: json!({ "n": 0 }),
                change: json!({ "n": 0 }),
            })
        );

        let unseeded = StateSync::attach(&host, Stream::empty(), None);
        assert_eq!(unseeded.current.value(), None);
        assert_eq!(unseeded.changes.value().unwrap().cur, Value::Null);
    }
}
