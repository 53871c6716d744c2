//! Channel Primitive - write sinks and replay-latest streams.
//!
//! Every driver input and output is a [`Stream`]. A stream is a single-threaded,
//! synchronous multicast channel:
//! - `next(v)` stores `v` as the latest value and delivers it to every subscriber
//!   before returning (no batching, no deduplication)
//! - a replay stream additionally redelivers its last `retention` values to each
//!   new subscriber at subscribe time
//! - `value()` reads the latest value regardless of retention
//!
//! Streams are cheap handles (`Rc` inside); cloning shares the channel.
//! They are never disposed individually. Once the owning host object is gone
//! nothing pushes into them anymore and they go inert.
//!
//! # Example
//!
//! ```ignore
//! use spark_mina::channel::Stream;
//!
//! let show = Stream::replay(1);
//! show.next(serde_json::json!({}));
//!
//! // Late subscriber still sees the last show event.
//! let unsubscribe = show.subscribe(|event| println!("show: {event}"));
//! unsubscribe();
//! ```

mod combine;

pub use combine::{combine_latest, tee};

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use spark_signals::{signal, Signal};

// =============================================================================
// Sink Capability
// =============================================================================

/// Write endpoint of a channel.
///
/// Anything the framework pushes values into implements this trait; the method
/// normalizer and the lifecycle callbacks only rely on this capability.
pub trait Sink<T> {
    /// Push a value.
    fn next(&self, value: T);
}

/// Unsubscribe function returned by [`Stream::subscribe`].
///
/// Dropping it without calling it keeps the subscription alive.
pub type Unsubscribe = Box<dyn FnOnce()>;

type Subscriber<T> = Rc<dyn Fn(&T)>;

// =============================================================================
// Stream
// =============================================================================

struct StreamInner<T> {
    retention: usize,
    latest: RefCell<Option<T>>,
    history: RefCell<VecDeque<T>>,
    subscribers: RefCell<Vec<(usize, Subscriber<T>)>>,
    next_id: Cell<usize>,
}

/// Multicast channel with optional replay of its latest values.
pub struct Stream<T> {
    inner: Rc<StreamInner<T>>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("retention", &self.inner.retention)
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .finish()
    }
}

impl<T: Clone + 'static> Stream<T> {
    fn with(retention: usize, initial: Option<T>) -> Self {
        let mut history = VecDeque::with_capacity(retention);
        if retention > 0 {
            if let Some(value) = &initial {
                history.push_back(value.clone());
            }
        }
        Self {
            inner: Rc::new(StreamInner {
                retention,
                latest: RefCell::new(initial),
                history: RefCell::new(history),
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Plain event channel with no value yet and no replay.
    pub fn empty() -> Self {
        Self::with(0, None)
    }

    /// Plain event channel holding `value` as its latest value.
    ///
    /// The value is readable through [`Stream::value`] but not replayed.
    pub fn of(value: T) -> Self {
        Self::with(0, Some(value))
    }

    /// Replay channel remembering its last `retention` values.
    pub fn replay(retention: usize) -> Self {
        Self::with(retention, None)
    }

    /// Replay channel seeded with `value`.
    pub fn replay_of(retention: usize, value: T) -> Self {
        Self::with(retention, Some(value))
    }

    /// Number of values redelivered to new subscribers.
    pub fn retention(&self) -> usize {
        self.inner.retention
    }

    /// Latest value pushed (or seeded), if any.
    pub fn value(&self) -> Option<T> {
        self.inner.latest.borrow().clone()
    }

    /// Push a value derived from the current one.
    ///
    /// `stream.mutate(|_| v)` is observably identical to `stream.next(v)`.
    pub fn mutate(&self, f: impl FnOnce(Option<&T>) -> T) {
        let value = {
            let latest = self.inner.latest.borrow();
            f(latest.as_ref())
        };
        self.emit(value);
    }

    /// Subscribe to values. Replayed values are delivered before this returns.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Unsubscribe {
        let subscriber: Subscriber<T> = Rc::new(f);
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner
            .subscribers
            .borrow_mut()
            .push((id, subscriber.clone()));

        // Snapshot so the subscriber may push into this stream while replaying.
        let replayed: Vec<T> = self.inner.history.borrow().iter().cloned().collect();
        for value in &replayed {
            subscriber(value);
        }

        let weak: Weak<StreamInner<T>> = Rc::downgrade(&self.inner);
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner
                    .subscribers
                    .borrow_mut()
                    .retain(|(subscriber_id, _)| *subscriber_id != id);
            }
        })
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Whether both handles point at the same channel.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn emit(&self, value: T) {
        *self.inner.latest.borrow_mut() = Some(value.clone());
        if self.inner.retention > 0 {
            let mut history = self.inner.history.borrow_mut();
            history.push_back(value.clone());
            while history.len() > self.inner.retention {
                history.pop_front();
            }
        }

        // Subscribers may subscribe, unsubscribe or push re-entrantly.
        let subscribers: Vec<Subscriber<T>> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|(_, subscriber)| subscriber.clone())
            .collect();
        for subscriber in subscribers {
            subscriber(&value);
        }
    }
}

impl<T: Clone + PartialEq + 'static> Stream<T> {
    /// Mirror this stream into a `spark_signals` signal.
    ///
    /// The signal starts at the current latest value and follows every push,
    /// so deriveds and effects can depend on a driver output directly.
    pub fn watch(&self) -> Signal<Option<T>> {
        let mirrored = signal(self.value());
        let target = mirrored.clone();
        // Lives as long as the stream.
        let _ = self.subscribe(move |value| {
            target.set(Some(value.clone()));
        });
        mirrored
    }
}

impl<T: Clone + 'static> Sink<T> for Stream<T> {
    fn next(&self, value: T) {
        self.emit(value);
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Push a value. Same as [`Sink::next`], callable without the trait in scope.
    pub fn next(&self, value: T) {
        self.emit(value);
    }
}

// =============================================================================
// TESTS
// =============================================================================
