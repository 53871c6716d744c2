//! Stream combinators used by the drivers.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::Stream;

/// Emit the pair of latest values whenever either side changes.
///
/// Nothing is emitted until both sides have produced a value. Values replayed by
/// either side at subscribe time count as changes.
pub fn combine_latest<A, B>(left: &Stream<A>, right: &Stream<B>) -> Stream<(A, B)>
where
    A: Clone + 'static,
    B: Clone + 'static,
{
    let out = Stream::empty();
    let latest_left: Rc<RefCell<Option<A>>> = Rc::new(RefCell::new(None));
    let latest_right: Rc<RefCell<Option<B>>> = Rc::new(RefCell::new(None));

    {
        let out = out.clone();
        let latest_left = latest_left.clone();
        let latest_right = latest_right.clone();
        let _ = left.subscribe(move |a: &A| {
            *latest_left.borrow_mut() = Some(a.clone());
            let pair = latest_right.borrow().clone().map(|b| (a.clone(), b));
            if let Some(pair) = pair {
                out.next(pair);
            }
        });
    }
    {
        let out = out.clone();
        let _ = right.subscribe(move |b: &B| {
            *latest_right.borrow_mut() = Some(b.clone());
            let pair = latest_left.borrow().clone().map(|a| (a, b.clone()));
            if let Some(pair) = pair {
                out.next(pair);
            }
        });
    }

    out
}

/// Forward values symmetrically between two streams.
///
/// A value pushed into either side shows up on the other exactly once; the
/// echo back to the origin is suppressed.
pub fn tee<T: Clone + 'static>(a: &Stream<T>, b: &Stream<T>) {
    let forwarding = Rc::new(Cell::new(false));

    {
        let target = b.clone();
        let forwarding = forwarding.clone();
        let _ = a.subscribe(move |value: &T| {
            if forwarding.replace(true) {
                return;
            }
            target.next(value.clone());
            forwarding.set(false);
        });
    }
    {
        let target = a.clone();
        let _ = b.subscribe(move |value: &T| {
            if forwarding.replace(true) {
                return;
            }
            target.next(value.clone());
            forwarding.set(false);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_waits_for_both() {
        let left = Stream::empty();
        let right = Stream::empty();
        let combined = combine_latest(&left, &right);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let _ = combined.subscribe(move |pair: &(i32, &str)| seen_clone.borrow_mut().push(*pair));

        right.next("x");
        assert!(seen.borrow().is_empty());

        left.next(1);
        right.next("y");
        left.next(2);
        assert_eq!(*seen.borrow(), vec![(1, "x"), (1, "y"), (2, "y")]);
    }

    #[test]
    fn test_combine_picks_up_replayed_values() {
        let left = Stream::replay_of(1, 5);
        let right = Stream::empty();
        let combined = combine_latest(&left, &right);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let _ = combined.subscribe(move |pair: &(i32, i32)| seen_clone.borrow_mut().push(*pair));

        right.next(9);
        assert_eq!(*seen.borrow(), vec![(5, 9)]);
    }

    #[test]
    fn test_tee_forwards_both_ways_once() {
        let a = Stream::empty();
        let b = Stream::empty();
        tee(&a, &b);

        let seen_a = Rc::new(RefCell::new(Vec::new()));
        let seen_b = Rc::new(RefCell::new(Vec::new()));
        let sa = seen_a.clone();
        let sb = seen_b.clone();
        let _ = a.subscribe(move |v: &i32| sa.borrow_mut().push(*v));
        let _ = b.subscribe(move |v: &i32| sb.borrow_mut().push(*v));

        a.next(1);
        b.next(2);

        assert_eq!(*seen_a.borrow(), vec![1, 2]);
        assert_eq!(*seen_b.borrow(), vec![1, 2]);
    }
}
