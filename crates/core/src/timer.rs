//! One-shot timers on a host-driven clock.
//!
//! Nothing in here sleeps. The owner arms timers with [`TimerQueue::schedule_at`]
//! and drains the ones that are due with [`TimerQueue::pop_due`] whenever the
//! host reports a new "now". Every armed timer has a [`TimerHandle`] that can
//! cancel it until it fires.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// Milliseconds on the host's monotonic timeline.
pub type Millis = f64;

/// `at + delay`, bumped to the next representable instant when the sum rounds
/// back to `at`. A periodic timer re-armed with this always moves forward.
pub fn later_by(at: Millis, delay: Millis) -> Millis {
    let next = at + delay;
    if next > at || !at.is_finite() {
        return next;
    }
    if at == 0.0 {
        f64::from_bits(1)
    } else if at > 0.0 {
        f64::from_bits(at.to_bits() + 1)
    } else {
        f64::from_bits(at.to_bits() - 1)
    }
}

/// Cancellation handle for an armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// A timer that came due.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<T> {
    pub handle: TimerHandle,
    /// The time the timer was armed for, not the time it was observed.
    pub at: Millis,
    pub payload: T,
}

/// Heap key. Ordered so that `BinaryHeap` pops the earliest deadline first and
/// timers armed for the same instant pop in arming order.
#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Millis,
    handle: TimerHandle,
}

impl PartialEq for Deadline {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Deadline {}

impl Ord for Deadline {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .at
            .total_cmp(&self.at)
            .then_with(|| other.handle.cmp(&self.handle))
    }
}

impl PartialOrd for Deadline {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug)]
pub struct TimerQueue<T> {
    heap: BinaryHeap<Deadline>,
    /// Armed timers. Cancelled timers leave a stale heap entry behind that is
    /// skipped when it surfaces.
    armed: HashMap<TimerHandle, (Millis, T)>,
    next_handle: u64,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            armed: HashMap::new(),
            next_handle: 0,
        }
    }

    /// Arm a timer that fires once `now >= at`.
    pub fn schedule_at(&mut self, at: Millis, payload: T) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.heap.push(Deadline { at, handle });
        self.armed.insert(handle, (at, payload));
        handle
    }

    /// Disarm a timer. Returns its payload, or `None` if it already fired or
    /// was cancelled before.
    pub fn cancel(&mut self, handle: TimerHandle) -> Option<T> {
        self.armed.remove(&handle).map(|(_, payload)| payload)
    }

    /// Disarm every timer. Returns how many were armed.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.armed.len();
        self.armed.clear();
        self.heap.clear();
        count
    }

    pub fn is_armed(&self, handle: TimerHandle) -> bool {
        self.armed.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.armed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }

    /// Deadline of the earliest armed timer.
    pub fn next_deadline(&mut self) -> Option<Millis> {
        self.discard_stale();
        self.heap.peek().map(|d| d.at)
    }

    /// Remove and return the earliest timer whose deadline is `<= now`.
    pub fn pop_due(&mut self, now: Millis) -> Option<Fired<T>> {
        self.discard_stale();
        let deadline = *self.heap.peek()?;
        if deadline.at > now {
            return None;
        }
        self.heap.pop();
        let (at, payload) = self.armed.remove(&deadline.handle)?;
        Some(Fired {
            handle: deadline.handle,
            at,
            payload,
        })
    }

    fn discard_stale(&mut self) {
        while let Some(top) = self.heap.peek() {
            if self.armed.contains_key(&top.handle) {
                break;
            }
            self.heap.pop();
        }
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(q: &mut TimerQueue<&'static str>, now: Millis) -> Vec<&'static str> {
        let mut out = Vec::new();
        while let Some(fired) = q.pop_due(now) {
            out.push(fired.payload);
        }
        out
    }

    #[test]
    fn later_by_always_moves_forward() {
        assert_eq!(later_by(100.0, 200.0), 300.0);
        // 1e16 + 1 rounds back to 1e16.
        let big = 1e16;
        assert!(later_by(big, 1.0) > big);
        assert!(later_by(-big, 1.0) > -big);
        assert!(later_by(0.0, 0.0) > 0.0);
    }

    #[test]
    fn fires_in_deadline_order() {
        let mut q = TimerQueue::new();
        q.schedule_at(300.0, "c");
        q.schedule_at(100.0, "a");
        q.schedule_at(200.0, "b");
        assert_eq!(drain(&mut q, 1_000.0), vec!["a", "b", "c"]);
        assert!(q.is_empty());
    }

    #[test]
    fn same_deadline_fires_in_arming_order() {
        let mut q = TimerQueue::new();
        q.schedule_at(50.0, "first");
        q.schedule_at(50.0, "second");
        q.schedule_at(50.0, "third");
        assert_eq!(drain(&mut q, 50.0), vec!["first", "second", "third"]);
    }

    #[test]
    fn not_due_yet_stays_armed() {
        let mut q = TimerQueue::new();
        let h = q.schedule_at(500.0, "later");
        assert!(q.pop_due(499.9).is_none());
        assert!(q.is_armed(h));
        assert_eq!(q.next_deadline(), Some(500.0));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut q = TimerQueue::new();
        let a = q.schedule_at(10.0, "a");
        q.schedule_at(20.0, "b");
        assert_eq!(q.cancel(a), Some("a"));
        assert_eq!(q.cancel(a), None);
        assert_eq!(q.next_deadline(), Some(20.0));
        assert_eq!(drain(&mut q, 100.0), vec!["b"]);
    }

    #[test]
    fn cancel_all_disarms_everything() {
        let mut q = TimerQueue::new();
        q.schedule_at(10.0, "a");
        q.schedule_at(20.0, "b");
        assert_eq!(q.cancel_all(), 2);
        assert!(q.next_deadline().is_none());
        assert!(drain(&mut q, f64::MAX).is_empty());
    }

    #[test]
    fn fired_reports_armed_time() {
        let mut q = TimerQueue::new();
        q.schedule_at(150.0, "x");
        let fired = q.pop_due(400.0);
        assert_eq!(fired.map(|f| f.at), Some(150.0));
    }
}
