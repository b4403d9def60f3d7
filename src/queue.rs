/*
 * Deadline Queue
 *
 * Ordered collection of pending software timers for one device, keyed by
 * absolute expiry. The queue is a fixed-capacity sorted vector of
 * non-owning `&'static HalTimer` links:
 *
 * - Ordering uses the wrapping signed difference of expiries, so deadlines
 *   on either side of the 32-bit wrap sort correctly
 * - Equal deadlines keep insertion order (FIFO)
 * - The head is always the next timer to fire
 *
 * The queue itself is plain data. Callers hold the device lock inside a
 * critical section while touching it.
 */

use heapless::Vec;

use crate::error::{InvalidArgument, Result, TimerError};
use crate::tick::{Ticks, tick_before, tick_reached};
use crate::timer::HalTimer;

/// One pending timer and the deadline it was queued with
#[derive(Debug, Clone, Copy)]
pub struct QueueEntry {
    pub timer: &'static HalTimer,
    pub expiry: Ticks,
}

impl QueueEntry {
    /// True if this entry links `timer`
    pub fn is(&self, timer: &HalTimer) -> bool {
        core::ptr::eq(self.timer, timer)
    }
}

/// Sorted queue of pending timers, at most `N` deep
pub struct DeadlineQueue<const N: usize> {
    entries: Vec<QueueEntry, N>,
}

impl<const N: usize> DeadlineQueue<N> {
    /// Create an empty queue
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of pending timers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is pending
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if `timer` is linked into this queue
    pub fn contains(&self, timer: &HalTimer) -> bool {
        self.entries.iter().any(|e| e.is(timer))
    }

    /// True if `timer` is the next to fire
    pub fn is_head(&self, timer: &HalTimer) -> bool {
        self.entries.first().is_some_and(|e| e.is(timer))
    }

    /// Insert `timer` keeping ascending expiry order
    ///
    /// Returns `true` if the timer became the new head, in which case the
    /// caller must re-arm the compare.
    pub fn insert(&mut self, timer: &'static HalTimer, expiry: Ticks) -> Result<bool> {
        if self.contains(timer) {
            return Err(InvalidArgument::TimerPending.into());
        }
        if self.entries.is_full() {
            return Err(TimerError::QueueFull);
        }

        // First entry strictly later than us; equal deadlines stay ahead
        let pos = self
            .entries
            .iter()
            .position(|e| tick_before(expiry, e.expiry))
            .unwrap_or(self.entries.len());

        self.entries
            .insert(pos, QueueEntry { timer, expiry })
            .map_err(|_| TimerError::QueueFull)?;
        Ok(pos == 0)
    }

    /// Unlink `timer`; no-op if it is not queued
    pub fn remove(&mut self, timer: &HalTimer) -> Option<QueueEntry> {
        let pos = self.entries.iter().position(|e| e.is(timer))?;
        Some(self.entries.remove(pos))
    }

    /// Head of the queue without removing it
    pub fn peek_earliest(&self) -> Option<&QueueEntry> {
        self.entries.first()
    }

    /// Remove the head if its deadline has been reached at `now`
    pub fn pop_expired(&mut self, now: Ticks) -> Option<QueueEntry> {
        let head = self.entries.first()?;
        if tick_reached(now, head.expiry) {
            Some(self.entries.remove(0))
        } else {
            None
        }
    }

    /// Remove and return, in order, every entry expired at `now`
    pub fn drain_expired(&mut self, now: Ticks) -> Vec<QueueEntry, N> {
        let mut expired = Vec::new();
        while let Some(entry) = self.pop_expired(now) {
            // Cannot overflow: `expired` has the same capacity as the queue
            let _ = expired.push(entry);
        }
        expired
    }

    /// Iterate pending entries from earliest to latest
    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }

    /// Check the ordering invariant
    pub fn is_sorted(&self) -> bool {
        self.entries
            .windows(2)
            .all(|pair| !tick_before(pair[1].expiry, pair[0].expiry))
    }
}

impl<const N: usize> Default for DeadlineQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static A: HalTimer = HalTimer::new();
    static B: HalTimer = HalTimer::new();
    static C: HalTimer = HalTimer::new();
    static D: HalTimer = HalTimer::new();

    fn order<const N: usize>(q: &DeadlineQueue<N>) -> std::vec::Vec<Ticks> {
        q.iter().map(|e| e.expiry).collect()
    }

    #[test]
    fn test_insert_sorted() {
        let mut q: DeadlineQueue<4> = DeadlineQueue::new();
        assert!(q.insert(&A, 300).unwrap());
        assert!(q.insert(&B, 100).unwrap());
        assert!(!q.insert(&C, 200).unwrap());
        assert_eq!(order(&q), [100, 200, 300]);
        assert!(q.is_head(&B));
        assert!(q.is_sorted());
    }

    #[test]
    fn test_equal_deadlines_fifo() {
        let mut q: DeadlineQueue<4> = DeadlineQueue::new();
        q.insert(&A, 50).unwrap();
        q.insert(&B, 50).unwrap();
        q.insert(&C, 50).unwrap();

        let drained = q.drain_expired(50);
        assert_eq!(drained.len(), 3);
        assert!(drained[0].is(&A));
        assert!(drained[1].is(&B));
        assert!(drained[2].is(&C));
    }

    #[test]
    fn test_insert_across_wrap() {
        let mut q: DeadlineQueue<4> = DeadlineQueue::new();
        q.insert(&A, 0x10).unwrap();
        q.insert(&B, 0xFFFF_FFF0).unwrap();
        assert!(q.is_head(&B));
        assert!(q.is_sorted());
    }

    #[test]
    fn test_double_insert_rejected() {
        let mut q: DeadlineQueue<4> = DeadlineQueue::new();
        q.insert(&A, 10).unwrap();
        assert_eq!(
            q.insert(&A, 20),
            Err(TimerError::InvalidArgument(InvalidArgument::TimerPending))
        );
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn test_queue_full() {
        let mut q: DeadlineQueue<2> = DeadlineQueue::new();
        q.insert(&A, 1).unwrap();
        q.insert(&B, 2).unwrap();
        assert_eq!(q.insert(&C, 3), Err(TimerError::QueueFull));
    }

    #[test]
    fn test_remove() {
        let mut q: DeadlineQueue<4> = DeadlineQueue::new();
        q.insert(&A, 10).unwrap();
        q.insert(&B, 20).unwrap();

        assert!(q.remove(&D).is_none());
        let removed = q.remove(&A).unwrap();
        assert_eq!(removed.expiry, 10);
        assert!(q.is_head(&B));
        assert!(!q.contains(&A));
    }

    #[test]
    fn test_drain_stops_at_future_deadline() {
        let mut q: DeadlineQueue<4> = DeadlineQueue::new();
        q.insert(&A, 10).unwrap();
        q.insert(&B, 20).unwrap();
        q.insert(&C, 30).unwrap();

        let drained = q.drain_expired(20);
        assert_eq!(drained.len(), 2);
        assert_eq!(q.peek_earliest().map(|e| e.expiry), Some(30));

        assert!(q.pop_expired(29).is_none());
        assert!(q.pop_expired(30).is_some());
        assert!(q.is_empty());
        assert!(q.peek_earliest().is_none());
    }
}
