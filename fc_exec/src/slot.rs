//! # Latest value slot
//!
//! A single slot handoff between one producer and one consumer where only
//! the most recent value matters. Publishing overwrites any value the
//! consumer has not yet taken, and neither side ever blocks or locks.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crossbeam_queue::ArrayQueue;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Overwrite-latest slot holding at most one value.
///
/// Backed by a lock-free bounded queue of capacity one.
pub struct LatestSlot<T> {
    queue: ArrayQueue<T>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T> LatestSlot<T> {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self {
            queue: ArrayQueue::new(1),
        }
    }

    /// Place a value in the slot, dropping any value not yet taken.
    ///
    /// Returns `true` if an untaken value was overwritten.
    pub fn publish(&self, value: T) -> bool {
        self.queue.force_push(value).is_some()
    }

    /// Take the value out of the slot if there is one.
    pub fn try_take(&self) -> Option<T> {
        self.queue.pop()
    }

    /// True if there is a value waiting in the slot.
    pub fn is_full(&self) -> bool {
        self.queue.is_full()
    }
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for LatestSlot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LatestSlot")
            .field("full", &self.is_full())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_take_empty() {
        let slot: LatestSlot<u32> = LatestSlot::new();
        assert!(!slot.is_full());
        assert_eq!(slot.try_take(), None);
    }

    #[test]
    fn test_overwrite_latest() {
        let slot = LatestSlot::new();

        assert!(!slot.publish(1));
        assert!(slot.publish(2));
        assert!(slot.publish(3));

        assert_eq!(slot.try_take(), Some(3));
        assert_eq!(slot.try_take(), None);
    }

    #[test]
    fn test_drops_untaken_values() {
        let value = Arc::new(());

        {
            let slot = LatestSlot::new();
            slot.publish(value.clone());
            slot.publish(value.clone());
            assert_eq!(Arc::strong_count(&value), 2);
        }

        assert_eq!(Arc::strong_count(&value), 1);
    }

    #[test]
    fn test_across_threads() {
        let slot = Arc::new(LatestSlot::new());
        let producer_slot = slot.clone();

        let producer = thread::spawn(move || {
            for i in 0..10_000u32 {
                producer_slot.publish(i);
            }
        });

        // Values seen by the consumer only ever increase
        let mut last = None;
        loop {
            if let Some(v) = slot.try_take() {
                if let Some(l) = last {
                    assert!(v > l);
                }
                last = Some(v);
                if v == 9_999 {
                    break;
                }
            }
        }

        producer.join().unwrap();
    }
}
