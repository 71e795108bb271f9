//! Thread-safe FIFO queues for message hand-off.
//!
//! Every process owns a [`Mailbox`] and the node router owns a
//! [`MessageQueue`] of routed envelopes. Both sides of the hand-off are
//! batch-oriented tick loops, so the queue exposes a non-blocking [`pop`]
//! for the bounded per-tick drain and an atomic [`drain_all`] swap for the
//! router, keeping lock hold times to O(1) operations.
//!
//! [`pop`]: MessageQueue::pop
//! [`drain_all`]: MessageQueue::drain_all

use parking_lot::Mutex;
use std::collections::VecDeque;
use tact_core::Message;

/// A mutex-guarded FIFO queue, safe for arbitrary concurrent callers.
///
/// FIFO arrival order is the only ordering guarantee: values pushed by one
/// caller are observed in that caller's push order, but pushes from
/// different callers interleave arbitrarily.
pub struct MessageQueue<T> {
    items: Mutex<VecDeque<T>>,
}

/// A process's inbound message queue.
pub type Mailbox = MessageQueue<Message>;

impl<T> MessageQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    /// Appends a value to the back of the queue.
    pub fn push(&self, value: T) {
        self.items.lock().push_back(value);
    }

    /// Removes and returns the front value, or `None` if the queue is
    /// empty. Never blocks waiting for a value.
    pub fn pop(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    /// Atomically swaps the queue contents for an empty sequence and
    /// returns everything that was queued, in arrival order.
    pub fn drain_all(&self) -> VecDeque<T> {
        std::mem::take(&mut *self.items.lock())
    }

    /// Returns the number of queued values.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl<T> Default for MessageQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_fifo_order() {
        let queue = MessageQueue::new();
        queue.push(1);
        queue.push(2);
        queue.push(3);

        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(3));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_pop_empty() {
        let queue: MessageQueue<u32> = MessageQueue::new();
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_all() {
        let queue = MessageQueue::new();
        queue.push("a");
        queue.push("b");

        let drained = queue.drain_all();
        assert_eq!(drained, vec!["a", "b"]);
        assert!(queue.is_empty());

        // Draining an empty queue returns an empty sequence.
        assert!(queue.drain_all().is_empty());
    }

    #[test]
    fn test_concurrent_writers_preserve_per_writer_order() {
        const WRITERS: u64 = 4;
        const PER_WRITER: u64 = 500;

        let queue = Arc::new(MessageQueue::new());
        let mut handles = Vec::new();
        for writer in 0..WRITERS {
            let queue = queue.clone();
            handles.push(std::thread::spawn(move || {
                for seq in 0..PER_WRITER {
                    queue.push((writer, seq));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // A single reader must observe each writer's values in that
        // writer's push order.
        let mut last_seen = vec![None::<u64>; WRITERS as usize];
        let mut total = 0;
        while let Some((writer, seq)) = queue.pop() {
            if let Some(prev) = last_seen[writer as usize] {
                assert!(seq > prev, "writer {} reordered: {} after {}", writer, seq, prev);
            }
            last_seen[writer as usize] = Some(seq);
            total += 1;
        }
        assert_eq!(total, WRITERS * PER_WRITER);
    }
}
