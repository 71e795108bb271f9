//! Fire-and-forget routing capability.
//!
//! Processes and contexts never hold the node itself; they hold a
//! [`RouterHandle`], a narrow capability wrapping the node's router queue.
//! Routing only enqueues - the node's router loop drains the queue on its
//! own tick and resolves targets against the registry, so a sender never
//! blocks on delivery and never learns whether the target exists.

use crate::mailbox::MessageQueue;
use std::sync::Arc;
use tact_core::{Message, Pid};

/// An envelope sitting in the router queue.
#[derive(Debug)]
pub struct Routed {
    /// The target process.
    pub to: Pid,
    /// The message to deliver.
    pub message: Message,
}

/// A cloneable handle for enqueueing messages onto a node's router queue.
#[derive(Clone)]
pub struct RouterHandle {
    queue: Arc<MessageQueue<Routed>>,
}

impl RouterHandle {
    /// Creates a handle and the queue it feeds.
    pub fn new() -> Self {
        Self {
            queue: Arc::new(MessageQueue::new()),
        }
    }

    /// Enqueues `message` for best-effort delivery to `to`.
    ///
    /// Never blocks and never errors. If the target does not exist when the
    /// router loop drains the queue, the message is dropped.
    pub fn route(&self, to: Pid, message: Message) {
        self.queue.push(Routed { to, message });
    }

    /// The underlying queue, drained by the node's router loop.
    pub fn queue(&self) -> &Arc<MessageQueue<Routed>> {
        &self.queue
    }
}

impl Default for RouterHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_enqueues_in_order() {
        let router = RouterHandle::new();
        router.route(Pid::from_raw(1), Message::User(vec![1]));
        router.route(Pid::from_raw(2), Message::User(vec![2]));

        let drained: Vec<Routed> = router.queue().drain_all().into_iter().collect();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].to, Pid::from_raw(1));
        assert_eq!(drained[1].to, Pid::from_raw(2));
    }

    #[test]
    fn test_route_to_anything_never_errors() {
        let router = RouterHandle::new();
        // No registry is consulted at enqueue time; even an invalid target
        // is accepted and later dropped by the router loop.
        router.route(Pid::INVALID, Message::Stopping);
        assert_eq!(router.queue().len(), 1);
    }
}
