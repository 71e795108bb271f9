//! Per-invocation call context.
//!
//! A [`ProcessContext`] is constructed fresh for every message dispatched
//! to a reactor. It exposes the triggering message, the hosting pid, local
//! and routed delivery, and the blocking-style RPC helper that suspends the
//! current continuation while a call is outstanding.

use crate::continuation::ContinuationGate;
use crate::mailbox::Mailbox;
use crate::router::RouterHandle;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tact_core::{CallError, CallRequest, Codec, Message, Pid};

/// The capability object passed into each reactor invocation.
///
/// For ordinary messages the context carries the active continuation, so
/// [`call`] can suspend without blocking the process's run loop. Lifecycle
/// notifications ([`Message::Stopping`], [`Message::HandlerPanic`]) are
/// delivered outside any continuation; calling from those handlers fails
/// fast with [`CallError::NoContinuation`].
///
/// [`call`]: ProcessContext::call
pub struct ProcessContext {
    pid: Pid,
    message: Message,
    gate: Option<ContinuationGate>,
    mailbox: Arc<Mailbox>,
    router: RouterHandle,
    call_ids: Arc<AtomicU64>,
}

impl ProcessContext {
    pub(crate) fn new(
        pid: Pid,
        message: Message,
        gate: Option<ContinuationGate>,
        mailbox: Arc<Mailbox>,
        router: RouterHandle,
        call_ids: Arc<AtomicU64>,
    ) -> Self {
        Self {
            pid,
            message,
            gate,
            mailbox,
            router,
            call_ids,
        }
    }

    /// The message that triggered this invocation.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// The hosting process's id.
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Posts a message to a process, fire-and-forget.
    ///
    /// Delivery to the hosting process short-circuits into its own mailbox;
    /// anything else goes through the node router.
    pub fn post(&self, to: Pid, message: Message) {
        if to == self.pid {
            self.mailbox.push(message);
        } else {
            self.router.route(to, message);
        }
    }

    /// Issues a blocking-style call with typed arguments and result.
    ///
    /// Encodes `args`, suspends the current continuation until the response
    /// arrives or `timeout` expires, then decodes the result payload. The
    /// process's run loop keeps serving other messages while this
    /// invocation is suspended.
    ///
    /// Timeouts are resolved on the owning process's frame ticks, so the
    /// observed latency is `timeout` plus up to one frame interval.
    ///
    /// # Errors
    ///
    /// - [`CallError::NoContinuation`] outside an active continuation
    /// - [`CallError::SameProcess`] if `to` is the hosting process
    /// - [`CallError::Timeout`] if the deadline elapsed first
    /// - [`CallError::UnknownMethod`] / [`CallError::HandlerPanic`] raised
    ///   by the callee's dispatch
    /// - [`CallError::BadResponse`] if the result payload does not decode
    ///   into `R`
    /// - [`CallError::Abandoned`] if the hosting process stopped first
    pub async fn call<A, R>(
        &mut self,
        to: Pid,
        method: &str,
        args: &A,
        timeout: Duration,
    ) -> Result<R, CallError>
    where
        A: Codec,
        R: Codec,
    {
        let bytes = self.call_raw(to, method, args.encode(), timeout).await?;
        R::decode(&bytes).map_err(|e| CallError::BadResponse(e.to_string()))
    }

    /// Issues a blocking-style call with an already-encoded argument
    /// payload, returning the raw result payload.
    ///
    /// The fast-fail guards run before any envelope is sent: calling
    /// outside a continuation or at the hosting process itself returns an
    /// error synchronously, without suspending.
    pub async fn call_raw(
        &mut self,
        to: Pid,
        method: &str,
        args: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, CallError> {
        let gate = match self.gate.as_mut() {
            // The gate is absent for lifecycle notifications delivered
            // outside a continuation.
            None => return Err(CallError::NoContinuation),
            Some(gate) => gate,
        };
        if to == self.pid {
            return Err(CallError::SameProcess);
        }

        let call_id = self.call_ids.fetch_add(1, Ordering::Relaxed) + 1;
        self.router.route(
            to,
            Message::CallRequest(CallRequest {
                call_id,
                from: self.pid,
                to,
                method: method.to_owned(),
                args,
            }),
        );

        gate.suspend(call_id, timeout).await.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lifecycle_context(pid: Pid) -> ProcessContext {
        ProcessContext::new(
            pid,
            Message::Stopping,
            None,
            Arc::new(Mailbox::new()),
            RouterHandle::new(),
            Arc::new(AtomicU64::new(0)),
        )
    }

    #[tokio::test]
    async fn test_call_without_continuation_fails_fast() {
        let mut ctx = lifecycle_context(Pid::from_raw(1));
        let result = ctx
            .call_raw(Pid::from_raw(2), "ping", Vec::new(), Duration::from_secs(1))
            .await;
        assert_eq!(result, Err(CallError::NoContinuation));
        // The guard fires before any envelope is routed.
        assert!(ctx.router.queue().is_empty());
    }

    #[tokio::test]
    async fn test_call_to_self_fails_fast() {
        let mut ctx = ProcessContext::new(
            Pid::from_raw(1),
            Message::User(Vec::new()),
            Some(crate::continuation::detached_gate()),
            Arc::new(Mailbox::new()),
            RouterHandle::new(),
            Arc::new(AtomicU64::new(0)),
        );
        let result = ctx
            .call_raw(Pid::from_raw(1), "ping", Vec::new(), Duration::from_secs(1))
            .await;
        assert_eq!(result, Err(CallError::SameProcess));
        // Guarded synchronously: no envelope sent, no suspension.
        assert!(ctx.router.queue().is_empty());
    }

    #[test]
    fn test_post_to_self_uses_own_mailbox() {
        let ctx = lifecycle_context(Pid::from_raw(1));
        ctx.post(Pid::from_raw(1), Message::User(vec![1]));
        assert_eq!(ctx.mailbox.len(), 1);
        assert!(ctx.router.queue().is_empty());

        ctx.post(Pid::from_raw(2), Message::User(vec![2]));
        assert_eq!(ctx.mailbox.len(), 1);
        assert_eq!(ctx.router.queue().len(), 1);
    }
}
