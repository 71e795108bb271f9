//! The per-process run loop.
//!
//! A process interleaves two phases per fixed-interval tick: a bounded
//! message phase that drains its mailbox, and a tick phase that expires
//! pending calls and paces to the frame interval. Within a process,
//! execution is effectively single-threaded: the loop and at most one live
//! continuation alternate strictly, so the pending-call table and the
//! continuation set need no locking.

use crate::continuation::{panic_message, Continuation, ResumeValue, Yielded};
use crate::context::ProcessContext;
use crate::mailbox::Mailbox;
use crate::reactor::Reactor;
use crate::router::RouterHandle;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tact_core::{CallError, CallRequest, CallResponse, Message, Pid};
use tokio::sync::{mpsc, watch};

/// Fixed frame interval for process and router tick loops.
///
/// Call deadlines are resolved on these ticks, so observed timeout latency
/// is the requested timeout plus up to one interval.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound on messages handled per tick, so the tick phase keeps making
/// timeout-scanning progress under load.
const MAX_MESSAGES_PER_TICK: usize = 64;

/// A continuation suspended on an outstanding call.
struct PendingCall {
    continuation: Continuation,
    call_id: u64,
    deadline: Instant,
}

/// A process that has been constructed but not yet started.
///
/// Two-phase creation lets the node register the handle before any message
/// is dispatched; a process that fails registration is simply dropped
/// without ever running.
pub struct Process {
    state: LoopState,
    done_tx: watch::Sender<bool>,
}

/// A cloneable handle to a running (or not yet started) process.
#[derive(Clone)]
pub struct ProcessHandle {
    pid: Pid,
    mailbox: Arc<Mailbox>,
    stop_tx: mpsc::Sender<()>,
    done_rx: watch::Receiver<bool>,
}

impl Process {
    /// Creates a process and its handle.
    pub fn new(pid: Pid, reactor: Arc<dyn Reactor>, router: RouterHandle) -> (Self, ProcessHandle) {
        let mailbox = Arc::new(Mailbox::new());
        let (stop_tx, stop_rx) = mpsc::channel(1);
        let (done_tx, done_rx) = watch::channel(false);

        let state = LoopState {
            pid,
            reactor,
            mailbox: mailbox.clone(),
            router,
            pending: Vec::with_capacity(8),
            next_continuation_id: 0,
            call_ids: Arc::new(AtomicU64::new(0)),
            frame_time: Instant::now(),
            stop_rx,
            stop_flag: false,
        };
        let handle = ProcessHandle {
            pid,
            mailbox,
            stop_tx,
            done_rx,
        };
        (Self { state, done_tx }, handle)
    }

    /// Injects the synthetic started message and spawns the run loop.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) {
        self.state.mailbox.push(Message::Started);
        let Self { state, done_tx } = self;
        tokio::spawn(async move {
            state.run().await;
            let _ = done_tx.send(true);
        });
    }
}

impl ProcessHandle {
    /// The process's id.
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Pushes a message into the process's mailbox.
    ///
    /// Used by the node's router loop; arbitrary concurrent callers are
    /// fine.
    pub fn push(&self, message: Message) {
        self.mailbox.push(message);
    }

    /// Requests a stop and waits until the run loop has terminated.
    ///
    /// On return the stopping notification has been delivered to the
    /// reactor and no further messages will be dispatched. Pending calls
    /// are abandoned, not drained. Safe to call from multiple tasks; every
    /// caller blocks until the same barrier opens.
    pub async fn stop(&self) {
        let _ = self.stop_tx.try_send(());
        let mut done = self.done_rx.clone();
        let _ = done.wait_for(|stopped| *stopped).await;
    }
}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid)
            .field("queued", &self.mailbox.len())
            .finish()
    }
}

/// State owned by the run loop task.
struct LoopState {
    pid: Pid,
    reactor: Arc<dyn Reactor>,
    mailbox: Arc<Mailbox>,
    router: RouterHandle,
    pending: Vec<PendingCall>,
    next_continuation_id: u64,
    /// Call-id allocator, shared with every context this process hands out.
    call_ids: Arc<AtomicU64>,
    /// Monotonic frame clock; advances one interval per iteration rather
    /// than tracking the wall clock, giving predictable relative deadlines
    /// under jitter.
    frame_time: Instant,
    stop_rx: mpsc::Receiver<()>,
    stop_flag: bool,
}

impl LoopState {
    async fn run(mut self) {
        self.frame_time = Instant::now();
        tracing::debug!(pid = %self.pid, "process loop started");

        while !self.stop_flag {
            let tick_start = Instant::now();
            self.message_phase().await;
            self.expire_pending().await;
            self.pace(tick_start).await;
            self.frame_time += FRAME_INTERVAL;
        }

        // Delivered synchronously, outside the mailbox and outside any
        // continuation.
        self.deliver_lifecycle(Message::Stopping).await;
        tracing::debug!(pid = %self.pid, "process loop stopped");
        // Dropping `pending` here abandons any suspended continuations.
    }

    /// Drains a bounded batch from the mailbox, intercepting call
    /// envelopes before generic dispatch.
    async fn message_phase(&mut self) {
        for _ in 0..MAX_MESSAGES_PER_TICK {
            let Some(message) = self.mailbox.pop() else {
                return;
            };
            match message {
                Message::CallRequest(request) => self.on_call_request(request),
                Message::CallResponse(response) => self.on_call_response(response).await,
                other => self.dispatch(other).await,
            }
        }
    }

    /// Runs the reactor for one message inside a fresh continuation.
    async fn dispatch(&mut self, message: Message) {
        self.next_continuation_id += 1;
        let reactor = self.reactor.clone();
        let pid = self.pid;
        let mailbox = self.mailbox.clone();
        let router = self.router.clone();
        let call_ids = self.call_ids.clone();

        let (continuation, yielded) =
            Continuation::spawn(self.next_continuation_id, move |gate| async move {
                let mut ctx =
                    ProcessContext::new(pid, message, Some(gate), mailbox, router, call_ids);
                reactor.on_receive(&mut ctx).await;
            })
            .await;
        self.on_yield(continuation, yielded).await;
    }

    /// Dispatches a named call against the reactor and mirrors the outcome
    /// back to the caller. Panics and unknown methods become error-carrying
    /// responses, never loop failures.
    fn on_call_request(&mut self, request: CallRequest) {
        let reactor = self.reactor.clone();
        let result = match std::panic::catch_unwind(AssertUnwindSafe(|| {
            reactor.handle_call(&request.method, &request.args)
        })) {
            Ok(result) => result,
            Err(payload) => Err(CallError::HandlerPanic(panic_message(payload))),
        };

        self.router.route(
            request.from,
            Message::CallResponse(CallResponse {
                call_id: request.call_id,
                from: self.pid,
                to: request.from,
                result,
            }),
        );
    }

    /// Matches a response against the pending-call table and resumes the
    /// waiting continuation. Unmatched responses (late arrivals after a
    /// timeout) are dropped.
    async fn on_call_response(&mut self, response: CallResponse) {
        let Some(index) = self
            .pending
            .iter()
            .position(|pc| pc.call_id == response.call_id)
        else {
            tracing::debug!(
                pid = %self.pid,
                call_id = response.call_id,
                "dropping response with no pending call"
            );
            return;
        };

        let mut entry = self.pending.remove(index);
        let yielded = entry
            .continuation
            .resume(ResumeValue {
                result: response.result,
            })
            .await;
        self.on_yield(entry.continuation, yielded).await;
    }

    /// Registers a suspension or finalizes a completed continuation.
    async fn on_yield(&mut self, continuation: Continuation, yielded: Yielded) {
        match yielded {
            Yielded::Suspended { call_id, timeout } => {
                self.pending.push(PendingCall {
                    continuation,
                    call_id,
                    deadline: self.frame_time + timeout,
                });
            }
            Yielded::Done {
                panic: Some(message),
            } => {
                tracing::warn!(pid = %self.pid, panic = %message, "reactor panicked");
                self.deliver_lifecycle(Message::HandlerPanic(message)).await;
            }
            Yielded::Done { panic: None } => {}
        }
    }

    /// Resumes every pending call whose deadline is at or before the
    /// current frame time with a timeout error.
    async fn expire_pending(&mut self) {
        // Descending index scan: in-place removal stays safe, and entries
        // appended by a re-suspending continuation are not visited this
        // tick.
        let scan_len = self.pending.len();
        for index in (0..scan_len).rev() {
            if self.pending[index].deadline > self.frame_time {
                continue;
            }
            let mut entry = self.pending.remove(index);
            let yielded = entry
                .continuation
                .resume(ResumeValue {
                    result: Err(CallError::Timeout),
                })
                .await;
            self.on_yield(entry.continuation, yielded).await;
        }
    }

    /// Paces the loop to the frame interval, or proceeds immediately when
    /// the tick overran. The sleep is interruptible by the stop signal.
    async fn pace(&mut self, tick_start: Instant) {
        let cost = tick_start.elapsed();
        if cost >= FRAME_INTERVAL {
            tracing::warn!(
                pid = %self.pid,
                cost_ms = cost.as_millis() as u64,
                "tick overran frame interval"
            );
            match self.stop_rx.try_recv() {
                Ok(()) | Err(mpsc::error::TryRecvError::Disconnected) => self.stop_flag = true,
                Err(mpsc::error::TryRecvError::Empty) => {}
            }
        } else {
            tokio::select! {
                _ = self.stop_rx.recv() => self.stop_flag = true,
                _ = tokio::time::sleep(FRAME_INTERVAL - cost) => {}
            }
        }
    }

    /// Invokes the reactor directly for a lifecycle notification, outside
    /// the mailbox and outside any continuation. A panic here is contained
    /// and logged.
    async fn deliver_lifecycle(&mut self, message: Message) {
        let reactor = self.reactor.clone();
        let mut ctx = ProcessContext::new(
            self.pid,
            message,
            None,
            self.mailbox.clone(),
            self.router.clone(),
            self.call_ids.clone(),
        );
        let outcome = AssertUnwindSafe(async { reactor.on_receive(&mut ctx).await })
            .catch_unwind()
            .await;
        if let Err(payload) = outcome {
            tracing::warn!(
                pid = %self.pid,
                panic = %panic_message(payload),
                "reactor panicked in lifecycle notification"
            );
        }
    }
}
