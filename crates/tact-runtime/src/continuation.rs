//! The suspendable execution unit behind blocking-style calls.
//!
//! Each inbound application message runs the reactor inside a fresh
//! [`Continuation`]: a tokio task paired with two capacity-1 hand-off
//! channels, one per direction. The pairing enforces a strict ping-pong -
//! at any instant exactly one side (the body or the run loop) is runnable -
//! which is what lets reactor code read as sequential blocking calls while
//! the surrounding scheduler stays single-threaded per process.
//!
//! A continuation is single-shot: it runs one reactor invocation, may
//! suspend any number of times while calls are outstanding, and is dropped
//! once it reports completion. A panic inside the body is caught and
//! surfaces as the completion value instead of tearing down the run loop.

use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tact_core::CallError;
use tokio::sync::mpsc;

/// Continuation lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Status {
    /// The body is executing; the run loop is parked in `spawn`/`resume`.
    Running,
    /// The body is parked in `suspend` awaiting a call result.
    Suspended,
    /// The body has finished. A stopped continuation is never resumed.
    Stopped,
}

/// What the body handed back to the run loop.
#[derive(Debug)]
pub(crate) enum Yielded {
    /// The body suspended on an outstanding call.
    Suspended {
        /// Correlation id of the call the body is waiting on.
        call_id: u64,
        /// Requested timeout, relative to the current frame time.
        timeout: Duration,
    },
    /// The body ran to completion. `panic` carries the captured panic
    /// message, if the body panicked.
    Done { panic: Option<String> },
}

/// The value a suspended body is woken with.
#[derive(Debug)]
pub(crate) struct ResumeValue {
    /// The call outcome: encoded result payload or call error.
    pub result: Result<Vec<u8>, CallError>,
}

impl ResumeValue {
    /// The wake-up value for a body whose owning loop went away.
    fn abandoned() -> Self {
        Self {
            result: Err(CallError::Abandoned),
        }
    }
}

/// Run-loop side of a continuation.
pub(crate) struct Continuation {
    id: u64,
    status: Status,
    yield_rx: mpsc::Receiver<Yielded>,
    resume_tx: mpsc::Sender<ResumeValue>,
}

/// Body side of a continuation, embedded in the `ProcessContext` handed to
/// the reactor. `None` for direct lifecycle notifications.
pub(crate) struct ContinuationGate {
    yield_tx: mpsc::Sender<Yielded>,
    resume_rx: mpsc::Receiver<ResumeValue>,
}

impl Continuation {
    /// Starts `f` on its own task and waits until the body either suspends
    /// or completes. Returns the run-loop half together with that first
    /// yield.
    pub(crate) async fn spawn<F, Fut>(id: u64, f: F) -> (Continuation, Yielded)
    where
        F: FnOnce(ContinuationGate) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (yield_tx, yield_rx) = mpsc::channel(1);
        let (resume_tx, resume_rx) = mpsc::channel(1);

        let gate = ContinuationGate {
            yield_tx: yield_tx.clone(),
            resume_rx,
        };
        tokio::spawn(async move {
            let outcome = AssertUnwindSafe(async move { f(gate).await })
                .catch_unwind()
                .await;
            let panic = outcome.err().map(panic_message);
            // The loop half may already be gone if the process stopped.
            let _ = yield_tx.send(Yielded::Done { panic }).await;
        });

        let mut continuation = Continuation {
            id,
            status: Status::Running,
            yield_rx,
            resume_tx,
        };
        let yielded = continuation.wait_yield().await;
        (continuation, yielded)
    }

    /// Wakes the suspended body with `value` and waits for the next yield
    /// or completion.
    pub(crate) async fn resume(&mut self, value: ResumeValue) -> Yielded {
        debug_assert_eq!(self.status, Status::Suspended);
        self.status = Status::Running;
        if self.resume_tx.send(value).await.is_err() {
            // Body task is gone; treat as a clean completion.
            self.status = Status::Stopped;
            return Yielded::Done { panic: None };
        }
        self.wait_yield().await
    }

    /// Identifier of this continuation within its process.
    #[allow(dead_code)]
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    async fn wait_yield(&mut self) -> Yielded {
        let yielded = match self.yield_rx.recv().await {
            Some(yielded) => yielded,
            None => Yielded::Done { panic: None },
        };
        self.status = match yielded {
            Yielded::Suspended { .. } => Status::Suspended,
            Yielded::Done { .. } => Status::Stopped,
        };
        yielded
    }
}

impl ContinuationGate {
    /// Suspends the body on `call_id` until the run loop resumes it.
    ///
    /// Resolves to [`CallError::Abandoned`] if the owning process stops
    /// first; the body then runs to completion on its own task without ever
    /// being resumed with a real value.
    pub(crate) async fn suspend(&mut self, call_id: u64, timeout: Duration) -> ResumeValue {
        if self
            .yield_tx
            .send(Yielded::Suspended { call_id, timeout })
            .await
            .is_err()
        {
            return ResumeValue::abandoned();
        }
        match self.resume_rx.recv().await {
            Some(value) => value,
            None => ResumeValue::abandoned(),
        }
    }
}

#[cfg(test)]
pub(crate) fn detached_gate() -> ContinuationGate {
    let (yield_tx, _yield_rx) = mpsc::channel(1);
    let (_resume_tx, resume_rx) = mpsc::channel(1);
    ContinuationGate { yield_tx, resume_rx }
}

/// Renders a captured panic payload as a message string.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic of unknown type".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completes_without_yield() {
        let (continuation, yielded) = Continuation::spawn(1, |_gate| async {}).await;
        assert!(matches!(yielded, Yielded::Done { panic: None }));
        assert_eq!(continuation.status, Status::Stopped);
    }

    #[tokio::test]
    async fn test_ping_pong_hand_off() {
        let (mut continuation, yielded) = Continuation::spawn(1, |mut gate| async move {
            let value = gate.suspend(7, Duration::from_millis(10)).await;
            // The body observes exactly the value passed to resume.
            assert_eq!(value.result.unwrap(), vec![1, 2, 3]);
        })
        .await;

        match yielded {
            Yielded::Suspended { call_id, timeout } => {
                assert_eq!(call_id, 7);
                assert_eq!(timeout, Duration::from_millis(10));
            }
            other => panic!("expected suspension, got {:?}", other),
        }
        assert_eq!(continuation.status, Status::Suspended);

        let yielded = continuation
            .resume(ResumeValue {
                result: Ok(vec![1, 2, 3]),
            })
            .await;
        assert!(matches!(yielded, Yielded::Done { panic: None }));
        assert_eq!(continuation.status, Status::Stopped);
    }

    #[tokio::test]
    async fn test_repeated_suspension() {
        let (mut continuation, mut yielded) = Continuation::spawn(1, |mut gate| async move {
            for expected in [10u64, 11, 12] {
                let value = gate.suspend(expected, Duration::ZERO).await;
                assert_eq!(value.result.unwrap(), expected.to_le_bytes().to_vec());
            }
        })
        .await;

        for expected in [10u64, 11, 12] {
            match yielded {
                Yielded::Suspended { call_id, .. } => assert_eq!(call_id, expected),
                ref other => panic!("expected suspension, got {:?}", other),
            }
            yielded = continuation
                .resume(ResumeValue {
                    result: Ok(expected.to_le_bytes().to_vec()),
                })
                .await;
        }
        assert!(matches!(yielded, Yielded::Done { panic: None }));
    }

    #[tokio::test]
    async fn test_panic_is_captured() {
        let (_continuation, yielded) = Continuation::spawn(1, |_gate| async {
            panic!("boom");
        })
        .await;

        match yielded {
            Yielded::Done { panic: Some(message) } => assert_eq!(message, "boom"),
            other => panic!("expected captured panic, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_abandoned_suspension_unwinds_body() {
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        let (continuation, yielded) = Continuation::spawn(1, |mut gate| async move {
            let value = gate.suspend(1, Duration::from_secs(60)).await;
            assert_eq!(value.result, Err(CallError::Abandoned));
            let _ = done_tx.send(());
        })
        .await;
        assert!(matches!(yielded, Yielded::Suspended { .. }));

        // Dropping the loop half abandons the suspended body.
        drop(continuation);
        done_rx.await.expect("body never unwound");
    }
}
