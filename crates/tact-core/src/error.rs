//! Error types shared across the runtime.

use crate::pid::Pid;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by the cross-process call machinery.
///
/// `CallError` travels inside [`CallResponse`] envelopes, so it is
/// serializable and carries panic/unknown-method details as plain strings.
///
/// [`CallResponse`]: crate::CallResponse
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum CallError {
    /// A call was issued outside an active continuation, e.g. from a
    /// lifecycle notification handler.
    #[error("call issued outside an active continuation")]
    NoContinuation,

    /// The call target is the calling process itself.
    #[error("call target is the calling process")]
    SameProcess,

    /// No response arrived before the deadline elapsed.
    #[error("call timed out")]
    Timeout,

    /// The callee does not expose a method with this name.
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    /// The callee's method panicked while handling the call.
    #[error("method panicked: {0}")]
    HandlerPanic(String),

    /// The response payload could not be decoded into the expected type.
    #[error("malformed response payload: {0}")]
    BadResponse(String),

    /// The calling process stopped before the call resolved; the suspended
    /// continuation was woken one last time so it can unwind.
    #[error("call abandoned: owning process stopped")]
    Abandoned,
}

/// Errors for local delivery operations that report their target.
///
/// Routing through the node is fire-and-forget and never surfaces these;
/// they exist for the few APIs that talk to a process handle directly.
#[derive(Debug, Error)]
pub enum SendError {
    /// The target process is not registered.
    #[error("process not found: {0}")]
    ProcessNotFound(Pid),
}

/// Error type for payload decoding failures.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Failed to deserialize the payload bytes.
    #[error("failed to decode payload: {0}")]
    Deserialize(#[from] postcard::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_error_display() {
        assert_eq!(CallError::Timeout.to_string(), "call timed out");
        assert_eq!(
            CallError::UnknownMethod("add".into()).to_string(),
            "unknown method: add"
        );
    }

    #[test]
    fn test_call_error_round_trips_through_postcard() {
        let errors = vec![
            CallError::NoContinuation,
            CallError::SameProcess,
            CallError::Timeout,
            CallError::UnknownMethod("mul".into()),
            CallError::HandlerPanic("boom".into()),
            CallError::BadResponse("truncated".into()),
            CallError::Abandoned,
        ];
        for err in errors {
            let bytes = postcard::to_allocvec(&err).unwrap();
            let decoded: CallError = postcard::from_bytes(&bytes).unwrap();
            assert_eq!(err, decoded);
        }
    }
}
