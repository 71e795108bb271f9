//! Mailbox envelopes and typed payload encoding.
//!
//! Every value that moves through a process mailbox is a [`Message`]. The
//! enum structurally separates the reserved kinds - call request/response
//! envelopes and the synthetic lifecycle notifications - from opaque
//! application payloads, so the run loop can intercept calls before generic
//! dispatch. The whole enum is serializable, which keeps envelopes usable
//! as opaque values at a transport boundary.
//!
//! Application payloads and call arguments are single `postcard` blobs;
//! the [`Codec`] trait gives typed access to them.

use crate::error::{CallError, DecodeError};
use crate::pid::Pid;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A message delivered to a process mailbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// Synthetic lifecycle message injected into the mailbox when the
    /// process starts. Dispatched generically, so a `Started` handler runs
    /// inside a continuation and may issue calls.
    Started,

    /// Synthetic lifecycle notification delivered directly to the reactor
    /// (bypassing the mailbox, outside any continuation) as the run loop
    /// terminates.
    Stopping,

    /// Synthetic notification delivered directly to the reactor after a
    /// continuation completed with a captured panic. Carries the panic
    /// message.
    HandlerPanic(String),

    /// A cross-process call request envelope. Intercepted by the run loop
    /// and dispatched by method name, never handed to `on_receive`.
    CallRequest(CallRequest),

    /// A cross-process call response envelope. Intercepted by the run loop
    /// and matched against the pending-call table.
    CallResponse(CallResponse),

    /// An opaque application payload, by convention a `postcard` blob
    /// produced via [`Codec::encode`].
    User(Vec<u8>),
}

impl Message {
    /// Wraps a typed value as an application message.
    ///
    /// # Examples
    ///
    /// ```
    /// use tact_core::{Codec, Message};
    ///
    /// let msg = Message::user(&("hello".to_string(), 7u32));
    /// if let Message::User(bytes) = &msg {
    ///     let (s, n) = <(String, u32)>::decode(bytes).unwrap();
    ///     assert_eq!((s.as_str(), n), ("hello", 7));
    /// }
    /// ```
    pub fn user<T: Codec>(value: &T) -> Self {
        Message::User(value.encode())
    }
}

/// A call request envelope.
///
/// `call_id` is allocated by the issuing process from its own monotonic
/// counter, so it is unique among that process's outstanding calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRequest {
    /// Correlation id, unique per issuing process.
    pub call_id: u64,
    /// The issuing process.
    pub from: Pid,
    /// The target process.
    pub to: Pid,
    /// The method name resolved against the callee's dispatch table.
    pub method: String,
    /// Encoded argument payload.
    pub args: Vec<u8>,
}

/// A call response envelope, mirrored back to the issuing process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallResponse {
    /// Correlation id copied from the request.
    pub call_id: u64,
    /// The responding process.
    pub from: Pid,
    /// The issuing process the response is addressed to.
    pub to: Pid,
    /// Encoded result payload, or the call error raised by dispatch.
    pub result: Result<Vec<u8>, CallError>,
}

/// Typed encode/decode over opaque payload bytes.
///
/// Automatically implemented for any `Serialize + DeserializeOwned + Send
/// + 'static` type, using `postcard` for compact binary encoding.
///
/// # Examples
///
/// ```
/// use tact_core::Codec;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// struct Ping {
///     id: u32,
/// }
///
/// let ping = Ping { id: 42 };
/// let bytes = ping.encode();
/// let decoded = Ping::decode(&bytes).unwrap();
/// assert_eq!(ping, decoded);
/// ```
pub trait Codec: Sized + Send + 'static {
    /// Encodes this value into payload bytes.
    ///
    /// # Panics
    ///
    /// Panics if serialization fails, which does not happen for well-formed
    /// `Serialize` implementations.
    fn encode(&self) -> Vec<u8>;

    /// Decodes a value from payload bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the bytes do not deserialize into this
    /// type.
    fn decode(bytes: &[u8]) -> Result<Self, DecodeError>;
}

impl<T> Codec for T
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    fn encode(&self) -> Vec<u8> {
        postcard::to_allocvec(self).expect("payload serialization failed")
    }

    fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        postcard::from_bytes(bytes).map_err(DecodeError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestPayload {
        id: u32,
        name: String,
    }

    #[test]
    fn test_codec_round_trip() {
        let payload = TestPayload {
            id: 42,
            name: "hello".to_string(),
        };
        let bytes = payload.encode();
        let decoded = TestPayload::decode(&bytes).unwrap();
        assert_eq!(payload, decoded);
    }

    #[test]
    fn test_codec_decode_error() {
        let bad_bytes = vec![0xFF, 0xFF, 0xFF];
        assert!(TestPayload::decode(&bad_bytes).is_err());
    }

    #[test]
    fn test_codec_tuples_and_primitives() {
        let tuple: (u32, String, bool) = (7, "x".to_string(), true);
        let bytes = tuple.encode();
        let decoded = <(u32, String, bool)>::decode(&bytes).unwrap();
        assert_eq!(tuple, decoded);

        let unit: () = ();
        let bytes = unit.encode();
        <()>::decode(&bytes).unwrap();
    }

    #[test]
    fn test_user_message_constructor() {
        let msg = Message::user(&(1u32, 2u32));
        match &msg {
            Message::User(bytes) => {
                assert_eq!(<(u32, u32)>::decode(bytes).unwrap(), (1, 2));
            }
            other => panic!("expected User, got {:?}", other),
        }
    }

    #[test]
    fn test_call_envelopes_round_trip() {
        let request = Message::CallRequest(CallRequest {
            call_id: 9,
            from: Pid::from_raw(1),
            to: Pid::from_raw(2),
            method: "add".to_string(),
            args: (1u32, 2u32).encode(),
        });
        let bytes = postcard::to_allocvec(&request).unwrap();
        let decoded: Message = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(request, decoded);

        let response = Message::CallResponse(CallResponse {
            call_id: 9,
            from: Pid::from_raw(2),
            to: Pid::from_raw(1),
            result: Err(CallError::UnknownMethod("add".to_string())),
        });
        let bytes = postcard::to_allocvec(&response).unwrap();
        let decoded: Message = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(response, decoded);
    }

    #[test]
    fn test_reserved_kinds_are_structurally_distinct() {
        // The run loop matches on the variant to intercept calls before
        // generic dispatch; make sure the envelope kinds never compare
        // equal to a user payload.
        let user = Message::User(Vec::new());
        assert_ne!(user, Message::Started);
        assert_ne!(user, Message::Stopping);
    }
}
