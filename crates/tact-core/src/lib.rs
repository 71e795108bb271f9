//! # tact-core
//!
//! Shared leaf types for the tact actor runtime.
//!
//! This crate defines the vocabulary the rest of the runtime speaks:
//!
//! - [`Pid`] - Process identifier, allocated monotonically per node
//! - [`Message`] - The mailbox envelope, including the reserved call
//!   request/response kinds
//! - [`Codec`] - Typed encode/decode over opaque payload bytes
//! - [`CallError`] / [`SendError`] - The error taxonomy
//!
//! It deliberately contains no scheduling machinery so that transports and
//! codecs can depend on it without pulling in the runtime.

#![deny(missing_docs)]

mod error;
mod message;
mod pid;

pub use error::{CallError, DecodeError, SendError};
pub use message::{CallRequest, CallResponse, Codec, Message};
pub use pid::Pid;
