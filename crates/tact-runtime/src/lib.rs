//! # tact-runtime
//!
//! Scheduler core for the tact actor runtime.
//!
//! This crate provides the pieces a node assembles into a running system:
//!
//! - [`MessageQueue`] / [`Mailbox`] - thread-safe FIFO hand-off queues
//! - [`Process`] / [`ProcessHandle`] - the fixed-tick per-process run loop
//!   with its pending-call table
//! - [`ProcessContext`] - the per-invocation capability object, including
//!   the blocking-style [`call`] helper
//! - [`Reactor`] - the message-handling capability user code implements
//! - [`ProcessRegistry`] - the node-wide table of live processes
//! - [`RouterHandle`] - the fire-and-forget routing capability
//!
//! The continuation primitive that makes [`call`] read as a blocking
//! operation is internal to this crate; reactors only ever see it through
//! the context.
//!
//! [`call`]: ProcessContext::call

#![deny(missing_docs)]

mod continuation;
mod context;
mod mailbox;
mod process;
mod reactor;
mod registry;
mod router;

pub use context::ProcessContext;
pub use mailbox::{Mailbox, MessageQueue};
pub use process::{Process, ProcessHandle, FRAME_INTERVAL};
pub use reactor::Reactor;
pub use registry::ProcessRegistry;
pub use router::{Routed, RouterHandle};

// Reactor implementations need the attribute macro.
pub use async_trait::async_trait;

// Re-export core types for convenience
pub use tact_core::{CallError, CallRequest, CallResponse, Codec, Message, Pid, SendError};
