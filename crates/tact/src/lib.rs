//! # tact
//!
//! A tick-driven in-process actor runtime: independent, message-driven
//! processes multiplexed cooperatively, each exposing a blocking-looking
//! call/response API over an asynchronous mailbox, with timeout-based
//! failure recovery.
//!
//! # Overview
//!
//! - **Processes** own a mailbox and a fixed-tick run loop; a [`Node`]
//!   creates, registers, and routes to them by [`Pid`].
//! - **Reactors** are the user-supplied handlers a process hosts: one
//!   [`Reactor::on_receive`] per inbound message, plus a closed
//!   [`Reactor::handle_call`] dispatch table for named calls.
//! - **Calls** suspend the current invocation - not the process - until a
//!   response arrives or the deadline expires, via
//!   [`ProcessContext::call`].
//!
//! Routing is local-registry only and best-effort; transports and codecs
//! live outside this crate and interact with it solely through
//! [`Node::route`] and the serializable [`Message`] envelope.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tact::prelude::*;
//!
//! struct Adder;
//!
//! #[async_trait]
//! impl Reactor for Adder {
//!     async fn on_receive(&self, _ctx: &mut ProcessContext) {}
//!
//!     fn handle_call(&self, method: &str, args: &[u8]) -> Result<Vec<u8>, CallError> {
//!         match method {
//!             "add" => {
//!                 let (a, b) = <(i64, i64)>::decode(args)
//!                     .map_err(|e| CallError::BadResponse(e.to_string()))?;
//!                 Ok((a + b).encode())
//!             }
//!             other => Err(CallError::UnknownMethod(other.to_owned())),
//!         }
//!     }
//! }
//!
//! struct Caller {
//!     adder: Pid,
//! }
//!
//! #[async_trait]
//! impl Reactor for Caller {
//!     async fn on_receive(&self, ctx: &mut ProcessContext) {
//!         if ctx.message() == &Message::Started {
//!             let sum: i64 = ctx
//!                 .call(self.adder, "add", &(20i64, 22i64), Duration::from_secs(2))
//!                 .await
//!                 .unwrap();
//!             assert_eq!(sum, 42);
//!         }
//!     }
//! }
//!
//! # #[tokio::main] async fn main() {
//! let node = Node::start(1);
//! let adder = node.create_process(Arc::new(Adder));
//! let _caller = node.create_process(Arc::new(Caller { adder }));
//! // ... let the node run ...
//! node.stop().await;
//! # }
//! ```

#![deny(missing_docs)]

mod node;

pub use node::Node;

pub use tact_core::{
    CallError, CallRequest, CallResponse, Codec, DecodeError, Message, Pid, SendError,
};
pub use tact_runtime::{async_trait, ProcessContext, Reactor, FRAME_INTERVAL};

/// Commonly used imports for building reactors.
pub mod prelude {
    pub use crate::{
        async_trait, CallError, Codec, Message, Node, Pid, ProcessContext, Reactor,
    };
}
