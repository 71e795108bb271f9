//! The message-handling capability a process hosts.

use crate::context::ProcessContext;
use async_trait::async_trait;
use tact_core::CallError;

/// User-supplied message handler bound to a process.
///
/// The runtime invokes [`on_receive`] once per inbound application message
/// (inside a fresh continuation), once for [`Message::Started`], once for
/// [`Message::Stopping`] as the process shuts down, and once per captured
/// panic ([`Message::HandlerPanic`]). The latter two arrive outside any
/// continuation, so calls issued from them fail with
/// [`CallError::NoContinuation`].
///
/// Methods take `&self` because an `on_receive` invocation suspended on an
/// outstanding call coexists with loop-side call dispatch; implementations
/// keep mutable state behind interior mutability.
///
/// [`on_receive`]: Reactor::on_receive
/// [`Message::Started`]: tact_core::Message::Started
/// [`Message::Stopping`]: tact_core::Message::Stopping
/// [`Message::HandlerPanic`]: tact_core::Message::HandlerPanic
///
/// # Examples
///
/// ```
/// use tact_runtime::{async_trait, ProcessContext, Reactor};
/// use tact_core::{CallError, Codec};
///
/// struct Adder;
///
/// #[async_trait]
/// impl Reactor for Adder {
///     async fn on_receive(&self, _ctx: &mut ProcessContext) {}
///
///     fn handle_call(&self, method: &str, args: &[u8]) -> Result<Vec<u8>, CallError> {
///         match method {
///             "add" => {
///                 let (a, b) = <(i64, i64)>::decode(args)
///                     .map_err(|e| CallError::BadResponse(e.to_string()))?;
///                 Ok((a + b).encode())
///             }
///             other => Err(CallError::UnknownMethod(other.to_owned())),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Reactor: Send + Sync + 'static {
    /// Handles one inbound message.
    async fn on_receive(&self, ctx: &mut ProcessContext);

    /// Dispatches a named call against this reactor.
    ///
    /// This is the closed dispatch table for cross-process calls: a `match`
    /// on the method name, decoding `args` and returning an encoded result.
    /// Unknown names are an ordinary call error. The runtime wraps the
    /// invocation in panic recovery and mirrors any error back to the
    /// caller inside the response envelope.
    fn handle_call(&self, method: &str, _args: &[u8]) -> Result<Vec<u8>, CallError> {
        Err(CallError::UnknownMethod(method.to_owned()))
    }
}
