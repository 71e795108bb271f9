//! The runtime control surface.
//!
//! A [`Node`] owns the process registry, the pid allocator, and the router
//! loop that moves envelopes from the shared router queue into process
//! mailboxes. It is an explicit, owned object rather than a hidden global:
//! several nodes can coexist in one OS process (useful in tests), each with
//! its own registry and id space.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tact_core::{Message, Pid};
use tact_runtime::{Process, ProcessRegistry, Reactor, RouterHandle, FRAME_INTERVAL};
use tokio::sync::{mpsc, watch};

/// A running actor runtime instance.
///
/// Cloning a `Node` is cheap and shares the underlying runtime.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use tact::{Node, Reactor, ProcessContext, async_trait};
///
/// struct Greeter;
///
/// #[async_trait]
/// impl Reactor for Greeter {
///     async fn on_receive(&self, ctx: &mut ProcessContext) {
///         println!("{} got {:?}", ctx.pid(), ctx.message());
///     }
/// }
///
/// # #[tokio::main] async fn main() {
/// let node = Node::start(1);
/// let pid = node.create_process(Arc::new(Greeter));
/// assert!(pid.is_valid());
/// node.stop().await;
/// # }
/// ```
#[derive(Clone)]
pub struct Node {
    inner: Arc<NodeInner>,
}

struct NodeInner {
    node_id: u32,
    registry: ProcessRegistry,
    router: RouterHandle,
    next_pid: AtomicU64,
    running: AtomicBool,
    stop_tx: mpsc::Sender<()>,
    done_rx: watch::Receiver<bool>,
}

impl Node {
    /// Starts a node and its router loop.
    ///
    /// `node_id` identifies this runtime instance in logs; routing itself
    /// is local-registry only. Must be called from within a tokio runtime.
    pub fn start(node_id: u32) -> Self {
        let registry = ProcessRegistry::new();
        let router = RouterHandle::new();
        let (stop_tx, stop_rx) = mpsc::channel(1);
        let (done_tx, done_rx) = watch::channel(false);

        let loop_registry = registry.clone();
        let loop_router = router.clone();
        tokio::spawn(async move {
            router_loop(loop_registry, loop_router, stop_rx).await;
            let _ = done_tx.send(true);
        });

        tracing::info!(node_id, "node started");
        Self {
            inner: Arc::new(NodeInner {
                node_id,
                registry,
                router,
                next_pid: AtomicU64::new(0),
                running: AtomicBool::new(true),
                stop_tx,
                done_rx,
            }),
        }
    }

    /// This node's identifier.
    pub fn node_id(&self) -> u32 {
        self.inner.node_id
    }

    /// Creates a process hosting `reactor`, starts its run loop, and
    /// returns its id.
    ///
    /// The new process receives [`Message::Started`] as its first
    /// dispatched message. Returns [`Pid::INVALID`] if the node has been
    /// stopped.
    pub fn create_process(&self, reactor: Arc<dyn Reactor>) -> Pid {
        if !self.inner.running.load(Ordering::SeqCst) {
            return Pid::INVALID;
        }

        let pid = Pid::from_raw(self.inner.next_pid.fetch_add(1, Ordering::SeqCst) + 1);
        let (process, handle) = Process::new(pid, reactor, self.inner.router.clone());
        if !self.inner.registry.insert(handle) {
            // Unreachable with monotonic allocation; the unstarted process
            // is dropped without ever dispatching.
            tracing::error!(node_id = self.inner.node_id, %pid, "pid already registered");
            return Pid::INVALID;
        }
        process.start();
        tracing::debug!(node_id = self.inner.node_id, %pid, "process created");
        pid
    }

    /// Unregisters a process and stops it, waiting for its run loop to
    /// terminate. A no-op for unknown pids.
    pub async fn destroy_process(&self, pid: Pid) {
        let Some(handle) = self.inner.registry.remove(pid) else {
            return;
        };
        handle.stop().await;
        tracing::debug!(node_id = self.inner.node_id, %pid, "process destroyed");
    }

    /// Routes a message to a process, fire-and-forget.
    ///
    /// Never blocks and never errors; envelopes addressed to a process
    /// that no longer exists when the router drains them are dropped.
    pub fn route(&self, to: Pid, message: Message) {
        self.inner.router.route(to, message);
    }

    /// Returns `true` while the node accepts process creation.
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Stops every registered process, clears the registry, and halts the
    /// router loop. Idempotent; concurrent callers all wait for shutdown
    /// to finish.
    pub async fn stop(&self) {
        if self.inner.running.swap(false, Ordering::SeqCst) {
            for handle in self.inner.registry.handles() {
                handle.stop().await;
            }
            self.inner.registry.clear();
            let _ = self.inner.stop_tx.try_send(());
            tracing::info!(node_id = self.inner.node_id, "node stopped");
        }
        let mut done = self.inner.done_rx.clone();
        let _ = done.wait_for(|stopped| *stopped).await;
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("node_id", &self.inner.node_id)
            .field("processes", &self.inner.registry.len())
            .field("running", &self.is_running())
            .finish()
    }
}

/// Moves envelopes from the router queue into target mailboxes on the same
/// fixed tick as process loops.
async fn router_loop(
    registry: ProcessRegistry,
    router: RouterHandle,
    mut stop_rx: mpsc::Receiver<()>,
) {
    loop {
        let tick_start = Instant::now();
        for routed in router.queue().drain_all() {
            match registry.get(routed.to) {
                Some(handle) => handle.push(routed.message),
                // Best-effort delivery: unknown targets are dropped, never
                // reported to the sender.
                None => tracing::debug!(to = %routed.to, "dropping message for unknown process"),
            }
        }

        let cost = tick_start.elapsed();
        if cost >= FRAME_INTERVAL {
            tracing::warn!(cost_ms = cost.as_millis() as u64, "router tick overran frame interval");
            match stop_rx.try_recv() {
                Ok(()) | Err(mpsc::error::TryRecvError::Disconnected) => return,
                Err(mpsc::error::TryRecvError::Empty) => {}
            }
        } else {
            tokio::select! {
                _ = stop_rx.recv() => return,
                _ = tokio::time::sleep(FRAME_INTERVAL - cost) => {}
            }
        }
    }
}
