//! Process registry mapping pids to process handles.
//!
//! The registry is the node-wide table of live processes. Lookups vastly
//! outnumber create/destroy, so it uses a sharded concurrent map; global
//! stop takes a snapshot of the handles and stops them outside the map's
//! locks, tolerating concurrent destroy calls.

use crate::process::ProcessHandle;
use dashmap::DashMap;
use std::sync::Arc;
use tact_core::{Message, Pid, SendError};

/// A thread-safe registry of all running processes on a node.
///
/// A pid resolves to at most one live process at a time; once removed, a
/// pid is never reused (allocation is monotonic for the node's lifetime).
#[derive(Clone)]
pub struct ProcessRegistry {
    processes: Arc<DashMap<Pid, ProcessHandle>>,
}

impl ProcessRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            processes: Arc::new(DashMap::new()),
        }
    }

    /// Registers a process.
    ///
    /// Returns `false` (leaving the registry unchanged) if the pid is
    /// already registered. With monotonic allocation this does not occur,
    /// but the caller treats it as a failed creation.
    pub fn insert(&self, handle: ProcessHandle) -> bool {
        match self.processes.entry(handle.pid()) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(handle);
                true
            }
        }
    }

    /// Removes a process, returning its handle if it was registered.
    pub fn remove(&self, pid: Pid) -> Option<ProcessHandle> {
        self.processes.remove(&pid).map(|(_, handle)| handle)
    }

    /// Gets a handle to a process by pid.
    pub fn get(&self, pid: Pid) -> Option<ProcessHandle> {
        self.processes.get(&pid).map(|r| r.value().clone())
    }

    /// Returns `true` if a process with the given pid exists.
    pub fn contains(&self, pid: Pid) -> bool {
        self.processes.contains_key(&pid)
    }

    /// Returns the number of registered processes.
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    /// Returns `true` if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Removes every process from the registry.
    pub fn clear(&self) {
        self.processes.clear();
    }

    /// Returns a snapshot of all registered handles.
    ///
    /// Used by global stop so the handles can be stopped without holding
    /// the map's locks while concurrent stop/cleanup runs.
    pub fn handles(&self) -> Vec<ProcessHandle> {
        self.processes.iter().map(|r| r.value().clone()).collect()
    }

    /// Pushes a message straight into a process's mailbox.
    ///
    /// This is the synchronous, error-reporting path used by collaborators
    /// that hold the registry directly; ordinary senders go through the
    /// router instead.
    pub fn deliver(&self, pid: Pid, message: Message) -> Result<(), SendError> {
        match self.processes.get(&pid) {
            Some(handle) => {
                handle.push(message);
                Ok(())
            }
            None => Err(SendError::ProcessNotFound(pid)),
        }
    }
}

impl Default for ProcessRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProcessRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessRegistry")
            .field("process_count", &self.processes.len())
            .finish()
    }
}
