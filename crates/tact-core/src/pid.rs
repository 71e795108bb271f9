//! Process identifier type.
//!
//! A [`Pid`] uniquely identifies a process within one [`Node`]'s lifetime.
//! Ids are allocated by the node from a monotonic counter starting at 1;
//! the value 0 is reserved to signal "invalid / creation failed".
//!
//! [`Node`]: https://docs.rs/tact

use serde::{Deserialize, Serialize};
use std::fmt;

/// A process identifier.
///
/// Every process created on a node gets a `Pid` that is unique for the
/// node's lifetime and strictly greater than any previously returned id.
/// A `Pid` is the only thing a sender needs in order to route messages or
/// issue calls to a process.
///
/// # Examples
///
/// ```
/// use tact_core::Pid;
///
/// let pid = Pid::from_raw(42);
/// assert!(pid.is_valid());
/// assert_eq!(pid.to_string(), "<42>");
///
/// // 0 signals a failed creation.
/// assert!(!Pid::INVALID.is_valid());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pid(u64);

impl Pid {
    /// The reserved invalid identifier.
    ///
    /// Returned by process creation when the runtime is not started.
    /// No live process ever has this id.
    pub const INVALID: Pid = Pid(0);

    /// Creates a `Pid` from a raw identifier value.
    ///
    /// This is used by the node's allocator, by deserialization, and in
    /// tests. `Pid::from_raw(0)` is equal to [`Pid::INVALID`].
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier value.
    #[inline]
    pub const fn as_raw(&self) -> u64 {
        self.0
    }

    /// Returns `true` unless this is the reserved invalid id.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Debug for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pid<{}>", self.0)
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pid() {
        assert!(!Pid::INVALID.is_valid());
        assert_eq!(Pid::from_raw(0), Pid::INVALID);
        assert!(Pid::from_raw(1).is_valid());
    }

    #[test]
    fn test_pid_ordering() {
        assert!(Pid::from_raw(1) < Pid::from_raw(2));
        assert_ne!(Pid::from_raw(1), Pid::from_raw(2));
    }

    #[test]
    fn test_pid_display() {
        let pid = Pid::from_raw(42);
        assert_eq!(format!("{}", pid), "<42>");
        assert_eq!(format!("{:?}", pid), "Pid<42>");
    }

    #[test]
    fn test_pid_serialization() {
        let pid = Pid::from_raw(123);
        let bytes = postcard::to_allocvec(&pid).unwrap();
        let decoded: Pid = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(pid, decoded);
    }

    #[test]
    fn test_pid_hash() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(Pid::from_raw(1));
        set.insert(Pid::from_raw(2));
        set.insert(Pid::from_raw(1)); // duplicate

        assert_eq!(set.len(), 2);
    }
}
