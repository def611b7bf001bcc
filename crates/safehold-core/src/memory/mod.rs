//! Secure memory primitives for secret bytes.
//!
//! Every type here owns its bytes outright and wipes them when dropped, so
//! releasing a secret is the same thing as letting it go out of scope. The
//! backing pages are additionally locked into RAM where the platform allows.
//!
//! # Memory locking
//!
//! Locking is best effort. On Unix the allocation is passed to `mlock(2)`;
//! failure (for example an exhausted `RLIMIT_MEMLOCK`) is logged at debug
//! level and otherwise ignored. Other platforms only get zeroization.

mod buffer;
mod byte_array;
mod byte_list;

use thiserror::Error;

pub use buffer::SecureBuffer;
pub use byte_array::SecureByteArray;
pub use byte_list::{DEFAULT_CAPACITY, MAX_CAPACITY, SecureByteList};

/// Errors raised by the secure memory primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecureMemoryError {
    /// The object was explicitly released and can no longer be used.
    ///
    /// **[PROGRAMMING ERROR]** Only reachable on shared objects such as
    /// [`SecureByteArray`]; owned buffers are released by dropping them.
    #[error("Secure object used after release")]
    UseAfterRelease,

    /// A fixed-capacity buffer has no room for another byte.
    #[error("Secure buffer is full (capacity {capacity})")]
    Full { capacity: usize },

    /// A growable buffer would need more than [`MAX_CAPACITY`] bytes.
    #[error("Requested capacity {requested} exceeds maximum of {max} bytes")]
    CapacityExceeded { requested: usize, max: usize },

    /// A write targeted bytes beyond the live length of the buffer.
    #[error("Position {position} is out of bounds for length {len}")]
    OutOfBounds { position: usize, len: usize },

    /// A thread panicked while holding the buffer's lock.
    #[error("Secure buffer lock was poisoned")]
    LockPoisoned,
}
