//! Error types for offheap arrays.
//!
//! Two layers: [`AllocError`] is what an allocation backend reports, and
//! [`ArrayError`] is what every fallible container operation returns.

use std::error::Error;
use std::fmt;

/// An allocation backend failed to produce a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocError {
    /// Number of bytes that were requested.
    pub requested_bytes: usize,
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "allocation of {} bytes failed", self.requested_bytes)
    }
}

impl Error for AllocError {}

/// Errors from array construction, access, resize and copy.
///
/// All variants are raised synchronously at the point of violation and are
/// never retried internally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArrayError {
    /// An argument was rejected before any memory was touched
    /// (e.g. a length whose byte size overflows `isize::MAX`).
    InvalidArgument {
        /// Description of the rejected argument.
        reason: String,
    },
    /// An index outside `[0, len)` was used for a read or write.
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// Length of the array at the time of access.
        len: usize,
    },
    /// The allocator could not provide the backing block.
    OutOfMemory {
        /// Number of bytes that were requested.
        requested: usize,
    },
    /// The array was disposed; its memory has been released.
    Disposed,
}

impl ArrayError {
    /// Shorthand for an [`ArrayError::InvalidArgument`] with the given reason.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ArrayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { reason } => write!(f, "invalid argument: {reason}"),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for length {len}")
            }
            Self::OutOfMemory { requested } => {
                write!(f, "out of memory: requested {requested} bytes")
            }
            Self::Disposed => write!(f, "array has been disposed"),
        }
    }
}

impl Error for ArrayError {}

impl From<AllocError> for ArrayError {
    fn from(err: AllocError) -> Self {
        Self::OutOfMemory {
            requested: err.requested_bytes,
        }
    }
}
