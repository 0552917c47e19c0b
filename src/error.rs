//! Errors reported by fallible arena allocation.

use std::collections::TryReserveError;
use std::fmt;

/// Error type for operations that grow the node arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvlError {
    /// The requested number of slots does not fit in `usize`.
    CapacityOverflow,
    /// The allocator refused to provide memory for the arena.
    AllocationFailed(TryReserveError),
}

impl fmt::Display for AvlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvlError::CapacityOverflow => write!(f, "arena capacity overflow"),
            AvlError::AllocationFailed(err) => write!(f, "arena allocation failed: {}", err),
        }
    }
}

impl std::error::Error for AvlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AvlError::CapacityOverflow => None,
            AvlError::AllocationFailed(err) => Some(err),
        }
    }
}

impl From<TryReserveError> for AvlError {
    fn from(err: TryReserveError) -> Self {
        AvlError::AllocationFailed(err)
    }
}

/// Result type for operations that may fail to grow the arena.
pub type AvlResult<T> = Result<T, AvlError>;
