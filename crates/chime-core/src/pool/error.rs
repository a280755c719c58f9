//! Channel pool error types

use thiserror::Error;

use crate::types::SoundHandle;

/// Errors reported by channel pool operations
///
/// Every condition is detected before the pool is mutated, so a failed
/// operation leaves the free and active lists untouched.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// Add was called with every channel already in use
    #[error("Sound pool full")]
    PoolFull,

    /// Handle is out of range or addresses a free slot
    #[error("Invalid sound handle: {0}")]
    InvalidHandle(SoundHandle),

    /// The pool was never initialized or has been shut down
    #[error("Sound pool not initialized")]
    NotInitialized,

    /// The free-list head points outside the channel array
    #[error("Free list corrupt: head {head} out of range")]
    FreeListCorrupt { head: usize },
}

/// Result type for pool operations
pub type PoolResult<T> = Result<T, PoolError>;
