//! Error types
//!
//! All fallible kernel calls return [`OsResult`]. The three caller-visible
//! outcomes are `Ok(())`, `Err(OsError::WouldBlock)` for a non-blocking
//! operation that found its resource unavailable, and any other `Err`
//! variant for argument or state errors. Failed calls never leave partial
//! state behind.

/// Kernel error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OsError {
    /// Task stack smaller than the configured minimum
    StackTooSmall,
    /// Allocation failed
    OutOfMemory,
    /// Zero capacity or item size at queue creation
    InvalidSize,
    /// Payload length does not match the queue's item size
    ItemSizeMismatch,
    /// Non-blocking operation found the resource unavailable
    WouldBlock,
    /// Semaphore released while already at its ceiling
    SemOverflow,
    /// Pause of a task that is already paused
    AlreadyPaused,
    /// Resume of a task that is not paused
    NotPaused,
    /// Operation not permitted on the idle task
    IdleTask,
    /// Blocking or allocating call made from interrupt context
    IsrContext,
}

/// Result type alias for kernel operations
pub type OsResult<T> = Result<T, OsError>;

impl OsError {
    /// True for the try-failed outcome of a non-blocking operation
    #[inline]
    pub fn is_would_block(self) -> bool {
        self == OsError::WouldBlock
    }
}
