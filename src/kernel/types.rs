//! Core type definitions
//!
//! Strongly typed scalars and state tags used across the kernel.

use core::ptr::NonNull;

/// Stack element type (one 32-bit word)
pub type StackWord = u32;

/// Tick counter type
pub type Tick = u32;

/// Semaphore counter type
pub type SemCount = u32;

/// Task priority, lowest first
///
/// The idle priority is reserved for the built-in idle task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Priority {
    Idle = 0,
    Low = 1,
    Medium = 2,
    High = 3,
}

/// Whether a task touches the floating-point coprocessor
///
/// Selects the extended saved-register frame. A task that executes FP
/// instructions must be created with [`FpuMode::Fpu`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FpuMode {
    NoFpu,
    Fpu,
}

/// Blocking behavior of queue operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlockMode {
    /// Suspend the calling task until the operation can complete
    Block,
    /// Fail with `WouldBlock` instead of suspending
    NoBlock,
}

/// Identity of a blockable kernel object
///
/// The stable address of a semaphore or queue, type-erased. Two distinct
/// objects always compare unequal, so their waiters never mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitToken(NonNull<()>);

impl WaitToken {
    /// Token for an object at a stable address
    pub fn of<T>(obj: &T) -> Self {
        WaitToken(NonNull::from(obj).cast())
    }
}

// SAFETY: the token is only compared, never dereferenced.
unsafe impl Send for WaitToken {}
unsafe impl Sync for WaitToken {}

/// What a task is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    /// Runnable
    None,
    /// Counting down a delay
    Timed,
    /// Parked on a semaphore or queue
    Object(WaitToken),
}
