//! Synchronization primitives
//!
//! Counting semaphores and bounded message queues, both built on the
//! kernel's block/unblock protocol.

#[cfg(feature = "sem")]
pub mod sem;

#[cfg(feature = "queue")]
pub mod queue;
