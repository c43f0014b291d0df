//! Port layer - CPU-specific implementations
//!
//! The frame builder is target independent; the context-switch glue is
//! Cortex-M asm, with a stub used on other targets so the kernel logic
//! can run under the host test harness.

pub mod frame;

#[cfg(target_arch = "arm")]
pub mod cortex_m4;

#[cfg(target_arch = "arm")]
pub use cortex_m4::*;

#[cfg(not(target_arch = "arm"))]
pub mod stub;

#[cfg(not(target_arch = "arm"))]
pub use stub::*;
