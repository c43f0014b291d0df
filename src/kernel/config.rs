//! Compile-time configuration
//!
//! These constants control timing and resource limits of the kernel.

/// System tick rate in Hz (1 ms period)
pub const TICK_RATE_HZ: u32 = 1_000;

/// Core clock frequency used to program the tick timer
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;

/// Default scheduling quantum, in ticks
pub const DEFAULT_QUANTUM_TICKS: u32 = 1;

/// Minimum task stack size in words
pub const MIN_STACK_WORDS: usize = 64;

/// Idle task stack size in words
pub const IDLE_STACK_WORDS: usize = 64;
