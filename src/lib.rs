//! ringos — a minimal preemptive RTOS kernel for ARM Cortex-M
//!
//! A single-core real-time kernel providing:
//! - Priority-based preemptive scheduling with round-robin time slicing
//! - Counting semaphores and bounded FIFO message queues
//! - Tick-driven delays and task pause/resume
//! - PendSV/SysTick context switching with optional FPU frames
//!
//! Tasks live on a circular intrusive list rooted at a built-in idle task.
//! The scheduler walks the ring once per decision: the highest-priority
//! runnable task wins, and equal-priority tasks rotate because the walk
//! starts just after the task that last ran.
//!
//! The crate is `no_std` and uses the `alloc` crate for task control
//! blocks, default task stacks and queue storage. The platform must
//! install a global allocator (see the demos for an `embedded-alloc`
//! setup) and the vector table must route `SysTick` and `PendSV` to the
//! handlers exported here, which `cortex-m-rt` does by default.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]

extern crate alloc;

// ============ Critical Section ============

#[cfg(target_arch = "arm")]
mod cs_impl {
    use cortex_m::interrupt;
    use cortex_m::register::primask;
    use critical_section::{Impl, RawRestoreState, set_impl};

    struct SingleCoreCriticalSection;
    set_impl!(SingleCoreCriticalSection);

    unsafe impl Impl for SingleCoreCriticalSection {
        unsafe fn acquire() -> RawRestoreState {
            let was_active = primask::read().is_active();
            interrupt::disable();
            was_active
        }

        unsafe fn release(was_active: RawRestoreState) {
            if was_active {
                unsafe { interrupt::enable() }
            }
        }
    }
}

// ============ Modules ============

pub mod log;
mod lang_items;

pub mod kernel;
pub mod port;
pub mod sync;

// ============ Re-exports ============

pub use kernel::config;
pub use kernel::critical;
pub use kernel::critical::{CriticalSection, critical_section};
pub use kernel::error;
pub use kernel::error::{OsError, OsResult};
pub use kernel::state::os_init;
pub use kernel::task;
pub use kernel::task::{TaskFn, TaskId, os_delay, os_pause, os_resume, os_thread_new, os_yield};
pub use kernel::time::{os_tick_count, os_tick_handler};
pub use kernel::types;
pub use kernel::types::*;

#[cfg(feature = "sem")]
pub use sync::sem::Semaphore;

#[cfg(feature = "queue")]
pub use sync::queue::Queue;
