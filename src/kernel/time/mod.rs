//! Time management
//!
//! The periodic tick drives delay countdowns and preemption. Every tick
//! advances the monotonic counter; every full quantum the handler walks
//! the ring once, releasing expired delays, and pends a context switch.

use core::ptr::NonNull;

use crate::kernel::critical::CriticalSection;
use crate::kernel::sched::next_of;
use crate::kernel::state::{KERNEL, TICK};
use crate::kernel::task::Tcb;
use crate::kernel::types::{Tick, WaitState};
use crate::port;

/// Get the monotonic tick count
#[inline]
pub fn os_tick_count() -> Tick {
    KERNEL.tick_get()
}

/// Count down timed waits by one quantum.
///
/// One pass over the ring, excluding the running task. A paused task
/// keeps its remaining timeout untouched; it picks the countdown back up
/// once resumed. A task whose timeout reaches zero becomes runnable.
///
/// # Safety
/// `run` must be a member of a well-formed ring and interrupts must be
/// masked.
pub(crate) unsafe fn advance_timeouts(run: NonNull<Tcb>) {
    let mut cur = next_of(run);

    while cur != run {
        let t = unsafe { &mut *cur.as_ptr() };
        if t.wait == WaitState::Timed && !t.paused && t.timeout > 0 {
            t.timeout -= 1;
            if t.timeout == 0 {
                t.wait = WaitState::None;
            }
        }
        cur = next_of(cur);
    }
}

/// Periodic tick entry point.
///
/// Runs in interrupt context once per tick period. On every full quantum
/// it releases expired delays and requests a context switch.
pub fn os_tick_handler() {
    let cs = CriticalSection::enter();

    KERNEL.tick_increment();

    let tick = TICK.get(&cs);
    tick.counter += 1;

    if tick.counter >= tick.quantum && KERNEL.scheduler_enabled() {
        tick.counter = 0;

        if let Some(run) = crate::kernel::state::current_task() {
            unsafe { advance_timeouts(run) };
        }

        port::os_ctx_sw();
    }
}

/// SysTick interrupt handler
#[cfg(target_arch = "arm")]
#[no_mangle]
pub extern "C" fn SysTick() {
    os_tick_handler();
}
