//! Cortex-M port implementation
//!
//! Context switching via the PendSV exception. PendSV runs at the lowest
//! exception priority so every interrupt, including the tick, preempts
//! it; SysTick sits one level above it. The handler saves the software
//! frame onto the process stack, asks the scheduler for the next task
//! and restores that task's frame. The EXC_RETURN word saved inside each
//! frame tells the restore path whether FP registers are part of it.

#![allow(named_asm_labels)]

use core::arch::{asm, naked_asm};
use core::ptr::null_mut;

use cortex_m::peripheral::scb::SystemHandler;
use cortex_m::peripheral::syst::SystClkSource;

use crate::kernel::config::{SYSTEM_CLOCK_HZ, TICK_RATE_HZ};
use crate::kernel::sched;
use crate::kernel::state;
use crate::kernel::types::StackWord;

/// Dedicated stack for exception handlers (MSP)
#[no_mangle]
static mut INTERRUPT_STACK: [u64; 256] = [0xDEADBEEF_DEADBEEF; 256];

/// Trigger a context switch.
///
/// Just pends PendSV; the switch happens once no higher-priority
/// exception is active.
#[inline(always)]
pub fn os_ctx_sw() {
    cortex_m::peripheral::SCB::set_pendsv();
}

/// Configure SysTick for the kernel tick rate
fn os_systick_init(syst: &mut cortex_m::peripheral::SYST) {
    let reload = SYSTEM_CLOCK_HZ / TICK_RATE_HZ;
    syst.set_reload(reload - 1);
    syst.clear_current();
    syst.set_clock_source(SystClkSource::Core);
    syst.enable_interrupt();
    syst.enable_counter();
}

/// Launch multitasking. Never returns.
///
/// Sets exception priorities, starts the tick, points MSP at the
/// dedicated interrupt stack and pends the first context switch with a
/// null PSP so the handler skips the save phase and restores straight
/// into the chosen task.
///
/// # Safety
/// Must be called exactly once, from thread mode, after the kernel state
/// has been initialized.
pub unsafe fn os_start_first() -> ! {
    unsafe {
        let mut p = cortex_m::Peripherals::steal();

        // PendSV lowest, tick one level above it
        p.SCB.set_priority(SystemHandler::PendSV, 0xF0);
        p.SCB.set_priority(SystemHandler::SysTick, 0xE0);

        os_systick_init(&mut p.SYST);

        let msp_top = (&raw const INTERRUPT_STACK) as u32
            + core::mem::size_of::<[u64; 256]>() as u32;

        asm!("msr msp, {0}", in(reg) msp_top);
        asm!("msr psp, {0}", in(reg) 0);

        cortex_m::interrupt::enable();
        cortex_m::peripheral::SCB::set_pendsv();

        // execution continues inside the first task; this thread context
        // is abandoned
        loop {
            cortex_m::asm::wfi();
        }
    }
}

/// Store the outgoing stack pointer, pick the next task, hand back its
/// stack pointer. Called from PendSV with interrupts masked.
#[inline(never)]
#[no_mangle]
unsafe extern "C" fn pendsv_switch_context(cur_sp: *mut StackWord) -> *mut StackWord {
    if !cur_sp.is_null() {
        if let Some(cur) = state::current_task() {
            unsafe { (*cur.as_ptr()).stk_ptr = cur_sp };
        }
    }

    match sched::reschedule() {
        Some(next) => unsafe { (*next.as_ptr()).stk_ptr },
        None => null_mut(),
    }
}

/// PendSV exception handler - performs the full context switch
///
/// 1. Save S16-S31 (when the preempted task has FP state), R4-R11 and
///    the EXC_RETURN marker onto the process stack; skip on the very
///    first dispatch (PSP still null)
/// 2. Call `pendsv_switch_context` to store the SP and pick the next task
/// 3. Restore the marker, R4-R11 and, when the marker says so, S16-S31
/// 4. Exception return pops the hardware frame
#[no_mangle]
#[unsafe(naked)]
pub unsafe extern "C" fn PendSV() {
    naked_asm!(
        "cpsid i",
        "mrs r0, psp",
        "cbz r0, 1f",
        "tst lr, #0x10",
        "it eq",
        "vstmdbeq r0!, {{s16-s31}}",
        "stmdb r0!, {{r4-r11}}",
        "stmdb r0!, {{r14}}",
        "1:",
        "bl pendsv_switch_context",
        "cbz r0, 2f",
        "ldmia r0!, {{r14}}",
        "ldmia r0!, {{r4-r11}}",
        "tst lr, #0x10",
        "it eq",
        "vldmiaeq r0!, {{s16-s31}}",
        "msr psp, r0",
        "2:",
        "dsb",
        "isb",
        "cpsie i",
        "bx lr",
    );
}
