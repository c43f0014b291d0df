//! Critical section handling
//!
//! All kernel state lives under one interrupt-masking critical section.
//! The section is reentrant: kernel paths drop their guard to pend a
//! context switch and take a fresh one when the task resumes, and user
//! code may already hold a section when it calls in.

use core::sync::atomic::{AtomicU8, Ordering};

/// Nesting depth of the critical section
static DEPTH: AtomicU8 = AtomicU8::new(0);

/// RAII guard for critical sections
///
/// Creating the guard masks interrupts; dropping the outermost guard
/// unmasks them again.
pub struct CriticalSection {
    _private: (),
}

impl CriticalSection {
    /// Enter a critical section by disabling interrupts.
    ///
    /// Returns a guard that re-enables interrupts when the last nested
    /// guard is dropped.
    #[inline(always)]
    pub fn enter() -> Self {
        #[cfg(target_arch = "arm")]
        cortex_m::interrupt::disable();

        DEPTH.fetch_add(1, Ordering::Acquire);
        CriticalSection { _private: () }
    }

    /// Check if any critical section is currently held
    #[inline(always)]
    pub fn is_active() -> bool {
        DEPTH.load(Ordering::Acquire) > 0
    }

    /// Current nesting depth
    #[inline(always)]
    #[allow(dead_code)]
    pub(crate) fn depth() -> u8 {
        DEPTH.load(Ordering::Acquire)
    }
}

impl Drop for CriticalSection {
    #[inline(always)]
    fn drop(&mut self) {
        let prev = DEPTH.fetch_sub(1, Ordering::Release);

        if prev == 1 {
            #[cfg(target_arch = "arm")]
            unsafe {
                cortex_m::interrupt::enable()
            };
        }
    }
}

/// Execute a closure with interrupts disabled
///
/// The closure receives a reference to the guard, which can be used to
/// access [`CsCell`](crate::kernel::cs_cell::CsCell) protected data.
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(&CriticalSection) -> R,
{
    let cs = CriticalSection::enter();
    f(&cs)
}

/// Check if currently executing in an ISR context
#[inline]
pub fn is_isr_context() -> bool {
    #[cfg(target_arch = "arm")]
    {
        let ipsr: u32;
        unsafe {
            core::arch::asm!(
                "mrs {}, IPSR",
                out(reg) ipsr,
                options(nomem, nostack, preserves_flags)
            );
        }
        ipsr != 0
    }

    #[cfg(not(target_arch = "arm"))]
    {
        false
    }
}
