//! Stub port for non-ARM targets
//!
//! Lets the kernel logic build and run under the host test harness. The
//! context-switch trampoline is replaced by a counter so tests can
//! assert whether a call requested a switch.

use core::sync::atomic::{AtomicUsize, Ordering};

static CTX_SW_REQUESTS: AtomicUsize = AtomicUsize::new(0);

/// Record a context switch request
pub fn os_ctx_sw() {
    CTX_SW_REQUESTS.fetch_add(1, Ordering::Relaxed);
}

/// Number of context switches requested so far
pub fn ctx_sw_requests() -> usize {
    CTX_SW_REQUESTS.load(Ordering::Relaxed)
}

/// Launching tasks requires the real port.
///
/// # Safety
/// Never sound to call on this target; always panics.
pub unsafe fn os_start_first() -> ! {
    panic!("os_start_first is not available on this platform");
}
