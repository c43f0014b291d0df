//! Global kernel state and startup
//!
//! Holds the run pointer (the thread of execution), the idle task, the
//! tick bookkeeping and the kernel flags. Everything mutable is either
//! atomic or guarded by the critical section.

use core::ptr::{self, NonNull};
use core::sync::atomic::{AtomicBool, AtomicPtr, AtomicU32, Ordering};

use crate::kernel::config::{DEFAULT_QUANTUM_TICKS, IDLE_STACK_WORDS};
use crate::kernel::critical::CriticalSection;
use crate::kernel::cs_cell::CsCell;
use crate::kernel::task::Tcb;
use crate::kernel::types::{FpuMode, StackWord, Tick};
use crate::port;

// ============ Kernel Flags ============

/// Atomic kernel flags
pub struct KernelFlags {
    running: AtomicBool,
    scheduler_enabled: AtomicBool,
    tick_counter: AtomicU32,
}

impl KernelFlags {
    const fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            scheduler_enabled: AtomicBool::new(false),
            tick_counter: AtomicU32::new(0),
        }
    }

    /// Check if multitasking has been started
    #[inline(always)]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Check if the tick handler may reschedule
    #[inline(always)]
    pub fn scheduler_enabled(&self) -> bool {
        self.scheduler_enabled.load(Ordering::Acquire)
    }

    /// Get the monotonic tick count
    #[inline(always)]
    pub fn tick_get(&self) -> Tick {
        self.tick_counter.load(Ordering::Relaxed)
    }

    /// Advance the monotonic tick count
    #[inline(always)]
    pub(crate) fn tick_increment(&self) -> Tick {
        self.tick_counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    #[inline(always)]
    pub(crate) fn set_running(&self, val: bool) {
        self.running.store(val, Ordering::Release);
    }

    #[inline(always)]
    pub(crate) fn set_scheduler_enabled(&self, val: bool) {
        self.scheduler_enabled.store(val, Ordering::Release);
    }
}

/// Global kernel flags instance
pub(crate) static KERNEL: KernelFlags = KernelFlags::new();

// ============ Tick Quantum State ============

/// Quantum sub-counter, touched only by the tick handler
pub(crate) struct TickState {
    /// Ticks between forced reschedules
    pub quantum: Tick,
    /// Ticks elapsed since the last reschedule
    pub counter: Tick,
}

pub(crate) static TICK: CsCell<TickState> = CsCell::new(TickState {
    quantum: DEFAULT_QUANTUM_TICKS,
    counter: 0,
});

// ============ CPU State ============

/// Run and idle pointers into the task ring
struct CpuState {
    run: AtomicPtr<Tcb>,
    idle: AtomicPtr<Tcb>,
}

static CPU: CpuState = CpuState {
    run: AtomicPtr::new(ptr::null_mut()),
    idle: AtomicPtr::new(ptr::null_mut()),
};

/// Currently running task, if the ring exists yet
#[inline]
pub(crate) fn current_task() -> Option<NonNull<Tcb>> {
    NonNull::new(CPU.run.load(Ordering::Relaxed))
}

/// Publish the new running task
#[inline]
#[allow(dead_code)]
pub(crate) fn set_current(tcb: NonNull<Tcb>) {
    CPU.run.store(tcb.as_ptr(), Ordering::Relaxed);
}

/// The built-in idle task, if the ring exists yet
#[inline]
#[allow(dead_code)]
pub(crate) fn idle_task() -> Option<NonNull<Tcb>> {
    NonNull::new(CPU.idle.load(Ordering::Relaxed))
}

// ============ Idle Task ============

static mut IDLE_TCB: Tcb = Tcb::new();
static mut IDLE_STACK: [StackWord; IDLE_STACK_WORDS] = [0; IDLE_STACK_WORDS];

/// Built-in lowest-priority task; runs when nothing else is runnable
fn idle_entry() -> ! {
    loop {
        #[cfg(target_arch = "arm")]
        cortex_m::asm::nop();
        #[cfg(not(target_arch = "arm"))]
        core::hint::spin_loop();
    }
}

/// Root the ring at the idle task on first use.
///
/// Caller must hold the critical section. Safe to call repeatedly; only
/// the first call does anything.
pub(crate) fn ensure_idle() {
    if current_task().is_some() {
        return;
    }

    unsafe {
        let idle = &raw mut IDLE_TCB;
        let stack = core::slice::from_raw_parts_mut(
            (&raw mut IDLE_STACK) as *mut StackWord,
            IDLE_STACK_WORDS,
        );

        (*idle).stk_ptr = port::frame::os_task_stk_init(idle_entry, stack, FpuMode::NoFpu);
        (*idle).next = Some(NonNull::new_unchecked(idle));

        CPU.idle.store(idle, Ordering::Relaxed);
        CPU.run.store(idle, Ordering::Relaxed);
    }
}

// ============ Startup ============

/// Initialize the kernel and start multitasking. Never returns.
///
/// `quantum_ms` is the scheduling quantum in tick periods; 0 selects the
/// default of one tick. Tasks may be created before or after this call,
/// but at least the idle task always exists, so a system started with no
/// user tasks simply idles.
pub fn os_init(quantum_ms: u32) -> ! {
    {
        let cs = CriticalSection::enter();

        ensure_idle();

        let tick = TICK.get(&cs);
        tick.quantum = if quantum_ms == 0 {
            DEFAULT_QUANTUM_TICKS
        } else {
            quantum_ms
        };
        tick.counter = 0;

        KERNEL.set_scheduler_enabled(true);
        KERNEL.set_running(true);
    }

    crate::info!("kernel start");

    unsafe { port::os_start_first() }
}
