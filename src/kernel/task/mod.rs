//! Task management
//!
//! Task creation and the lifecycle operations available to running code:
//! delay, pause, resume and voluntary yield.

mod tcb;

pub use tcb::Tcb;

use core::ptr::NonNull;

use crate::kernel::config::MIN_STACK_WORDS;
use crate::kernel::critical::{CriticalSection, is_isr_context};
use crate::kernel::error::{OsError, OsResult};
use crate::kernel::heap;
use crate::kernel::sched;
use crate::kernel::state;
use crate::kernel::types::{FpuMode, Priority, StackWord, WaitState};
use crate::port;

/// Task entry point function type
pub type TaskFn = fn() -> !;

/// Stable opaque handle to a created task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskId(pub(crate) NonNull<Tcb>);

// SAFETY: the TCB behind the handle is only mutated under the kernel
// critical section.
unsafe impl Send for TaskId {}
unsafe impl Sync for TaskId {}

/// Create a new task and append it to the ring.
///
/// The TCB is always heap-allocated. `stack` may be caller-provided
/// static memory; pass `None` to have a stack of `stack_words` words
/// allocated. Either way the stack must hold at least
/// [`MIN_STACK_WORDS`] words.
///
/// A task that executes floating-point instructions must be created with
/// [`FpuMode::Fpu`] so its saved frame reserves the FP register banks;
/// this cannot be checked here.
///
/// The new task starts runnable and not paused. Creation is allowed
/// before `os_init` and from task context, not from interrupts.
pub fn os_thread_new(
    entry: TaskFn,
    priority: Priority,
    stack: Option<&'static mut [StackWord]>,
    stack_words: usize,
    fpu: FpuMode,
) -> OsResult<TaskId> {
    if is_isr_context() {
        return Err(OsError::IsrContext);
    }

    let words = stack.as_ref().map_or(stack_words, |s| s.len());
    if words < MIN_STACK_WORDS {
        return Err(OsError::StackTooSmall);
    }

    let stack: &'static mut [StackWord] = match stack {
        Some(s) => s,
        None => heap::try_leak_slice(0, words)?,
    };

    let mut tcb = Tcb::new();
    tcb.priority = priority;
    tcb.stk_ptr = port::frame::os_task_stk_init(entry, stack, fpu);

    let tcb = heap::try_leak(tcb)?;
    let tcb = unsafe { NonNull::new_unchecked(tcb as *mut Tcb) };

    {
        let _cs = CriticalSection::enter();

        state::ensure_idle();

        // Insert just before the running task, i.e. at the ring tail,
        // so creation order is preserved in walk order.
        if let Some(run) = state::current_task() {
            let mut tail = run;
            while sched::next_of(tail) != run {
                tail = sched::next_of(tail);
            }
            unsafe {
                (*tcb.as_ptr()).next = Some(run);
                (*tail.as_ptr()).next = Some(tcb);
            }
        }
    }

    crate::trace!("task created, prio {}", priority as u8);

    Ok(TaskId(tcb))
}

/// Suspend the running task for `ms` milliseconds.
///
/// A zero delay is treated as one tick. The task becomes runnable again
/// once the tick handler has counted the delay down, and resumes right
/// after this call.
pub fn os_delay(ms: u32) -> OsResult<()> {
    if is_isr_context() {
        return Err(OsError::IsrContext);
    }

    {
        let _cs = CriticalSection::enter();

        let ms = if ms == 0 { 1 } else { ms };
        if let Some(mut run) = state::current_task() {
            let run = unsafe { run.as_mut() };
            run.wait = WaitState::Timed;
            run.timeout = ms;
        }
    }

    port::os_ctx_sw();
    Ok(())
}

/// Pause a task, keeping it off the CPU until resumed.
///
/// Pausing composes with any wait state the task is in. Pausing the
/// running task takes effect immediately; the call returns after the
/// task is resumed and scheduled again. Callable from tasks and
/// interrupts.
pub fn os_pause(task: TaskId) -> OsResult<()> {
    let is_current;
    {
        let _cs = CriticalSection::enter();

        let tcb = unsafe { &mut *task.0.as_ptr() };
        if tcb.priority == Priority::Idle {
            return Err(OsError::IdleTask);
        }
        if tcb.paused {
            return Err(OsError::AlreadyPaused);
        }

        tcb.paused = true;
        is_current = state::current_task() == Some(task.0);
    }

    if is_current {
        port::os_ctx_sw();
    }
    Ok(())
}

/// Resume a previously paused task.
///
/// Clears the paused flag only; the resumed task is next considered at
/// the following tick or synchronization event, even if it outranks the
/// caller.
pub fn os_resume(task: TaskId) -> OsResult<()> {
    let _cs = CriticalSection::enter();

    let tcb = unsafe { &mut *task.0.as_ptr() };
    if !tcb.paused {
        return Err(OsError::NotPaused);
    }

    tcb.paused = false;
    Ok(())
}

/// Give up the rest of the current quantum.
///
/// Requests a reschedule; with no higher- or equal-priority work ready
/// the caller continues immediately. No-op in interrupt context.
pub fn os_yield() {
    if is_isr_context() {
        return;
    }
    port::os_ctx_sw();
}
