//! Scheduler
//!
//! Priority-based round-robin selection over the circular task ring, plus
//! the block/unblock protocol shared by the synchronization primitives.
//!
//! Both ring walks are written against an explicit start pointer so they
//! can be exercised directly on a hand-built ring.

use core::ptr::NonNull;

use crate::kernel::state;
use crate::kernel::task::Tcb;
use crate::kernel::types::{WaitState, WaitToken};

/// Successor of a ring node
#[inline]
pub(crate) fn next_of(tcb: NonNull<Tcb>) -> NonNull<Tcb> {
    unsafe { tcb.as_ref().next.unwrap_or(tcb) }
}

/// Select the next task to run.
///
/// One pass over the ring. The walk starts just after the running task
/// (or after the idle task when the running task is no longer eligible)
/// and a visited task replaces the best seen so far when its priority is
/// greater *or equal*, which rotates the pick among equal-priority tasks.
///
/// # Safety
/// `run` and `idle` must be members of a well-formed ring and interrupts
/// must be masked.
pub(crate) unsafe fn select_next(run: NonNull<Tcb>, idle: NonNull<Tcb>) -> NonNull<Tcb> {
    let start = if unsafe { run.as_ref() }.is_runnable() {
        run
    } else {
        idle
    };

    let mut best = start;
    let mut cur = next_of(start);

    while cur != run {
        let t = unsafe { cur.as_ref() };
        if t.is_runnable() && t.priority >= unsafe { best.as_ref() }.priority {
            best = cur;
        }
        cur = next_of(cur);
    }

    best
}

/// Find the waiter to wake for `token`.
///
/// One pass over the ring, excluding the running task. The
/// highest-priority waiter wins; on a tie the one encountered first in
/// ring order is kept.
///
/// # Safety
/// `run` must be a member of a well-formed ring and interrupts must be
/// masked.
pub(crate) unsafe fn pick_waiter(run: NonNull<Tcb>, token: WaitToken) -> Option<NonNull<Tcb>> {
    let mut best: Option<NonNull<Tcb>> = None;
    let mut cur = next_of(run);

    while cur != run {
        let t = unsafe { cur.as_ref() };
        if t.wait == WaitState::Object(token) {
            let better = match best {
                None => true,
                Some(b) => t.priority > unsafe { b.as_ref() }.priority,
            };
            if better {
                best = Some(cur);
            }
        }
        cur = next_of(cur);
    }

    best
}

/// Run the scheduler and publish the new running task.
///
/// Called from the context-switch glue with interrupts masked.
#[allow(dead_code)]
pub(crate) fn reschedule() -> Option<NonNull<Tcb>> {
    let run = state::current_task()?;
    let idle = state::idle_task()?;

    let next = unsafe { select_next(run, idle) };
    state::set_current(next);
    Some(next)
}

/// Park the running task on `token`.
///
/// Caller must hold the critical section and pend a context switch after
/// releasing it.
pub(crate) fn block_current_on(token: WaitToken) {
    if let Some(mut run) = state::current_task() {
        unsafe { run.as_mut() }.wait = WaitState::Object(token);
    }
}

/// Wake the single best waiter parked on `token`.
///
/// Returns true when the woken task outranks the running task, in which
/// case the caller must pend a context switch once it has released the
/// critical section so the wake is honored promptly. Caller must hold the
/// critical section.
pub(crate) fn unblock(token: WaitToken) -> bool {
    let Some(run) = state::current_task() else {
        return false;
    };

    match unsafe { pick_waiter(run, token) } {
        Some(mut woken) => {
            let woken = unsafe { woken.as_mut() };
            woken.wait = WaitState::None;
            woken.priority > unsafe { run.as_ref() }.priority
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::types::Priority;
    use alloc::boxed::Box;
    use alloc::vec::Vec;

    fn node(priority: Priority) -> NonNull<Tcb> {
        let mut tcb = Tcb::new();
        tcb.priority = priority;
        NonNull::from(Box::leak(Box::new(tcb)))
    }

    fn link_ring(nodes: &[NonNull<Tcb>]) {
        for (i, &n) in nodes.iter().enumerate() {
            let next = nodes[(i + 1) % nodes.len()];
            unsafe { (*n.as_ptr()).next = Some(next) };
        }
    }

    fn ring(prios: &[Priority]) -> Vec<NonNull<Tcb>> {
        let nodes: Vec<_> = prios.iter().map(|&p| node(p)).collect();
        link_ring(&nodes);
        nodes
    }

    #[test]
    fn higher_priority_always_wins() {
        // idle, L, H, M
        let r = ring(&[
            Priority::Idle,
            Priority::Low,
            Priority::High,
            Priority::Medium,
        ]);
        for &start in &r {
            let picked = unsafe { select_next(start, r[0]) };
            assert_eq!(picked, r[2]);
        }
    }

    #[test]
    fn selection_is_deterministic() {
        let r = ring(&[Priority::Idle, Priority::Medium, Priority::Medium]);
        let a = unsafe { select_next(r[1], r[0]) };
        let b = unsafe { select_next(r[1], r[0]) };
        assert_eq!(a, b);
    }

    #[test]
    fn equal_priorities_rotate() {
        let r = ring(&[Priority::Idle, Priority::Medium, Priority::Medium]);
        let first = unsafe { select_next(r[1], r[0]) };
        assert_eq!(first, r[2]);
        let second = unsafe { select_next(first, r[0]) };
        assert_eq!(second, r[1]);
        let third = unsafe { select_next(second, r[0]) };
        assert_eq!(third, r[2]);
    }

    #[test]
    fn idle_wins_when_everything_is_parked() {
        let r = ring(&[Priority::Idle, Priority::Low, Priority::High]);
        unsafe {
            (*r[1].as_ptr()).wait = WaitState::Timed;
            (*r[2].as_ptr()).paused = true;
        }
        // running task r[2] is paused, so the walk restarts at idle
        let picked = unsafe { select_next(r[2], r[0]) };
        assert_eq!(picked, r[0]);
    }

    #[test]
    fn parked_and_paused_tasks_are_skipped() {
        let r = ring(&[
            Priority::Idle,
            Priority::Low,
            Priority::High,
            Priority::Medium,
        ]);
        unsafe {
            (*r[2].as_ptr()).paused = true;
        }
        let picked = unsafe { select_next(r[1], r[0]) };
        assert_eq!(picked, r[3]);
    }

    #[test]
    fn wakes_highest_priority_waiter() {
        let r = ring(&[
            Priority::Idle,
            Priority::Low,
            Priority::High,
            Priority::Medium,
        ]);
        let sem = 0u32;
        let token = WaitToken::of(&sem);
        unsafe {
            (*r[1].as_ptr()).wait = WaitState::Object(token);
            (*r[2].as_ptr()).wait = WaitState::Object(token);
            (*r[3].as_ptr()).wait = WaitState::Object(token);
        }
        let picked = unsafe { pick_waiter(r[0], token) };
        assert_eq!(picked, Some(r[2]));
    }

    #[test]
    fn first_waiter_wins_priority_ties() {
        let r = ring(&[
            Priority::Idle,
            Priority::Medium,
            Priority::Medium,
            Priority::Medium,
        ]);
        let sem = 0u32;
        let token = WaitToken::of(&sem);
        unsafe {
            (*r[2].as_ptr()).wait = WaitState::Object(token);
            (*r[3].as_ptr()).wait = WaitState::Object(token);
        }
        // walk starts at r[1], so r[2] is encountered first
        let picked = unsafe { pick_waiter(r[0], token) };
        assert_eq!(picked, Some(r[2]));
    }

    #[test]
    fn tokens_partition_waiters() {
        let r = ring(&[Priority::Idle, Priority::Low, Priority::High]);
        let sem_a = 0u32;
        let sem_b = 0u32;
        let token_a = WaitToken::of(&sem_a);
        let token_b = WaitToken::of(&sem_b);
        unsafe {
            (*r[1].as_ptr()).wait = WaitState::Object(token_a);
            (*r[2].as_ptr()).wait = WaitState::Object(token_b);
        }
        assert_eq!(unsafe { pick_waiter(r[0], token_a) }, Some(r[1]));
        assert_eq!(unsafe { pick_waiter(r[0], token_b) }, Some(r[2]));
    }

    #[test]
    fn no_waiter_means_no_wake() {
        let r = ring(&[Priority::Idle, Priority::Low]);
        let sem = 0u32;
        let token = WaitToken::of(&sem);
        assert_eq!(unsafe { pick_waiter(r[0], token) }, None);
    }
}
