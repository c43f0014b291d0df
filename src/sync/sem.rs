//! Counting semaphore
//!
//! Created with an initial count that is also its ceiling. Acquiring
//! takes a permit or parks the caller on the semaphore's identity;
//! releasing returns a permit and wakes the best waiter. Releasing at the
//! ceiling is rejected, which keeps spurious release storms from
//! inflating the count.

use core::cell::UnsafeCell;

use crate::kernel::critical::{is_isr_context, CriticalSection};
use crate::kernel::error::{OsError, OsResult};
use crate::kernel::heap;
use crate::kernel::sched;
use crate::kernel::types::{SemCount, WaitToken};
use crate::port;

/// Semaphore counter state
///
/// Pure count bookkeeping; the blocking behavior lives in [`Semaphore`].
pub struct RawSem {
    count: SemCount,
    max_count: SemCount,
}

impl RawSem {
    pub const fn new(count: SemCount) -> Self {
        RawSem {
            count,
            max_count: count,
        }
    }

    /// Take a permit if one is available
    pub fn try_acquire(&mut self) -> bool {
        if self.count > 0 {
            self.count -= 1;
            true
        } else {
            false
        }
    }

    /// Return a permit unless the count is already at the ceiling
    pub fn try_release(&mut self) -> bool {
        if self.count >= self.max_count {
            false
        } else {
            self.count += 1;
            true
        }
    }

    #[inline]
    pub fn count(&self) -> SemCount {
        self.count
    }

    #[inline]
    pub fn max_count(&self) -> SemCount {
        self.max_count
    }
}

/// Counting semaphore
///
/// Usable from a `static` or from the handle returned by
/// [`Semaphore::create`]. The semaphore's address is its identity, so it
/// must not move while tasks wait on it; both supported placements
/// guarantee that.
pub struct Semaphore {
    inner: UnsafeCell<RawSem>,
}

// SAFETY: the inner state is only touched under the kernel critical
// section.
unsafe impl Send for Semaphore {}
unsafe impl Sync for Semaphore {}

impl Semaphore {
    /// Create a semaphore with `count` initial permits (also the ceiling)
    pub const fn new(count: SemCount) -> Self {
        Semaphore {
            inner: UnsafeCell::new(RawSem::new(count)),
        }
    }

    /// Allocate a semaphore and return a handle valid forever
    pub fn create(count: SemCount) -> OsResult<&'static Semaphore> {
        let sem: &'static mut Semaphore = heap::try_leak(Semaphore::new(count))?;
        Ok(sem)
    }

    #[inline]
    fn token(&self) -> WaitToken {
        WaitToken::of(self)
    }

    /// Current number of permits
    #[inline]
    pub fn count(&self) -> SemCount {
        let _cs = CriticalSection::enter();
        unsafe { &*self.inner.get() }.count()
    }

    /// Take a permit without blocking.
    ///
    /// Returns `Err(WouldBlock)` when no permit is available.
    pub fn try_acquire(&self) -> OsResult<()> {
        let _cs = CriticalSection::enter();

        if unsafe { &mut *self.inner.get() }.try_acquire() {
            Ok(())
        } else {
            Err(OsError::WouldBlock)
        }
    }

    /// Take a permit, blocking until one is available.
    ///
    /// Waiting is unbounded. After a wake the permit is re-checked;
    /// another task may have taken it first, in which case the caller
    /// keeps yielding until it wins. Task context only.
    pub fn acquire(&self) -> OsResult<()> {
        if is_isr_context() {
            return Err(OsError::IsrContext);
        }

        {
            let _cs = CriticalSection::enter();

            if unsafe { &mut *self.inner.get() }.try_acquire() {
                return Ok(());
            }
            sched::block_current_on(self.token());
        }

        port::os_ctx_sw();

        loop {
            {
                let _cs = CriticalSection::enter();
                if unsafe { &mut *self.inner.get() }.try_acquire() {
                    return Ok(());
                }
            }
            port::os_ctx_sw();
        }
    }

    /// Return a permit and wake the best waiter.
    ///
    /// Fails with `SemOverflow` when the count is already at its ceiling,
    /// leaving the count unchanged. Callable from tasks and interrupts.
    pub fn release(&self) -> OsResult<()> {
        let preempt;
        {
            let _cs = CriticalSection::enter();

            if !unsafe { &mut *self.inner.get() }.try_release() {
                return Err(OsError::SemOverflow);
            }
            preempt = sched::unblock(self.token());
        }

        if preempt {
            port::os_ctx_sw();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_starts_at_ceiling() {
        let s = RawSem::new(3);
        assert_eq!(s.count(), 3);
        assert_eq!(s.max_count(), 3);
    }

    #[test]
    fn acquire_drains_to_zero() {
        let mut s = RawSem::new(2);
        assert!(s.try_acquire());
        assert!(s.try_acquire());
        assert!(!s.try_acquire());
        assert_eq!(s.count(), 0);
    }

    #[test]
    fn release_at_ceiling_is_rejected() {
        let mut s = RawSem::new(1);
        assert!(!s.try_release());
        assert_eq!(s.count(), 1);

        assert!(s.try_acquire());
        assert!(s.try_release());
        assert!(!s.try_release());
        assert_eq!(s.count(), 1);
    }

    #[test]
    fn count_stays_in_bounds() {
        let mut s = RawSem::new(4);
        // arbitrary interleaving of takes and puts
        for step in 0..1000u32 {
            if step % 3 == 0 {
                s.try_release();
            } else {
                s.try_acquire();
            }
            assert!(s.count() <= s.max_count());
        }
    }

    #[test]
    fn zero_count_semaphore_blocks_immediately() {
        let mut s = RawSem::new(0);
        assert!(!s.try_acquire());
        // a release makes exactly one acquire succeed
        assert!(s.try_release());
        assert!(s.try_acquire());
        assert!(!s.try_acquire());
    }
}
