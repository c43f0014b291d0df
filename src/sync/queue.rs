//! Bounded message queue
//!
//! Fixed-capacity FIFO of equally sized items over a flat byte buffer.
//! The tail index is where the next item is stored, the head is the next
//! item out; both wrap modulo the capacity. Put and get block when the
//! queue is full or empty, or fail fast in non-blocking mode, which is
//! the only mode allowed from interrupt context.

use core::cell::UnsafeCell;

use crate::kernel::critical::{is_isr_context, CriticalSection};
use crate::kernel::error::{OsError, OsResult};
use crate::kernel::heap;
use crate::kernel::sched;
use crate::kernel::types::{BlockMode, WaitToken};
use crate::port;

/// Ring buffer state
///
/// Pure index bookkeeping; the blocking behavior lives in [`Queue`].
pub struct RawQueue {
    buffer: &'static mut [u8],
    head: usize,
    tail: usize,
    count: usize,
    capacity: usize,
    item_size: usize,
}

impl RawQueue {
    /// Wrap a buffer of `capacity * item_size` bytes
    pub fn new(buffer: &'static mut [u8], capacity: usize, item_size: usize) -> Self {
        debug_assert_eq!(buffer.len(), capacity * item_size);
        RawQueue {
            buffer,
            head: 0,
            tail: 0,
            count: 0,
            capacity,
            item_size,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.count == self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn item_size(&self) -> usize {
        self.item_size
    }

    /// Store one item at the tail if there is room
    pub fn try_put(&mut self, item: &[u8]) -> bool {
        if self.is_full() {
            return false;
        }

        let off = self.tail * self.item_size;
        self.buffer[off..off + self.item_size].copy_from_slice(item);
        self.tail = (self.tail + 1) % self.capacity;
        self.count += 1;
        true
    }

    /// Copy one item out from the head if any is stored
    pub fn try_get(&mut self, out: &mut [u8]) -> bool {
        if self.is_empty() {
            return false;
        }

        let off = self.head * self.item_size;
        out.copy_from_slice(&self.buffer[off..off + self.item_size]);
        self.head = (self.head + 1) % self.capacity;
        self.count -= 1;
        true
    }
}

/// Bounded FIFO message queue
///
/// The queue's address is its identity; `create` leaks it so the
/// identity is stable for the lifetime of the system.
pub struct Queue {
    inner: UnsafeCell<RawQueue>,
}

impl core::fmt::Debug for Queue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Queue").field("addr", &(self as *const _)).finish()
    }
}

// SAFETY: the inner state is only touched under the kernel critical
// section.
unsafe impl Send for Queue {}
unsafe impl Sync for Queue {}

impl Queue {
    /// Allocate a queue of `capacity` slots of `item_size` bytes each
    pub fn create(capacity: usize, item_size: usize) -> OsResult<&'static Queue> {
        if capacity == 0 || item_size == 0 {
            return Err(OsError::InvalidSize);
        }
        let bytes = capacity
            .checked_mul(item_size)
            .ok_or(OsError::InvalidSize)?;

        let buffer = heap::try_leak_slice(0u8, bytes)?;
        let queue: &'static mut Queue = heap::try_leak(Queue {
            inner: UnsafeCell::new(RawQueue::new(buffer, capacity, item_size)),
        })?;
        Ok(queue)
    }

    #[inline]
    fn token(&self) -> WaitToken {
        WaitToken::of(self)
    }

    /// Number of items currently stored
    #[inline]
    pub fn len(&self) -> usize {
        let _cs = CriticalSection::enter();
        unsafe { &*self.inner.get() }.len()
    }

    /// True when nothing is stored
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots
    #[inline]
    pub fn capacity(&self) -> usize {
        unsafe { &*self.inner.get() }.capacity()
    }

    /// Size of one item in bytes
    #[inline]
    pub fn item_size(&self) -> usize {
        unsafe { &*self.inner.get() }.item_size()
    }

    /// Enqueue one item.
    ///
    /// `item` must be exactly `item_size` bytes. When the queue is full,
    /// `BlockMode::Block` parks the caller until a slot frees up and
    /// `BlockMode::NoBlock` fails with `WouldBlock`. A successful put
    /// wakes one task waiting on this queue. Non-blocking mode is safe
    /// from interrupt context.
    pub fn put(&self, item: &[u8], mode: BlockMode) -> OsResult<()> {
        if item.len() != self.item_size() {
            return Err(OsError::ItemSizeMismatch);
        }
        if mode == BlockMode::Block && is_isr_context() {
            return Err(OsError::IsrContext);
        }

        {
            let cs = CriticalSection::enter();

            let raw = unsafe { &mut *self.inner.get() };
            if raw.try_put(item) {
                let preempt = sched::unblock(self.token());
                drop(cs);
                if preempt {
                    port::os_ctx_sw();
                }
                return Ok(());
            }

            if mode == BlockMode::NoBlock {
                return Err(OsError::WouldBlock);
            }

            sched::block_current_on(self.token());
        }

        port::os_ctx_sw();

        loop {
            {
                let cs = CriticalSection::enter();

                let raw = unsafe { &mut *self.inner.get() };
                if raw.try_put(item) {
                    let preempt = sched::unblock(self.token());
                    drop(cs);
                    if preempt {
                        port::os_ctx_sw();
                    }
                    return Ok(());
                }
            }
            port::os_ctx_sw();
        }
    }

    /// Dequeue one item into `out`.
    ///
    /// `out` must be exactly `item_size` bytes. When the queue is empty,
    /// `BlockMode::Block` parks the caller until an item arrives and
    /// `BlockMode::NoBlock` fails with `WouldBlock`. A successful get
    /// wakes one task waiting on this queue. Non-blocking mode is safe
    /// from interrupt context.
    pub fn get(&self, out: &mut [u8], mode: BlockMode) -> OsResult<()> {
        if out.len() != self.item_size() {
            return Err(OsError::ItemSizeMismatch);
        }
        if mode == BlockMode::Block && is_isr_context() {
            return Err(OsError::IsrContext);
        }

        {
            let cs = CriticalSection::enter();

            let raw = unsafe { &mut *self.inner.get() };
            if raw.try_get(out) {
                let preempt = sched::unblock(self.token());
                drop(cs);
                if preempt {
                    port::os_ctx_sw();
                }
                return Ok(());
            }

            if mode == BlockMode::NoBlock {
                return Err(OsError::WouldBlock);
            }

            sched::block_current_on(self.token());
        }

        port::os_ctx_sw();

        loop {
            {
                let cs = CriticalSection::enter();

                let raw = unsafe { &mut *self.inner.get() };
                if raw.try_get(out) {
                    let preempt = sched::unblock(self.token());
                    drop(cs);
                    if preempt {
                        port::os_ctx_sw();
                    }
                    return Ok(());
                }
            }
            port::os_ctx_sw();
        }
    }
}
