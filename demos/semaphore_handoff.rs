//! Semaphore handoff across priorities
//!
//! A high-priority task parks on an empty semaphore; a low-priority
//! worker releases it once per loop. Each release preempts the worker
//! immediately in favor of the waiter.

#![cfg_attr(target_arch = "arm", no_std)]
#![cfg_attr(target_arch = "arm", no_main)]

#[cfg(target_arch = "arm")]
mod demo {
    use core::ptr::addr_of_mut;
    use core::sync::atomic::{AtomicU32, Ordering};

    use cortex_m_rt::entry;
    use embedded_alloc::LlffHeap as Heap;

    use ringos::{os_delay, os_init, os_thread_new};
    use ringos::{FpuMode, Priority, Semaphore};

    #[global_allocator]
    static HEAP: Heap = Heap::empty();

    static mut HEAP_MEM: [u8; 8192] = [0; 8192];

    static SEM: Semaphore = Semaphore::new(0);
    static HANDOFFS: AtomicU32 = AtomicU32::new(0);

    fn waiter() -> ! {
        loop {
            let _ = SEM.acquire();
            let n = HANDOFFS.fetch_add(1, Ordering::Relaxed) + 1;
            ringos::info!("handoff #{}", n);
        }
    }

    fn worker() -> ! {
        loop {
            // burn some time at low priority, then hand over
            for _ in 0..10_000 {
                cortex_m::asm::nop();
            }
            let _ = SEM.release();
            let _ = os_delay(50);
        }
    }

    #[entry]
    fn main() -> ! {
        unsafe {
            HEAP.init(addr_of_mut!(HEAP_MEM) as usize, 8192);
        }

        os_thread_new(waiter, Priority::High, None, 256, FpuMode::NoFpu)
            .expect("waiter creation failed");
        os_thread_new(worker, Priority::Low, None, 256, FpuMode::NoFpu)
            .expect("worker creation failed");

        os_init(1)
    }
}

#[cfg(not(target_arch = "arm"))]
fn main() {}
