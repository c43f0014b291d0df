//! Heartbeat demo: delays plus pause/resume
//!
//! A heartbeat task ticks twice a second. A supervisor pauses it for two
//! seconds out of every ten, demonstrating that a paused task keeps its
//! remaining delay.

#![cfg_attr(target_arch = "arm", no_std)]
#![cfg_attr(target_arch = "arm", no_main)]

#[cfg(target_arch = "arm")]
mod demo {
    use core::ptr::addr_of_mut;
    use core::sync::atomic::{AtomicU32, Ordering};

    use cortex_m_rt::entry;
    use embedded_alloc::LlffHeap as Heap;

    use ringos::{os_delay, os_init, os_pause, os_resume, os_thread_new};
    use ringos::{FpuMode, Priority, TaskId};

    #[global_allocator]
    static HEAP: Heap = Heap::empty();

    static mut HEAP_MEM: [u8; 8192] = [0; 8192];

    static BEATS: AtomicU32 = AtomicU32::new(0);
    static mut HEARTBEAT: Option<TaskId> = None;

    fn heartbeat() -> ! {
        loop {
            let n = BEATS.fetch_add(1, Ordering::Relaxed) + 1;
            ringos::info!("beat {}", n);
            let _ = os_delay(500);
        }
    }

    fn supervisor() -> ! {
        let beat_task = unsafe { (*addr_of_mut!(HEARTBEAT)).unwrap() };
        loop {
            let _ = os_delay(8_000);
            ringos::info!("pausing heartbeat");
            let _ = os_pause(beat_task);
            let _ = os_delay(2_000);
            ringos::info!("resuming heartbeat");
            let _ = os_resume(beat_task);
        }
    }

    #[entry]
    fn main() -> ! {
        unsafe {
            HEAP.init(addr_of_mut!(HEAP_MEM) as usize, 8192);
        }

        let beat = os_thread_new(heartbeat, Priority::Medium, None, 256, FpuMode::NoFpu)
            .expect("heartbeat creation failed");
        unsafe { *addr_of_mut!(HEARTBEAT) = Some(beat) };

        os_thread_new(supervisor, Priority::Medium, None, 256, FpuMode::NoFpu)
            .expect("supervisor creation failed");

        os_init(1)
    }
}

#[cfg(not(target_arch = "arm"))]
fn main() {}
