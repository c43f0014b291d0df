//! Producer-Consumer demo over a bounded queue
//!
//! One producer at medium priority feeds a two-slot queue; one consumer
//! at low priority drains it. The producer blocks whenever it runs two
//! items ahead.

#![cfg_attr(target_arch = "arm", no_std)]
#![cfg_attr(target_arch = "arm", no_main)]

#[cfg(target_arch = "arm")]
mod demo {
    use core::ptr::addr_of_mut;

    use cortex_m_rt::entry;
    use embedded_alloc::LlffHeap as Heap;

    use ringos::{os_delay, os_init, os_thread_new};
    use ringos::{BlockMode, FpuMode, Priority, Queue};

    #[global_allocator]
    static HEAP: Heap = Heap::empty();

    static mut HEAP_MEM: [u8; 8192] = [0; 8192];

    static mut QUEUE: Option<&'static Queue> = None;

    fn producer() -> ! {
        let queue = unsafe { (*addr_of_mut!(QUEUE)).unwrap() };
        let mut seq: u32 = 0;
        loop {
            seq = seq.wrapping_add(1);
            let _ = queue.put(&seq.to_le_bytes(), BlockMode::Block);
            ringos::info!("produced {}", seq);
            let _ = os_delay(100);
        }
    }

    fn consumer() -> ! {
        let queue = unsafe { (*addr_of_mut!(QUEUE)).unwrap() };
        let mut item = [0u8; 4];
        loop {
            let _ = queue.get(&mut item, BlockMode::Block);
            ringos::info!("consumed {}", u32::from_le_bytes(item));
            let _ = os_delay(250);
        }
    }

    #[entry]
    fn main() -> ! {
        unsafe {
            HEAP.init(addr_of_mut!(HEAP_MEM) as usize, 8192);
        }

        let queue = Queue::create(2, 4).expect("queue creation failed");
        unsafe { *addr_of_mut!(QUEUE) = Some(queue) };

        os_thread_new(producer, Priority::Medium, None, 256, FpuMode::NoFpu)
            .expect("producer creation failed");
        os_thread_new(consumer, Priority::Low, None, 256, FpuMode::NoFpu)
            .expect("consumer creation failed");

        os_init(1)
    }
}

#[cfg(not(target_arch = "arm"))]
fn main() {}
