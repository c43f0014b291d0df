//! Unit tests for core kernel modules
//!
//! These run on the host (not the embedded target) against the public
//! surface. The port stub stands in for the context-switch trampoline
//! and counts switch requests.

#[cfg(test)]
mod types_tests {
    use ringos::types::*;

    #[test]
    fn priorities_are_ordered() {
        assert!(Priority::Idle < Priority::Low);
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
    }

    #[test]
    fn priority_discriminants() {
        assert_eq!(Priority::Idle as u8, 0);
        assert_eq!(Priority::High as u8, 3);
    }

    #[test]
    fn wait_tokens_follow_identity() {
        let a = 0u32;
        let b = 0u32;
        let ta = WaitToken::of(&a);
        let tb = WaitToken::of(&b);
        assert_eq!(ta, WaitToken::of(&a));
        assert_ne!(ta, tb);
    }
}

#[cfg(test)]
mod error_tests {
    use ringos::OsError;

    #[test]
    fn would_block_is_distinguishable() {
        assert!(OsError::WouldBlock.is_would_block());
        assert!(!OsError::SemOverflow.is_would_block());
        assert_ne!(OsError::WouldBlock, OsError::OutOfMemory);
    }

    #[test]
    fn errors_format_for_debugging() {
        let err = OsError::StackTooSmall;
        let _ = format!("{:?}", err);
    }
}

#[cfg(test)]
mod config_tests {
    use ringos::config::*;

    #[test]
    fn config_values_are_sane() {
        assert_eq!(TICK_RATE_HZ, 1_000, "tick period contract is 1 ms");
        assert!(MIN_STACK_WORDS >= 64);
        assert!(DEFAULT_QUANTUM_TICKS >= 1);
        assert!(IDLE_STACK_WORDS >= MIN_STACK_WORDS);
    }
}

#[cfg(test)]
mod sem_tests {
    use ringos::{OsError, Semaphore};

    #[test]
    fn new_semaphore_holds_its_initial_count() {
        let sem = Semaphore::new(3);
        assert_eq!(sem.count(), 3);
    }

    #[test]
    fn create_returns_a_static_handle() {
        let sem = Semaphore::create(2).unwrap();
        assert_eq!(sem.count(), 2);
    }

    #[test]
    fn try_acquire_drains_then_blocks() {
        let sem = Semaphore::new(2);
        assert_eq!(sem.try_acquire(), Ok(()));
        assert_eq!(sem.try_acquire(), Ok(()));
        assert_eq!(sem.try_acquire(), Err(OsError::WouldBlock));
        assert_eq!(sem.count(), 0);
    }

    #[test]
    fn release_above_ceiling_is_an_error() {
        let sem = Semaphore::new(1);
        assert_eq!(sem.release(), Err(OsError::SemOverflow));
        assert_eq!(sem.count(), 1);

        sem.try_acquire().unwrap();
        assert_eq!(sem.release(), Ok(()));
        assert_eq!(sem.release(), Err(OsError::SemOverflow));
        assert_eq!(sem.count(), 1);
    }

    #[test]
    fn count_never_leaves_bounds() {
        let sem = Semaphore::new(4);
        for step in 0..200u32 {
            if step % 3 == 0 {
                let _ = sem.release();
            } else {
                let _ = sem.try_acquire();
            }
            assert!(sem.count() <= 4);
        }
    }
}

#[cfg(test)]
mod queue_tests {
    use ringos::{BlockMode, OsError, Queue};

    #[test]
    fn create_rejects_zero_sizes() {
        assert_eq!(Queue::create(0, 4).unwrap_err(), OsError::InvalidSize);
        assert_eq!(Queue::create(4, 0).unwrap_err(), OsError::InvalidSize);
    }

    #[test]
    fn accessors_reflect_creation() {
        let q = Queue::create(8, 16).unwrap();
        assert_eq!(q.capacity(), 8);
        assert_eq!(q.item_size(), 16);
        assert!(q.is_empty());
    }

    #[test]
    fn fifo_through_a_small_queue() {
        let q = Queue::create(2, 4).unwrap();
        let values = [0x1122_3344u32, 0x5566_7788];

        for v in values {
            q.put(&v.to_le_bytes(), BlockMode::NoBlock).unwrap();
        }

        let mut out = [0u8; 4];
        for v in values {
            q.get(&mut out, BlockMode::NoBlock).unwrap();
            assert_eq!(u32::from_le_bytes(out), v);
        }
        assert!(q.is_empty());
    }

    #[test]
    fn payload_round_trips_bit_for_bit() {
        let q = Queue::create(1, 12).unwrap();
        let item: [u8; 12] = [0, 255, 1, 254, 0x7F, 0x80, 0xAA, 0x55, 9, 8, 7, 6];
        q.put(&item, BlockMode::NoBlock).unwrap();

        let mut out = [0u8; 12];
        q.get(&mut out, BlockMode::NoBlock).unwrap();
        assert_eq!(out, item);
    }

    #[test]
    fn nonblocking_put_on_full_reports_blocked() {
        let q = Queue::create(1, 1).unwrap();
        q.put(&[1], BlockMode::NoBlock).unwrap();

        let before = ringos::port::ctx_sw_requests();
        assert_eq!(q.put(&[2], BlockMode::NoBlock), Err(OsError::WouldBlock));
        assert_eq!(q.len(), 1);
        // a failed try must not request a context switch
        assert_eq!(ringos::port::ctx_sw_requests(), before);
    }

    #[test]
    fn nonblocking_get_on_empty_reports_blocked() {
        let q = Queue::create(2, 1).unwrap();
        let mut out = [0u8; 1];

        let before = ringos::port::ctx_sw_requests();
        assert_eq!(q.get(&mut out, BlockMode::NoBlock), Err(OsError::WouldBlock));
        assert!(q.is_empty());
        assert_eq!(ringos::port::ctx_sw_requests(), before);
    }

    #[test]
    fn wrong_payload_size_is_rejected() {
        let q = Queue::create(2, 4).unwrap();
        assert_eq!(
            q.put(&[0u8; 3], BlockMode::NoBlock),
            Err(OsError::ItemSizeMismatch)
        );
        let mut short = [0u8; 2];
        assert_eq!(
            q.get(&mut short, BlockMode::NoBlock),
            Err(OsError::ItemSizeMismatch)
        );
        assert!(q.is_empty());
    }

    #[test]
    fn refill_cycles_preserve_order() {
        let q = Queue::create(3, 1).unwrap();
        let mut out = [0u8; 1];
        let mut expected = 0u8;

        // push the indices past several wraparounds
        for round in 0..5u8 {
            for i in 0..3u8 {
                q.put(&[round * 3 + i], BlockMode::NoBlock).unwrap();
            }
            assert_eq!(q.put(&[99], BlockMode::NoBlock), Err(OsError::WouldBlock));
            for _ in 0..3 {
                q.get(&mut out, BlockMode::NoBlock).unwrap();
                assert_eq!(out[0], expected);
                expected += 1;
            }
        }
        assert!(q.is_empty());
    }
}

#[cfg(test)]
mod frame_tests {
    use ringos::port::frame::*;
    use ringos::types::FpuMode;

    fn spin() -> ! {
        loop {
            std::hint::spin_loop();
        }
    }

    #[test]
    fn frame_sizes_match_the_switch_contract() {
        assert_eq!(FRAME_WORDS, 17);
        assert_eq!(FP_FRAME_WORDS, 51);
    }

    #[test]
    fn markers_select_the_stack_and_fp_mode() {
        let basic = Box::leak(vec![0u32; 64].into_boxed_slice());
        let sp = os_task_stk_init(spin, basic, FpuMode::NoFpu);
        assert_eq!(unsafe { *sp }, EXC_RETURN_THREAD_PSP);

        let fp = Box::leak(vec![0u32; 128].into_boxed_slice());
        let sp = os_task_stk_init(spin, fp, FpuMode::Fpu);
        assert_eq!(unsafe { *sp }, EXC_RETURN_THREAD_PSP_FP);
    }
}
