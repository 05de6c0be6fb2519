use std::{
    mem,
    ptr::NonNull,
    time::{Duration, Instant},
};

use blockpool::{HostedPool, HostedScheduler, MemoryPool, Timeout};

const BLOCK_SIZE: usize = mem::size_of::<usize>();
const POOL_SIZE: usize = 4;

#[repr(align(128))]
#[derive(Default)]
struct Objects([usize; POOL_SIZE]);

impl Objects {
    fn base(&self) -> NonNull<u8> { self.get(0) }

    fn get(&self, index: usize) -> NonNull<u8> {
        NonNull::new(&self.0[index] as *const usize as *mut u8).unwrap()
    }
}

fn null_provider(_size: usize, _align: usize) -> Option<NonNull<u8>> { None }

//
//  Tests
//

#[test]
fn memory_pool_load_and_empty() {
    //  Loading and emptying a memory pool, all conditions covered.

    let objects = Objects::default();
    let mut pool = MemoryPool::new(BLOCK_SIZE, None);

    //  Adding the objects to the pool by loading the array.
    //
    //  Safety:
    //  -   The buffer spans `POOL_SIZE` aligned blocks, and is not otherwise used.
    unsafe { pool.load_array(objects.base(), POOL_SIZE) };

    //  Emptying the pool.
    for _ in 0..POOL_SIZE {
        assert!(pool.alloc().is_some(), "list empty");
    }

    //  Now must be empty.
    assert!(pool.alloc().is_none(), "list not empty");

    //  Adding the objects back, one free at a time.
    //
    //  Safety:
    //  -   Every block came out of this pool, exactly once.
    for index in 0..POOL_SIZE {
        unsafe { pool.free(objects.get(index)) };
    }

    //  Emptying the pool again.
    for _ in 0..POOL_SIZE {
        assert!(pool.alloc().is_some(), "list empty");
    }

    //  Now must be empty again.
    assert!(pool.alloc().is_none(), "list not empty");

    //  Covering the case where a provider is unable to return more memory.
    pool.object_init(BLOCK_SIZE, Some(&null_provider));
    assert!(pool.alloc().is_none(), "provider returned memory");
}

#[test]
fn guarded_pool_load_and_empty_without_waiting() {
    //  The same sequence through the guarded pool, probing with immediate timeouts throughout: no step may suspend.

    let objects = Objects::default();
    let pool = HostedPool::new(HostedScheduler::new(), BLOCK_SIZE, None);

    //  Safety:
    //  -   The buffer spans `POOL_SIZE` aligned blocks, and is not otherwise used.
    unsafe { pool.load_array(objects.base(), POOL_SIZE) };

    for _ in 0..POOL_SIZE {
        assert!(pool.alloc_timeout(Timeout::Immediate).is_some(), "list empty");
    }

    assert!(pool.alloc_timeout(Timeout::Immediate).is_none(), "list not empty");

    //  Safety:
    //  -   Every block came out of this pool, exactly once.
    for index in 0..POOL_SIZE {
        unsafe { pool.free(objects.get(index)) };
    }

    for _ in 0..POOL_SIZE {
        assert!(pool.alloc_timeout(Timeout::Immediate).is_some(), "list empty");
    }

    assert!(pool.alloc_timeout(Timeout::Immediate).is_none(), "list not empty");
}

#[test]
fn guarded_pool_immediate_probe_is_non_blocking() {
    //  An immediate probe of an empty pool reports exhaustion without measurable delay.

    let pool = HostedPool::new(HostedScheduler::new(), BLOCK_SIZE, None);

    let start = Instant::now();

    assert_eq!(None, pool.alloc_timeout(Timeout::Immediate));

    assert!(start.elapsed() < Duration::from_millis(50));
}

#[test]
fn guarded_pool_bounded_timeout() {
    //  Allocating with a 100ms timeout on an empty pool must fail, after at least 100ms.

    let objects = Objects::default();
    let pool = HostedPool::new(HostedScheduler::new(), BLOCK_SIZE, None);

    let start = Instant::now();

    assert_eq!(None, pool.alloc_timeout(Timeout::Bounded(Duration::from_millis(100))));

    assert!(start.elapsed() >= Duration::from_millis(100));

    //  The expired waiter left the queue: a later free restocks the list instead of waking anything.
    //
    //  Safety:
    //  -   The block is aligned, sufficiently sized, and not otherwise used.
    unsafe { pool.free(objects.get(0)) };

    assert_eq!(1, pool.free_count());
}
