//! Guarded Pool
//!
//! A GuardedPool embeds a MemoryPool and adds a wait queue of blocked callers: an allocation on an exhausted pool may
//! suspend the calling thread until a block is freed or a timeout elapses.
//!
//! A freed block is handed directly to the first waiter, without touching the free list; the woken thread's
//! allocation therefore succeeds without re-checking exhaustion, and two racing frees can never satisfy one waiter
//! with the same block twice.

use core::ptr::NonNull;

use super::pool::MemoryPool;
use super::provider::Provider;
use super::scheduler::{Critical, Scheduler, Timeout, WaitOutcome};

/// GuardedPool.
///
/// A fixed-block memory pool whose allocations may block, parameterized over the surrounding kernel's scheduler.
///
/// The free list and wait queue are mutated only inside the scheduler's critical section; every operation holds it
/// for the duration of the mutation only, never across a suspension point.
pub struct GuardedPool<'a, S: Scheduler> {
    pool: MemoryPool<'a>,
    queue: S::WaitQueue,
    scheduler: S,
}

//  Safety:
//  -   The embedded pool and wait queue are only mutated inside the scheduler's critical section, which is exclusive
//      across threads.
unsafe impl<'a, S: Scheduler + Sync> Sync for GuardedPool<'a, S>
    where
        S::WaitQueue: Sync,
{
}

//  Safety:
//  -   The pool's blocks are raw memory; moving the pool to another thread moves nothing thread-bound.
unsafe impl<'a, S: Scheduler + Send> Send for GuardedPool<'a, S>
    where
        S::WaitQueue: Send,
{
}

impl<'a, S: Scheduler> GuardedPool<'a, S> {
    /// Creates an empty pool of `block_size`-byte blocks, with an empty wait queue.
    ///
    /// A `None` provider means exhaustion is terminal until blocks are freed or loaded.
    pub fn new(scheduler: S, block_size: usize, provider: Option<&'a dyn Provider>) -> Self {
        Self {
            pool: MemoryPool::new(block_size, provider),
            queue: S::WaitQueue::default(),
            scheduler,
        }
    }

    /// Re-initializes the pool with a new block size and provider, and a fresh wait queue.
    ///
    /// Exclusive access proves no thread is suspended on the pool; outstanding allocations are implicitly discarded,
    /// not freed.
    pub fn object_init(&mut self, block_size: usize, provider: Option<&'a dyn Provider>) {
        self.pool.object_init(block_size, provider);
        self.queue = S::WaitQueue::default();
    }

    /// Returns the fixed size, in bytes, of the blocks handled by this pool.
    pub fn block_size(&self) -> usize { self.pool.block_size() }

    /// Returns a reference to the scheduler driving this pool.
    pub fn scheduler(&self) -> &S { &self.scheduler }

    /// Loads `count` blocks carved from `buffer` into the pool.
    ///
    /// #   Safety
    ///
    /// As `MemoryPool::load_array`.
    pub unsafe fn load_array(&self, buffer: NonNull<u8>, count: usize) {
        let _critical = Critical::new(&self.scheduler);

        self.pool.load_array(buffer, count);
    }

    /// Allocates one block, suspending the calling thread up to `timeout` if the pool is exhausted.
    ///
    /// -   `Timeout::Immediate` behaves exactly as `MemoryPool::alloc`: exhaustion is reported immediately, the
    ///     caller is never suspended.
    /// -   `Timeout::Bounded` suspends up to the given duration; on expiry the waiter is removed from the queue and
    ///     `None` is returned.
    /// -   `Timeout::Infinite` suspends until a `free` on this pool hands a block over.
    ///
    /// The growth provider, if any, is consulted before suspending.
    pub fn alloc_timeout(&self, timeout: Timeout) -> Option<NonNull<u8>> {
        let _critical = Critical::new(&self.scheduler);

        if let Some(block) = self.pool.alloc() {
            return Some(block);
        }

        if let Timeout::Immediate = timeout {
            return None;
        }

        match self.scheduler.suspend(&self.queue, timeout) {
            WaitOutcome::Woken(block) => Some(block),
            WaitOutcome::TimedOut => None,
        }
    }

    /// Returns one block to the pool, transferring its ownership back.
    ///
    /// If a thread is waiting, the block is handed to it directly and never touches the free list; otherwise it is
    /// pushed onto the free list as `MemoryPool::free` does.
    ///
    /// #   Safety
    ///
    /// As `MemoryPool::free`.
    pub unsafe fn free(&self, block: NonNull<u8>) {
        let _critical = Critical::new(&self.scheduler);

        if let Some(block) = self.scheduler.wake_one(&self.queue, block) {
            self.pool.free(block);
        }
    }

    /// Returns the number of blocks currently on the free list, by walking it.
    ///
    /// O(n); intended for diagnostics and tests, not for allocation paths.
    pub fn free_count(&self) -> usize {
        let _critical = Critical::new(&self.scheduler);

        self.pool.free_count()
    }
}

// mod tests
