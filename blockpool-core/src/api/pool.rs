//! Memory Pool
//!
//! A MemoryPool manages caller-supplied memory blocks of a single fixed size. All operations are O(1), allocation
//! free, and never suspend the calling thread, making them safe for contexts where suspension is forbidden.
//!
//! The pool provides no locking of its own: it is intended either for single-threaded use, or for use behind the
//! caller's own mutual exclusion, as `GuardedPool` does with its scheduler's critical section.

use core::ptr::NonNull;

use crate::internals::free_list::{FreeBlock, FreeList};
use crate::utils;

use super::provider::Provider;

/// MemoryPool.
///
/// A pool of memory blocks of a single fixed size, managed through an intrusive free list: the first machine word of
/// a free block doubles as the link to the next one, so no metadata lives outside the blocks themselves.
pub struct MemoryPool<'a> {
    free: FreeList,
    block_size: usize,
    provider: Option<&'a dyn Provider>,
}

impl<'a> MemoryPool<'a> {
    /// The smallest admissible block size: a free block must be able to store its free-list link.
    pub const MIN_BLOCK_SIZE: usize = FreeBlock::MIN_SIZE;

    /// The alignment required of every block handled by a pool.
    pub const BLOCK_ALIGNMENT: usize = FreeBlock::ALIGNMENT;

    /// Creates an empty pool of `block_size`-byte blocks.
    ///
    /// A `None` provider means exhaustion is terminal until blocks are freed or loaded.
    ///
    /// `block_size` must be at least `MIN_BLOCK_SIZE`; violating this is a caller programming error, asserted in
    /// debug builds.
    pub const fn new(block_size: usize, provider: Option<&'a dyn Provider>) -> Self {
        debug_assert!(block_size >= Self::MIN_BLOCK_SIZE);

        Self { free: FreeList::new(), block_size, provider, }
    }

    /// Re-initializes the pool with a new block size and provider.
    ///
    /// The free list is emptied; any outstanding allocation is implicitly discarded, not freed. Callers must not
    /// return blocks obtained before the re-initialization.
    pub fn object_init(&mut self, block_size: usize, provider: Option<&'a dyn Provider>) {
        debug_assert!(block_size >= Self::MIN_BLOCK_SIZE);

        self.block_size = block_size;
        self.provider = provider;
        self.free.clear();
    }

    /// Returns the fixed size, in bytes, of the blocks handled by this pool.
    pub fn block_size(&self) -> usize { self.block_size }

    /// Loads `count` blocks carved from `buffer` into the pool.
    ///
    /// The blocks are pushed back to front, so that the first block allocated after the call is the first
    /// `block_size` bytes of `buffer`.
    ///
    /// #   Safety
    ///
    /// -   `buffer` must be valid for reads and writes over `count * block_size` bytes.
    /// -   `buffer` must be aligned on a `BLOCK_ALIGNMENT` boundary, and `block_size` must be a multiple of it.
    /// -   Ownership of the buffer's memory transfers to the pool; the caller must not use it for anything else until
    ///     the blocks come back out of `alloc`.
    pub unsafe fn load_array(&self, buffer: NonNull<u8>, count: usize) {
        debug_assert!(utils::is_sufficiently_aligned_for(buffer, Self::BLOCK_ALIGNMENT));
        debug_assert!(self.block_size % Self::BLOCK_ALIGNMENT == 0);

        self.free.carve(buffer, self.block_size, count);
    }

    /// Allocates one block, transferring its ownership to the caller.
    ///
    /// Pops the free-list head if any; on an empty list, consults the growth provider once, if configured. A
    /// provider-supplied block is returned directly, it never touches the free list.
    ///
    /// Returns `None` on exhaustion; exhaustion is an expected outcome, not a fault.
    pub fn alloc(&self) -> Option<NonNull<u8>> {
        if let Some(block) = self.free.pop() {
            return Some(block);
        }

        let block = self.provider?.grow(self.block_size, Self::BLOCK_ALIGNMENT)?;

        debug_assert!(utils::is_sufficiently_aligned_for(block, Self::BLOCK_ALIGNMENT));

        Some(block)
    }

    /// Returns one block to the pool, transferring its ownership back.
    ///
    /// #   Safety
    ///
    /// -   `block` must span at least `block_size` bytes, aligned on a `BLOCK_ALIGNMENT` boundary.
    /// -   `block` must not already be owned by the pool; freeing a block twice is undefined behavior, asserted
    ///     against in debug builds.
    /// -   `block` must not be referenced elsewhere after the call.
    pub unsafe fn free(&self, block: NonNull<u8>) {
        debug_assert!(utils::is_sufficiently_aligned_for(block, Self::BLOCK_ALIGNMENT));
        debug_assert!(!self.free.contains(block));

        self.free.push_raw(block);
    }

    /// Returns the number of blocks currently on the free list, by walking it.
    ///
    /// O(n); intended for diagnostics and tests, not for allocation paths.
    pub fn free_count(&self) -> usize { self.free.len() }
}

#[cfg(test)]
mod tests {

use core::{
    mem,
    sync::atomic::{AtomicUsize, Ordering},
};

use super::*;

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

//  A provider handing out blocks from a static reserve, at most `limit` of them.
struct ReserveProvider {
    reserve: Objects,
    handed: AtomicUsize,
    limit: usize,
}

impl ReserveProvider {
    fn new(limit: usize) -> Self {
        Self { reserve: Objects::default(), handed: AtomicUsize::new(0), limit, }
    }

    fn handed(&self) -> usize { self.handed.load(Ordering::Relaxed) }
}

impl Provider for ReserveProvider {
    fn grow(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        assert_eq!(BLOCK_SIZE, size);
        assert!(align <= mem::align_of::<usize>());

        let index = self.handed.fetch_add(1, Ordering::Relaxed);

        if index < self.limit {
            Some(self.reserve.get(index))
        } else {
            None
        }
    }
}

#[test]
fn pool_load_drain_reload_drain() {
    let objects = Objects::default();
    let pool = MemoryPool::new(BLOCK_SIZE, None);

    //  Safety:
    //  -   The buffer spans `POOL_SIZE` aligned blocks, and is not otherwise used.
    unsafe { pool.load_array(objects.base(), POOL_SIZE) };
    assert_eq!(POOL_SIZE, pool.free_count());

    let mut drained = [None; POOL_SIZE];

    for slot in &mut drained {
        *slot = pool.alloc();
        assert!(slot.is_some());
    }

    //  Now must be empty.
    assert_eq!(None, pool.alloc());
    assert_eq!(0, pool.free_count());

    //  Safety:
    //  -   Every block came out of this pool, exactly once.
    for block in drained.iter().flatten() {
        unsafe { pool.free(*block) };
    }

    for _ in 0..POOL_SIZE {
        assert!(pool.alloc().is_some());
    }

    //  Now must be empty again.
    assert_eq!(None, pool.alloc());
}

#[test]
fn pool_load_allocates_in_buffer_order() {
    let objects = Objects::default();
    let pool = MemoryPool::new(BLOCK_SIZE, None);

    //  Safety:
    //  -   The buffer spans `POOL_SIZE` aligned blocks, and is not otherwise used.
    unsafe { pool.load_array(objects.base(), POOL_SIZE) };

    for index in 0..POOL_SIZE {
        assert_eq!(Some(objects.get(index)), pool.alloc());
    }
}

#[test]
fn pool_exhaustion_persists_until_free() {
    let objects = Objects::default();
    let pool = MemoryPool::new(BLOCK_SIZE, None);

    //  Safety:
    //  -   The buffer spans 1 aligned block, and is not otherwise used.
    unsafe { pool.load_array(objects.base(), 1) };

    let block = pool.alloc().unwrap();

    assert_eq!(None, pool.alloc());
    assert_eq!(None, pool.alloc());

    //  Safety:
    //  -   `block` came out of this pool, exactly once.
    unsafe { pool.free(block) };

    assert_eq!(Some(block), pool.alloc());
}

#[test]
fn pool_null_provider_behaves_as_no_provider() {
    let pool = MemoryPool::new(BLOCK_SIZE, Some(&null_provider));

    assert_eq!(None, pool.alloc());
    assert_eq!(None, pool.alloc());
    assert_eq!(0, pool.free_count());
}

#[test]
fn pool_provider_block_bypasses_free_list() {
    let provider = ReserveProvider::new(2);
    let pool = MemoryPool::new(BLOCK_SIZE, Some(&provider));

    let first = pool.alloc().unwrap();
    let second = pool.alloc().unwrap();

    assert_ne!(first, second);
    assert_eq!(2, provider.handed());

    //  Provider blocks are handed out directly: the free list never grows.
    assert_eq!(0, pool.free_count());

    //  Reserve exhausted: back to ordinary exhaustion.
    assert_eq!(None, pool.alloc());
}

#[test]
fn pool_provider_not_consulted_while_list_is_stocked() {
    let objects = Objects::default();
    let provider = ReserveProvider::new(POOL_SIZE);
    let pool = MemoryPool::new(BLOCK_SIZE, Some(&provider));

    //  Safety:
    //  -   The buffer spans `POOL_SIZE` aligned blocks, and is not otherwise used.
    unsafe { pool.load_array(objects.base(), POOL_SIZE) };

    for _ in 0..POOL_SIZE {
        assert!(pool.alloc().is_some());
    }

    assert_eq!(0, provider.handed());
}

#[test]
fn pool_object_init_discards_free_list() {
    let objects = Objects::default();
    let mut pool = MemoryPool::new(BLOCK_SIZE, None);

    //  Safety:
    //  -   The buffer spans `POOL_SIZE` aligned blocks, and is not otherwise used.
    unsafe { pool.load_array(objects.base(), POOL_SIZE) };

    pool.object_init(BLOCK_SIZE, Some(&null_provider));

    assert_eq!(0, pool.free_count());
    assert_eq!(None, pool.alloc());
}

} // mod tests
