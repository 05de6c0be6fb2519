//! Free List
//!
//! The free list threads a singly-linked list through the free blocks themselves: whilst a block sits in the pool, its
//! first machine word is reused as the link to the next free block. Whilst allocated, the content of the block is
//! purely in the hands of the caller, and the pool retains no record of it.
//!
//! Note: FreeBlocks are never _constructed_, instead raw memory is reinterpreted as blocks.

use core::{
    cell::Cell,
    mem,
    ptr::{self, NonNull},
};

use crate::utils;

/// FreeBlock.
///
/// The in-pool view of a block: the head word is the link to the next free block, if any.
#[repr(C)]
#[derive(Default)]
pub(crate) struct FreeBlock {
    next: Cell<Option<NonNull<FreeBlock>>>,
}

impl FreeBlock {
    /// The smallest admissible block size: a free block must be able to store its link.
    pub(crate) const MIN_SIZE: usize = mem::size_of::<FreeBlock>();

    /// The natural alignment of every block handled by a pool.
    pub(crate) const ALIGNMENT: usize = mem::align_of::<FreeBlock>();

    /// In-place constructs a `FreeBlock`.
    ///
    /// #   Safety
    ///
    /// -   Assumes that access to the memory location is exclusive.
    /// -   Assumes that there is sufficient memory available.
    /// -   Assumes that the pointer is correctly aligned.
    #[allow(clippy::cast_ptr_alignment)]
    pub(crate) unsafe fn initialize(at: NonNull<u8>) -> NonNull<FreeBlock> {
        debug_assert!(utils::is_sufficiently_aligned_for(at, FreeBlock::ALIGNMENT));

        //  Safety:
        //  -   `at` is assumed to be sufficiently aligned.
        let ptr = at.as_ptr() as *mut FreeBlock;

        //  Safety:
        //  -   Access to the memory location is exclusive.
        //  -   `ptr` is assumed to be sufficiently sized.
        ptr::write(ptr, FreeBlock::default());

        at.cast()
    }
}

/// FreeList.
///
/// A LIFO stack of free blocks; push and pop are O(1) and allocation free.
pub(crate) struct FreeList(Cell<Option<NonNull<FreeBlock>>>);

impl FreeList {
    /// Creates an empty list.
    pub(crate) const fn new() -> Self { Self(Cell::new(None)) }

    /// Pops the head of the list, if any.
    ///
    /// The returned block is no longer linked; its bytes belong to the caller.
    pub(crate) fn pop(&self) -> Option<NonNull<u8>> {
        let result = self.0.get()?;

        //  Safety:
        //  -   Non-null, and valid instance: the block was linked by `push`.
        let next = unsafe { result.as_ref().next.get() };
        self.0.set(next);

        Some(result.cast())
    }

    /// Prepends the block to the head of the list.
    pub(crate) fn push(&self, block: NonNull<FreeBlock>) {
        unsafe {
            //  Safety:
            //  -   Bounded lifetime.
            block.as_ref().next.set(self.0.get());
        }

        self.0.set(Some(block));
    }

    /// Reinterprets `block` as a free block and prepends it to the head of the list.
    ///
    /// #   Safety
    ///
    /// -   Assumes that access to the memory location is exclusive.
    /// -   Assumes that the block is sufficiently sized and aligned.
    /// -   Assumes that the block is not already on the list.
    pub(crate) unsafe fn push_raw(&self, block: NonNull<u8>) {
        self.push(FreeBlock::initialize(block));
    }

    /// Carves `buffer` into `count` blocks of `block_size` bytes each and pushes them onto the list.
    ///
    /// The blocks are pushed back to front, so that the next `count` pops return the buffer's blocks in forward
    /// order.
    ///
    /// #   Safety
    ///
    /// -   Assumes that access to the buffer is exclusive.
    /// -   Assumes that the buffer spans at least `count * block_size` bytes.
    /// -   Assumes that the buffer and `block_size` are sufficiently aligned.
    pub(crate) unsafe fn carve(&self, buffer: NonNull<u8>, block_size: usize, count: usize) {
        debug_assert!(block_size >= FreeBlock::MIN_SIZE);
        debug_assert!(utils::is_sufficiently_aligned_for(buffer, FreeBlock::ALIGNMENT));

        for index in (0..count).rev() {
            //  Safety:
            //  -   The offset is within the buffer, which is not null.
            let at = NonNull::new_unchecked(buffer.as_ptr().add(index * block_size));

            //  Safety:
            //  -   Access to the block is exclusive.
            //  -   The block is sufficiently sized and aligned.
            self.push(FreeBlock::initialize(at));
        }
    }

    /// Empties the list.
    ///
    /// The blocks themselves are untouched; any block not on the list is unaffected.
    pub(crate) fn clear(&self) { self.0.set(None); }

    /// Returns the number of blocks on the list, by walking it.
    ///
    /// O(n); intended for diagnostics and tests, not for allocation paths.
    pub(crate) fn len(&self) -> usize {
        let mut current = self.0.get();
        let mut count = 0;

        while let Some(block) = current {
            //  Safety:
            //  -   Non-null, and valid instance: the block was linked by `push`.
            current = unsafe { block.as_ref().next.get() };
            count += 1;
        }

        count
    }

    /// Returns whether `block` is currently linked on the list.
    ///
    /// O(n); used to catch double frees in debug builds.
    pub(crate) fn contains(&self, block: NonNull<u8>) -> bool {
        let block: NonNull<FreeBlock> = block.cast();
        let mut current = self.0.get();

        while let Some(candidate) = current {
            if candidate == block {
                return true;
            }

            //  Safety:
            //  -   Non-null, and valid instance: the block was linked by `push`.
            current = unsafe { candidate.as_ref().next.get() };
        }

        false
    }
}

impl Default for FreeList {
    fn default() -> Self { Self::new() }
}

// mod tests
