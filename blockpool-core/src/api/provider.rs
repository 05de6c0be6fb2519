//! Growth Provider
//!
//! The Provider trait is used to request one additional block when a pool's free list is empty. By abstracting the
//! source of extra memory, a pool can be backed by a larger allocator, a static reserve, or nothing at all.

use core::ptr::NonNull;

/// Abstraction of an optional source of additional blocks.
///
/// A pool holds a provider by reference only; it invokes it, it never owns it.
pub trait Provider: Sync {
    /// Requests one additional block of `size` bytes, aligned on at least an `align` boundary.
    ///
    /// Returning `None` means no memory could be supplied; the pool folds this into ordinary exhaustion. Failure must
    /// be cheap: no fault, no panic.
    ///
    /// #   Contract
    ///
    /// -   `grow` must never suspend the calling thread; it may be invoked from within a critical section.
    ///
    /// The caller may assume that if the returned pointer is not `None` then:
    /// -   The number of usable bytes is greater than or equal to `size`.
    /// -   The pointer is at least aligned to `align`.
    fn grow(&self, size: usize, align: usize) -> Option<NonNull<u8>>;
}

impl<F> Provider for F
    where
        F: Fn(usize, usize) -> Option<NonNull<u8>> + Sync,
{
    fn grow(&self, size: usize, align: usize) -> Option<NonNull<u8>> { self(size, align) }
}
