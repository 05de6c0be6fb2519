//! A collection of utilities.

use core::ptr::NonNull;

/// Returns whether the pointer is sufficiently aligned for the given alignment.
pub(crate) fn is_sufficiently_aligned_for(ptr: NonNull<u8>, alignment: usize) -> bool {
    debug_assert!(alignment.is_power_of_two());

    (ptr.as_ptr() as usize) % alignment == 0
}

// mod tests
