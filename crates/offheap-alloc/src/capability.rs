//! The allocation capability contract.

use std::alloc::Layout;
use std::ptr::{self, NonNull};

use offheap_core::AllocError;

/// A backend that can allocate, release and copy raw memory blocks.
///
/// Backends are stateless as far as the container is concerned: the
/// container keeps the [`Layout`] of every block it obtains and hands it
/// back on [`free`](Allocator::free).
///
/// # Safety
///
/// Implementors must uphold the following for every call to
/// [`allocate`](Allocator::allocate) that returns `Ok(ptr)`:
///
/// - `ptr` is aligned to `layout.align()` and valid for reads and writes
///   of `layout.size()` bytes until it is passed to `free`.
/// - When `zeroed` is true, all `layout.size()` bytes read as zero.
/// - The block does not overlap any other live block from this allocator.
/// - A zero-size layout yields a dangling, well-aligned pointer that
///   `free` accepts and ignores.
pub unsafe trait Allocator {
    /// Allocate a block for `layout`, optionally zero-filled.
    ///
    /// Returns [`AllocError`] if the backend produced a null block. Failures
    /// are reported immediately and never retried.
    fn allocate(&self, layout: Layout, zeroed: bool) -> Result<NonNull<u8>, AllocError>;

    /// Release a block previously returned by [`allocate`](Allocator::allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate` on this allocator with
    /// the same `layout`, and must not have been freed already.
    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout);

    /// Copy `len` bytes from `src` to `dst`.
    ///
    /// # Safety
    ///
    /// `src` must be valid for reads and `dst` valid for writes of `len`
    /// bytes, and the two ranges must not overlap.
    unsafe fn copy_bytes(&self, dst: NonNull<u8>, src: NonNull<u8>, len: usize) {
        // SAFETY: forwarded from the caller.
        unsafe { ptr::copy_nonoverlapping(src.as_ptr(), dst.as_ptr(), len) }
    }
}

// SAFETY: every operation forwards to `A`, which upholds the contract.
unsafe impl<A: Allocator + ?Sized> Allocator for &A {
    fn allocate(&self, layout: Layout, zeroed: bool) -> Result<NonNull<u8>, AllocError> {
        (**self).allocate(layout, zeroed)
    }

    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded from the caller.
        unsafe { (**self).free(ptr, layout) }
    }

    unsafe fn copy_bytes(&self, dst: NonNull<u8>, src: NonNull<u8>, len: usize) {
        // SAFETY: forwarded from the caller.
        unsafe { (**self).copy_bytes(dst, src, len) }
    }
}

/// A dangling pointer aligned for `layout`, used for zero-size blocks.
pub(crate) fn dangling(layout: Layout) -> NonNull<u8> {
    // Alignment is a non-zero power of two, so the address is never null.
    NonNull::new(layout.align() as *mut u8).unwrap_or(NonNull::dangling())
}
