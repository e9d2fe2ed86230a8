//! Raw, exclusively owned slot storage.
//!
//! A [`RawBuffer`] is a pointer plus an element count. It knows the slot
//! stride and nothing else about the element type. It does not hold its
//! allocator and has no `Drop`: the owning array frees it explicitly with
//! [`RawBuffer::free_in`], passing the allocator that produced it.

use std::alloc::Layout;
use std::mem;
use std::ptr::NonNull;

use log::trace;
use offheap_alloc::Allocator;
use offheap_core::ArrayError;

/// An owned block of `len` contiguous slots of type `S`.
///
/// Invariant: either `len * size_of::<S>() == 0` and `ptr` is a dangling
/// sentinel, or `ptr` owns exactly `len * size_of::<S>()` bytes obtained
/// from one allocator.
pub struct RawBuffer<S> {
    ptr: NonNull<S>,
    len: usize,
}

impl<S> RawBuffer<S> {
    /// A buffer of zero slots. Owns nothing.
    pub const fn empty() -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
        }
    }

    /// Layout of a block holding `len` slots.
    ///
    /// Fails with [`ArrayError::InvalidArgument`] if the byte size would
    /// exceed `isize::MAX`.
    pub fn layout_for(len: usize) -> Result<Layout, ArrayError> {
        Layout::array::<S>(len).map_err(|_| {
            ArrayError::invalid(format!(
                "{len} slots of {} bytes overflow the address space",
                mem::size_of::<S>()
            ))
        })
    }

    /// Allocate a buffer of `len` slots from `alloc`.
    ///
    /// With `zeroed == false` the slot contents are unspecified.
    pub fn allocate<A: Allocator + ?Sized>(
        alloc: &A,
        len: usize,
        zeroed: bool,
    ) -> Result<Self, ArrayError> {
        let layout = Self::layout_for(len)?;
        if layout.size() == 0 {
            return Ok(Self {
                ptr: NonNull::dangling(),
                len,
            });
        }
        let ptr = alloc.allocate(layout, zeroed)?;
        trace!("buffer: {len} slots ({} bytes) at {:p}", layout.size(), ptr);
        Ok(Self {
            ptr: ptr.cast(),
            len,
        })
    }

    /// Return the block to `alloc`.
    ///
    /// Slot contents are not inspected; releasing indirect handles is the
    /// caller's job and must happen first.
    ///
    /// # Safety
    ///
    /// `alloc` must be the allocator this buffer was obtained from.
    pub unsafe fn free_in<A: Allocator + ?Sized>(self, alloc: &A) {
        let Ok(layout) = Self::layout_for(self.len) else {
            // Unreachable: the same layout was valid at allocation time.
            return;
        };
        if layout.size() != 0 {
            trace!("buffer: freeing {} bytes at {:p}", layout.size(), self.ptr);
            // SAFETY: ptr/layout are exactly what `allocate` obtained from `alloc`.
            unsafe { alloc.free(self.ptr.cast(), layout) };
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer has zero slots.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the block in bytes.
    pub fn byte_len(&self) -> usize {
        self.len * mem::size_of::<S>()
    }

    /// Base address of the block. Dangling when the block is zero-sized.
    pub fn as_ptr(&self) -> *const S {
        self.ptr.as_ptr()
    }

    /// Mutable base address of the block. Dangling when the block is zero-sized.
    pub fn as_mut_ptr(&mut self) -> *mut S {
        self.ptr.as_ptr()
    }

    /// Address of slot `index`, i.e. `base + index * stride`.
    ///
    /// This is the only place slot addresses are computed; the bounds check
    /// happens before the arithmetic.
    pub fn slot(&self, index: usize) -> Result<NonNull<S>, ArrayError> {
        if index >= self.len {
            return Err(ArrayError::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }
        // SAFETY: index < len, so the offset stays inside the owned block
        // (or is zero bytes for zero-sized slots).
        Ok(unsafe { self.ptr.add(index) })
    }

    /// Bulk-copy the first `count` slots into `dst` through `alloc`.
    ///
    /// # Safety
    ///
    /// `count` must not exceed either buffer's length, and the two buffers
    /// must be distinct blocks. Slots are copied bitwise: for handle slots
    /// this moves ownership, so the source slots must not be released
    /// afterwards.
    pub unsafe fn copy_prefix_to<A: Allocator + ?Sized>(
        &self,
        dst: &mut RawBuffer<S>,
        count: usize,
        alloc: &A,
    ) {
        debug_assert!(count <= self.len && count <= dst.len);
        let bytes = count * mem::size_of::<S>();
        if bytes == 0 {
            return;
        }
        // SAFETY: both ranges are in bounds and belong to distinct blocks.
        unsafe { alloc.copy_bytes(dst.ptr.cast(), self.ptr.cast(), bytes) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offheap_alloc::Global;

    #[test]
    fn zeroed_buffer_reads_zero() {
        let buf = RawBuffer::<u64>::allocate(&Global, 100, true).unwrap();
        assert_eq!(buf.len(), 100);
        assert_eq!(buf.byte_len(), 800);
        for i in 0..100 {
            // SAFETY: slot is in bounds of a zeroed block.
            assert_eq!(unsafe { *buf.slot(i).unwrap().as_ptr() }, 0);
        }
        // SAFETY: allocated from Global above.
        unsafe { buf.free_in(&Global) };
    }

    #[test]
    fn slot_rejects_index_at_len() {
        let buf = RawBuffer::<u32>::allocate(&Global, 3, true).unwrap();
        assert_eq!(
            buf.slot(3).err(),
            Some(ArrayError::IndexOutOfBounds { index: 3, len: 3 })
        );
        // SAFETY: allocated from Global above.
        unsafe { buf.free_in(&Global) };
    }

    #[test]
    fn slot_addresses_are_strided() {
        let buf = RawBuffer::<[u8; 12]>::allocate(&Global, 4, false).unwrap();
        let base = buf.as_ptr() as usize;
        assert_eq!(buf.slot(3).unwrap().as_ptr() as usize, base + 36);
        // SAFETY: allocated from Global above.
        unsafe { buf.free_in(&Global) };
    }

    #[test]
    fn zero_length_buffer_allocates_nothing() {
        let buf = RawBuffer::<u64>::allocate(&Global, 0, true).unwrap();
        assert!(buf.is_empty());
        assert_eq!(buf.byte_len(), 0);
        assert!(buf.slot(0).is_err());
        // SAFETY: zero-sized buffers are never handed to the allocator.
        unsafe { buf.free_in(&Global) };
    }

    #[test]
    fn overflowing_length_is_invalid_argument() {
        let result = RawBuffer::<u64>::allocate(&Global, usize::MAX / 4, true);
        assert!(matches!(result, Err(ArrayError::InvalidArgument { .. })));
    }

    #[test]
    fn copy_prefix_copies_only_count_slots() {
        let src = RawBuffer::<u32>::allocate(&Global, 4, false).unwrap();
        let mut dst = RawBuffer::<u32>::allocate(&Global, 4, true).unwrap();
        // SAFETY: all indices are in bounds of live blocks.
        unsafe {
            for i in 0..4 {
                *src.slot(i).unwrap().as_ptr() = 10 + i as u32;
            }
            src.copy_prefix_to(&mut dst, 2, &Global);
            assert_eq!(*dst.slot(0).unwrap().as_ptr(), 10);
            assert_eq!(*dst.slot(1).unwrap().as_ptr(), 11);
            assert_eq!(*dst.slot(2).unwrap().as_ptr(), 0);
            src.free_in(&Global);
            dst.free_in(&Global);
        }
    }
}
