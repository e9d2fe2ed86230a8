//! Resize and bulk-copy operations.
//!
//! Resize always allocates the replacement block before touching the
//! current one, so a failed allocation leaves the array exactly as it was.

use std::mem;
use std::ptr::NonNull;

use log::debug;
use offheap_alloc::Allocator;
use offheap_core::ArrayError;

use crate::array::Array;
use crate::buffer::RawBuffer;
use crate::element::{self, Element};

impl<T: Element, A: Allocator> Array<T, A> {
    /// Change the length to `new_len`.
    ///
    /// The first `min(len, new_len)` elements are preserved and any new
    /// suffix is zero-filled. Shrinking drops the pinned values that fall
    /// off the end. Handles in the kept prefix are moved, never cloned.
    ///
    /// On [`ArrayError::OutOfMemory`] the array is unchanged.
    pub fn resize(&mut self, new_len: usize) -> Result<(), ArrayError> {
        self.ensure_live()?;
        let old_len = self.len();
        if new_len == old_len {
            return Ok(());
        }
        let mut next = RawBuffer::allocate(&self.alloc, new_len, true)?;
        let kept = old_len.min(new_len);
        element::release_range::<T>(&mut self.buf, kept..old_len);
        // SAFETY: both buffers hold at least `kept` slots and are distinct
        // blocks; the moved handles are never released from the old block.
        unsafe { self.buf.copy_prefix_to(&mut next, kept, &self.alloc) };
        let old = mem::replace(&mut self.buf, next);
        // SAFETY: old came from self.alloc and is freed exactly once.
        unsafe { old.free_in(&self.alloc) };
        debug!("array: resized {old_len} -> {new_len} elements");
        Ok(())
    }

    /// Make an independent copy with the same length and a clone of the allocator.
    ///
    /// Inline elements are bulk-copied through the allocator. Indirect
    /// elements are cloned one by one into fresh handles.
    pub fn copy(&self) -> Result<Self, ArrayError>
    where
        A: Clone,
    {
        self.ensure_live()?;
        let len = self.len();
        if element::is_indirect::<T>() {
            let mut out = Self::new_in(len, self.alloc.clone())?;
            for index in 0..len {
                element::store(&mut out.buf, index, element::read::<T>(&self.buf, index)?)?;
            }
            return Ok(out);
        }
        let mut out = Self::allocate(len, false, self.alloc.clone())?;
        // SAFETY: both blocks hold `len` slots and are distinct; inline
        // slots own nothing, so a bitwise copy is a full copy.
        unsafe { self.buf.copy_prefix_to(&mut out.buf, len, &self.alloc) };
        Ok(out)
    }

    /// Copy elements from `src` into the front of this array.
    ///
    /// Transfers `min(len, src.len())` elements and returns that count.
    pub fn copy_from(&mut self, src: &[T]) -> Result<usize, ArrayError>
    where
        T: Clone,
    {
        self.ensure_live()?;
        let count = self.len().min(src.len());
        if element::is_indirect::<T>() {
            for (index, value) in src[..count].iter().enumerate() {
                element::store(&mut self.buf, index, value.clone())?;
            }
            return Ok(count);
        }
        if count > 0 {
            let dst = NonNull::new(self.buf.as_mut_ptr().cast::<u8>());
            let from = NonNull::new(src.as_ptr().cast_mut().cast::<u8>());
            if let (Some(dst), Some(from)) = (dst, from) {
                // SAFETY: inline slots share T's layout; both ranges hold
                // `count` elements, and `src` is borrowed immutably while
                // self is borrowed mutably, so they cannot overlap.
                unsafe {
                    self.alloc
                        .copy_bytes(dst, from, count * mem::size_of::<T>())
                };
            }
        }
        Ok(count)
    }

    /// Copy the front of this array into `dst`.
    ///
    /// Transfers `min(len, dst.len())` elements and returns that count.
    pub fn copy_to(&self, dst: &mut [T]) -> Result<usize, ArrayError> {
        self.ensure_live()?;
        let count = self.len().min(dst.len());
        if element::is_indirect::<T>() {
            for (index, out) in dst[..count].iter_mut().enumerate() {
                *out = element::read::<T>(&self.buf, index)?;
            }
            return Ok(count);
        }
        if count > 0 {
            let to = NonNull::new(dst.as_mut_ptr().cast::<u8>());
            let from = NonNull::new(self.buf.as_ptr().cast_mut().cast::<u8>());
            if let (Some(to), Some(from)) = (to, from) {
                // SAFETY: inline slots share T's layout and T is plain data,
                // so overwriting dst bytes drops nothing; the ranges are
                // distinct allocations.
                unsafe {
                    self.alloc
                        .copy_bytes(to, from, count * mem::size_of::<T>())
                };
            }
        }
        Ok(count)
    }
}
