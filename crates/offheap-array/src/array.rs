//! The array container: construction policies, indexed access and release.

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr;
use std::slice;

use bytemuck::Pod;
use log::debug;
use offheap_alloc::{Allocator, Global};
use offheap_core::ArrayError;

use crate::buffer::RawBuffer;
use crate::element::{self, Element, Inline, SlotOf};

/// A resizable contiguous array whose slots live in a block obtained from `A`.
///
/// The array exclusively owns its block. Every access is bounds-checked;
/// there is no implicit growth. Memory is released by [`dispose`](Array::dispose)
/// or on drop, whichever comes first; after disposal every operation
/// returns [`ArrayError::Disposed`].
///
/// ```
/// use offheap_array::Array;
///
/// let mut squares = Array::<u64>::from_fn(5, |i| (i * i) as u64).unwrap();
/// assert_eq!(squares.get(4).unwrap(), 16);
///
/// squares.resize(8).unwrap();
/// assert_eq!(squares.get(7).unwrap(), 0);
/// assert!(squares.get(8).is_err());
/// ```
pub struct Array<T: Element, A: Allocator = Global> {
    pub(crate) buf: RawBuffer<SlotOf<T>>,
    pub(crate) alloc: A,
    disposed: bool,
    _owns: PhantomData<T>,
}

// SAFETY: the array uniquely owns its block and every pinned value in it,
// so sending it moves ownership of Ts and of the allocator.
unsafe impl<T: Element + Send, A: Allocator + Send> Send for Array<T, A> {}

impl<T: Element> Array<T> {
    /// Create `count` zero-filled elements on the global allocator.
    pub fn new(count: usize) -> Result<Self, ArrayError> {
        Self::new_in(count, Global)
    }

    /// Create `count` elements where element `i` is `f(i)`.
    pub fn from_fn(count: usize, f: impl FnMut(usize) -> T) -> Result<Self, ArrayError> {
        Self::from_fn_in(count, f, Global)
    }

    /// Create `count` elements, each produced by calling `f` with no arguments.
    pub fn repeat_with(count: usize, mut f: impl FnMut() -> T) -> Result<Self, ArrayError> {
        Self::from_fn_in(count, |_| f(), Global)
    }

    /// Create `count` copies of `value`.
    pub fn filled(count: usize, value: T) -> Result<Self, ArrayError>
    where
        T: Clone,
    {
        Self::filled_in(count, value, Global)
    }

    /// Create `count` elements without initializing them, unless `zeroed`.
    ///
    /// # Safety
    ///
    /// With `zeroed == false`, every slot must be written with
    /// [`set`](Array::set) before it is read.
    pub unsafe fn uninit(count: usize, zeroed: bool) -> Result<Self, ArrayError> {
        // SAFETY: forwarded from the caller.
        unsafe { Self::uninit_in(count, zeroed, Global) }
    }
}

impl<T: Element, A: Allocator> Array<T, A> {
    /// Create `count` zero-filled elements on `alloc`.
    ///
    /// Every slot is the empty state: zero bytes for inline types,
    /// `T::default()` for indirect ones. No per-element work is done.
    pub fn new_in(count: usize, alloc: A) -> Result<Self, ArrayError> {
        Self::allocate(count, true, alloc)
    }

    /// Create `count` elements on `alloc` where element `i` is `f(i)`.
    ///
    /// `f` is called in ascending index order.
    pub fn from_fn_in(
        count: usize,
        mut f: impl FnMut(usize) -> T,
        alloc: A,
    ) -> Result<Self, ArrayError> {
        let mut array = Self::allocate(count, false, alloc)?;
        for index in 0..count {
            element::store(&mut array.buf, index, f(index))?;
        }
        Ok(array)
    }

    /// Create `count` copies of `value` on `alloc`.
    ///
    /// A value whose representation is all-zero takes the zero-fill path.
    pub fn filled_in(count: usize, value: T, alloc: A) -> Result<Self, ArrayError>
    where
        T: Clone,
    {
        if element::is_zero(&value) {
            return Self::new_in(count, alloc);
        }
        let mut array = Self::allocate(count, false, alloc)?;
        for index in 0..count {
            element::store(&mut array.buf, index, value.clone())?;
        }
        Ok(array)
    }

    /// Create `count` elements on `alloc` without initializing them, unless `zeroed`.
    ///
    /// Types with [`Indirect`](crate::Indirect) slots are always zeroed so
    /// that no garbage handle can ever be released.
    ///
    /// # Safety
    ///
    /// With `zeroed == false`, every slot must be written with
    /// [`set`](Array::set) before it is read.
    pub unsafe fn uninit_in(count: usize, zeroed: bool, alloc: A) -> Result<Self, ArrayError> {
        Self::allocate(count, zeroed, alloc)
    }

    pub(crate) fn allocate(count: usize, zeroed: bool, alloc: A) -> Result<Self, ArrayError> {
        let zeroed = zeroed || element::is_indirect::<T>();
        let buf = RawBuffer::allocate(&alloc, count, zeroed)?;
        debug!(
            "array: allocated {count} elements ({} bytes, zeroed={zeroed})",
            buf.byte_len()
        );
        Ok(Self {
            buf,
            alloc,
            disposed: false,
            _owns: PhantomData,
        })
    }

    /// Number of elements. Zero after disposal.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Whether [`dispose`](Array::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// The allocator backing this array.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Size of the backing block in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.buf.byte_len()
    }

    /// Read the element at `index`.
    pub fn get(&self, index: usize) -> Result<T, ArrayError> {
        self.ensure_live()?;
        element::read::<T>(&self.buf, index)
    }

    /// Overwrite the element at `index`.
    ///
    /// For indirect types the previously pinned value is dropped first.
    pub fn set(&mut self, index: usize, value: T) -> Result<(), ArrayError> {
        self.ensure_live()?;
        element::store(&mut self.buf, index, value)
    }

    /// The first element, if any.
    pub fn first(&self) -> Option<T> {
        self.get(0).ok()
    }

    /// The last element, if any.
    pub fn last(&self) -> Option<T> {
        self.get(self.len().checked_sub(1)?).ok()
    }

    /// Overwrite every element with `value`.
    pub fn fill(&mut self, value: T) -> Result<(), ArrayError>
    where
        T: Clone,
    {
        self.ensure_live()?;
        for index in 0..self.len() {
            element::store(&mut self.buf, index, value.clone())?;
        }
        Ok(())
    }

    /// Base address of the slots, for handing to external code.
    ///
    /// Null when the array is empty or disposed. The pointer is invalidated
    /// by the next [`resize`](Array::resize) or [`dispose`](Array::dispose).
    pub fn as_ptr(&self) -> *const SlotOf<T> {
        if self.buf.is_empty() {
            ptr::null()
        } else {
            self.buf.as_ptr()
        }
    }

    /// Mutable base address of the slots. See [`as_ptr`](Array::as_ptr).
    pub fn as_mut_ptr(&mut self) -> *mut SlotOf<T> {
        if self.buf.is_empty() {
            ptr::null_mut()
        } else {
            self.buf.as_mut_ptr()
        }
    }

    /// Release the backing block and every pinned value.
    ///
    /// Idempotent. Afterwards `len()` is zero, `as_ptr()` is null and every
    /// fallible operation returns [`ArrayError::Disposed`].
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        let len = self.buf.len();
        element::release_range::<T>(&mut self.buf, 0..len);
        let buf = mem::replace(&mut self.buf, RawBuffer::empty());
        // SAFETY: buf was obtained from self.alloc and its handles were
        // released above; it is freed exactly once.
        unsafe { buf.free_in(&self.alloc) };
        self.disposed = true;
        debug!("array: disposed {len} elements");
    }

    pub(crate) fn ensure_live(&self) -> Result<(), ArrayError> {
        if self.disposed {
            return Err(ArrayError::Disposed);
        }
        Ok(())
    }
}

impl<T, A> Array<T, A>
where
    T: Element<Repr = Inline> + Pod,
    A: Allocator,
{
    /// View the elements as a slice. Empty after disposal.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: inline slots have the layout of T, and the buffer holds
        // `len` initialized slots (or is dangling with len 0).
        unsafe { slice::from_raw_parts(self.buf.as_ptr().cast::<T>(), self.len()) }
    }

    /// View the elements as a mutable slice. Empty after disposal.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        let len = self.len();
        // SAFETY: as for `as_slice`, with exclusive access through &mut self.
        unsafe { slice::from_raw_parts_mut(self.buf.as_mut_ptr().cast::<T>(), len) }
    }
}

impl<T: Element, A: Allocator> Drop for Array<T, A> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T: Element, A: Allocator> fmt::Debug for Array<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Array")
            .field("len", &self.len())
            .field("disposed", &self.disposed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offheap_test_utils::CountingAllocator;
    use std::rc::Rc;

    #[test]
    fn zero_fill_reads_default() {
        let array = Array::<i32>::new(1000).unwrap();
        assert_eq!(array.len(), 1000);
        assert!((0..1000).all(|i| array.get(i).unwrap() == 0));
    }

    #[test]
    fn zero_fill_indirect_reads_default() {
        let array = Array::<String>::new(3).unwrap();
        assert!((0..3).all(|i| array.get(i).unwrap().is_empty()));
    }

    #[test]
    fn generator_called_in_ascending_order() {
        let mut seen = Vec::new();
        let array = Array::<u64>::from_fn(5, |i| {
            seen.push(i);
            (i * i) as u64
        })
        .unwrap();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
        assert_eq!(array.get(3).unwrap(), 9);
    }

    #[test]
    fn repeat_with_uses_parameterless_generator() {
        let mut next = 10u8;
        let array = Array::<u8>::repeat_with(3, || {
            next += 1;
            next
        })
        .unwrap();
        assert_eq!(array.as_slice(), &[11, 12, 13]);
    }

    #[test]
    fn filled_writes_every_slot() {
        let array = Array::<i32>::filled(5, 15).unwrap();
        assert!(array.as_slice().iter().all(|&v| v == 15));
    }

    #[test]
    fn filled_with_zero_value_skips_writes() {
        let counting = CountingAllocator::new();
        let array = Array::<u32, _>::filled_in(8, 0, &counting).unwrap();
        assert_eq!(counting.zeroed_allocations(), 1);
        assert!(array.as_slice().iter().all(|&v| v == 0));
    }

    #[test]
    fn filled_with_nonzero_value_skips_zeroing() {
        let counting = CountingAllocator::new();
        let _array = Array::<u32, _>::filled_in(8, 3, &counting).unwrap();
        assert_eq!(counting.zeroed_allocations(), 0);
        assert_eq!(counting.allocations(), 1);
    }

    #[test]
    fn uninit_indirect_is_always_zeroed() {
        let counting = CountingAllocator::new();
        // SAFETY: indirect slots are zeroed regardless of the flag.
        let array = unsafe { Array::<String, _>::uninit_in(4, false, &counting) }.unwrap();
        assert_eq!(counting.zeroed_allocations(), 1);
        assert_eq!(array.get(3).unwrap(), "");
    }

    #[test]
    fn uninit_then_write_every_slot() {
        // SAFETY: every slot is written before it is read.
        let mut array = unsafe { Array::<f64>::uninit(4, false) }.unwrap();
        for i in 0..4 {
            array.set(i, i as f64 * 0.5).unwrap();
        }
        assert_eq!(array.as_slice(), &[0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn get_and_set_reject_out_of_range() {
        let mut array = Array::<u16>::new(3).unwrap();
        assert_eq!(
            array.get(3),
            Err(ArrayError::IndexOutOfBounds { index: 3, len: 3 })
        );
        assert_eq!(
            array.set(usize::MAX, 1),
            Err(ArrayError::IndexOutOfBounds {
                index: usize::MAX,
                len: 3
            })
        );
    }

    #[test]
    fn first_and_last() {
        let array = Array::<i64>::from_fn(13, |i| (i * i) as i64).unwrap();
        assert_eq!(array.first(), Some(0));
        assert_eq!(array.last(), Some(144));
        let empty = Array::<i64>::new(0).unwrap();
        assert_eq!(empty.first(), None);
        assert_eq!(empty.last(), None);
    }

    #[test]
    fn fill_overwrites_and_releases() {
        let old = Rc::new(String::from("old"));
        let mut array = Array::<Rc<String>>::filled(3, Rc::clone(&old)).unwrap();
        assert_eq!(Rc::strong_count(&old), 4);
        array.fill(Rc::new(String::from("new"))).unwrap();
        assert_eq!(Rc::strong_count(&old), 1);
        assert_eq!(array.get(2).unwrap().as_str(), "new");
    }

    #[test]
    fn dispose_clears_state_and_rejects_access() {
        let mut array = Array::<u32>::filled(4, 9).unwrap();
        array.dispose();
        assert_eq!(array.len(), 0);
        assert!(array.is_disposed());
        assert!(array.as_ptr().is_null());
        assert_eq!(array.get(0), Err(ArrayError::Disposed));
        assert_eq!(array.set(0, 1), Err(ArrayError::Disposed));
        assert!(array.as_slice().is_empty());
    }

    #[test]
    fn dispose_is_idempotent_and_frees_once() {
        let counting = CountingAllocator::new();
        {
            let mut array = Array::<u64, _>::new_in(16, &counting).unwrap();
            array.dispose();
            array.dispose();
            assert_eq!(counting.frees(), 1);
        }
        assert_eq!(counting.frees(), 1);
        assert_eq!(counting.live_blocks(), 0);
    }

    #[test]
    fn dispose_releases_pinned_values() {
        let tracked = Rc::new(7u32);
        let mut array = Array::<Rc<u32>>::filled(5, Rc::clone(&tracked)).unwrap();
        assert_eq!(Rc::strong_count(&tracked), 6);
        array.dispose();
        assert_eq!(Rc::strong_count(&tracked), 1);
    }

    #[test]
    fn drop_releases_everything() {
        let counting = CountingAllocator::new();
        let tracked = Rc::new(1u8);
        {
            let _array = Array::<Rc<u8>, _>::filled_in(3, Rc::clone(&tracked), &counting).unwrap();
        }
        assert_eq!(Rc::strong_count(&tracked), 1);
        assert_eq!(counting.live_blocks(), 0);
    }

    #[test]
    fn dispose_right_after_construction_is_safe() {
        let mut array = Array::<String>::new(0).unwrap();
        array.dispose();
        assert!(array.is_disposed());
    }

    #[test]
    fn as_ptr_exposes_slot_memory() {
        let mut array = Array::<u32>::from_fn(4, |i| i as u32).unwrap();
        let ptr = array.as_mut_ptr();
        // SAFETY: index 2 is in bounds and the array is live.
        unsafe { *ptr.add(2) = 99 };
        assert_eq!(array.get(2).unwrap(), 99);
    }

    #[cfg(unix)]
    #[test]
    fn heap_allocator_matches_global() {
        use offheap_alloc::Heap;

        let global = Array::<u64>::from_fn(64, |i| i as u64 * 3).unwrap();
        let heap = Array::<u64, _>::from_fn_in(64, |i| i as u64 * 3, Heap).unwrap();
        assert_eq!(global.as_slice(), heap.as_slice());
    }

    #[test]
    fn overflowing_count_is_invalid_argument() {
        let result = Array::<u64>::new(usize::MAX);
        assert!(matches!(result, Err(ArrayError::InvalidArgument { .. })));
    }

    #[test]
    fn debug_shows_length() {
        let array = Array::<u8>::new(3).unwrap();
        assert_eq!(format!("{array:?}"), "Array { len: 3, disposed: false }");
    }
}
