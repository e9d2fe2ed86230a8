//! Element representation and slot access.
//!
//! Every element type picks a slot layout through [`Element::Repr`]:
//!
//! - [`Inline`] stores a plain `Pod` value's bytes directly in the slot.
//! - [`Indirect`] stores a [`Handle`] in the slot, pointing at the value
//!   pinned in its own heap allocation. Overwriting or truncating a slot
//!   releases the old handle; disposal releases all of them.
//!
//! In both layouts a zero-filled slot is the empty state, so a zero-init
//! allocation is a valid array without per-element work.
//!
//! ```
//! use offheap_array::{Array, Element, Inline};
//!
//! #[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
//! #[repr(C)]
//! struct Point {
//!     x: f32,
//!     y: f32,
//! }
//!
//! impl Element for Point {
//!     type Repr = Inline;
//! }
//!
//! let points = Array::<Point>::filled(3, Point { x: 1.0, y: 2.0 }).unwrap();
//! assert_eq!(points.get(2).unwrap().y, 2.0);
//! ```

use std::fmt;
use std::ops::Range;
use std::ptr::NonNull;
use std::rc::Rc;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use offheap_core::ArrayError;

use crate::buffer::RawBuffer;

/// A type that can be stored in an [`Array`](crate::Array).
///
/// Implementations only choose the slot representation:
///
/// - `type Repr = Inline;` for plain-old-data types (`T: bytemuck::Pod`).
/// - `type Repr = Indirect;` for types that own heap data or have a
///   destructor (`T: Clone + Default + PartialEq`).
pub trait Element: Sized {
    /// How values of this type are laid out in a slot.
    type Repr: Repr<Self>;
}

/// The slot type used for `T`.
pub type SlotOf<T> = <<T as Element>::Repr as Repr<T>>::Slot;

/// A slot representation for values of type `T`.
///
/// # Safety
///
/// - An all-zero `Slot` must be a valid slot that decodes to the empty
///   state and whose release is a no-op.
/// - If `INDIRECT` is false, `Slot` must have the same layout as `T`,
///   `encode`/`decode` must be bitwise copies, and `release` a no-op, so
///   slots can be copied to and from `[T]` as raw bytes.
/// - If `INDIRECT` is true, a slot must own whatever `encode` allocated
///   until `release` is called on it, and copying a slot bitwise must
///   transfer that ownership.
pub unsafe trait Repr<T> {
    /// The raw contents of one slot.
    type Slot: Copy + Zeroable;

    /// Whether slots hold handles that must be released.
    const INDIRECT: bool;

    /// Whether `value` is represented by an all-zero slot.
    fn is_zero(value: &T) -> bool;

    /// Turn a value into slot contents.
    fn encode(value: T) -> Self::Slot;

    /// Read a value out of a slot without consuming it.
    ///
    /// # Safety
    ///
    /// `slot` must be all-zero or hold the result of [`encode`](Repr::encode)
    /// that has not been released.
    unsafe fn decode(slot: &Self::Slot) -> T;

    /// Release whatever the slot owns and reset it to zero.
    ///
    /// # Safety
    ///
    /// Same as [`decode`](Repr::decode).
    unsafe fn release(slot: &mut Self::Slot);
}

/// Plain values stored inline as raw bytes.
#[derive(Clone, Copy, Debug)]
pub enum Inline {}

/// Values pinned in their own allocation and referenced from the slot.
#[derive(Clone, Copy, Debug)]
pub enum Indirect {}

// SAFETY: Slot = T and T: Pod, so zero bytes are a valid T, the layouts
// match, and encode/decode are plain copies with nothing to release.
unsafe impl<T: Pod> Repr<T> for Inline {
    type Slot = T;

    const INDIRECT: bool = false;

    fn is_zero(value: &T) -> bool {
        bytemuck::bytes_of(value).iter().all(|&b| b == 0)
    }

    fn encode(value: T) -> T {
        value
    }

    unsafe fn decode(slot: &T) -> T {
        *slot
    }

    unsafe fn release(_slot: &mut T) {}
}

// SAFETY: a zero Handle is `None`, which decodes to `T::default()` and
// releases nothing. A non-zero handle owns one boxed T; bitwise copies move
// that pointer, and release frees it exactly once before zeroing the slot.
unsafe impl<T: Clone + Default + PartialEq> Repr<T> for Indirect {
    type Slot = Handle<T>;

    const INDIRECT: bool = true;

    fn is_zero(value: &T) -> bool {
        *value == T::default()
    }

    fn encode(value: T) -> Handle<T> {
        Handle::pin(value)
    }

    unsafe fn decode(slot: &Handle<T>) -> T {
        // SAFETY: forwarded from the caller.
        match unsafe { slot.get() } {
            Some(value) => value.clone(),
            None => T::default(),
        }
    }

    unsafe fn release(slot: &mut Handle<T>) {
        // SAFETY: forwarded from the caller.
        unsafe { slot.release() }
    }
}

/// A slot-sized reference to a value pinned in its own heap allocation.
///
/// The zero bit pattern is the empty handle. A handle is a raw owner: it
/// is `Copy` so it can live in raw slot memory, and the array is
/// responsible for releasing it exactly once.
#[repr(transparent)]
pub struct Handle<T>(Option<NonNull<T>>);

impl<T> Handle<T> {
    /// The empty handle.
    pub const EMPTY: Self = Self(None);

    /// Move `value` into a new allocation and return a handle to it.
    pub fn pin(value: T) -> Self {
        Self(Some(NonNull::from(Box::leak(Box::new(value)))))
    }

    /// Whether this handle refers to nothing.
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Borrow the pinned value.
    ///
    /// # Safety
    ///
    /// The handle must be empty or not yet released, and the returned
    /// reference must not outlive the release.
    pub unsafe fn get<'a>(&self) -> Option<&'a T> {
        // SAFETY: a live handle points at a leaked Box<T>.
        self.0.map(|ptr| unsafe { &*ptr.as_ptr() })
    }

    /// Drop the pinned value and reset this handle to empty.
    ///
    /// # Safety
    ///
    /// No other copy of this handle may be released or used afterwards.
    pub unsafe fn release(&mut self) {
        if let Some(ptr) = self.0.take() {
            // SAFETY: ptr came from Box::leak in `pin` and is released once.
            drop(unsafe { Box::from_raw(ptr.as_ptr()) });
        }
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

// SAFETY: Option<NonNull<T>> is guaranteed to use the null niche, so all
// zero bytes is `None`.
unsafe impl<T> Zeroable for Handle<T> {}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(ptr) => write!(f, "Handle({ptr:p})"),
            None => write!(f, "Handle(empty)"),
        }
    }
}

macro_rules! inline_elements {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Element for $ty {
                type Repr = Inline;
            }
        )*
    };
}

inline_elements!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

impl<T: Pod, const N: usize> Element for [T; N] {
    type Repr = Inline;
}

impl Element for String {
    type Repr = Indirect;
}

impl<U: Clone + PartialEq> Element for Vec<U> {
    type Repr = Indirect;
}

impl<U: Clone + Default + PartialEq> Element for Box<U> {
    type Repr = Indirect;
}

impl<U: Clone + PartialEq> Element for Option<U> {
    type Repr = Indirect;
}

impl<U: Default + PartialEq> Element for Rc<U> {
    type Repr = Indirect;
}

impl<U: Default + PartialEq> Element for Arc<U> {
    type Repr = Indirect;
}

// ── slot access ─────────────────────────────────────────────

/// Read the element at `index`.
pub(crate) fn read<T: Element>(buf: &RawBuffer<SlotOf<T>>, index: usize) -> Result<T, ArrayError> {
    let slot = buf.slot(index)?;
    // SAFETY: the slot is in bounds, and array slots are always zero or
    // hold an unreleased encoded value.
    Ok(unsafe { <T::Repr as Repr<T>>::decode(slot.as_ref()) })
}

/// Write `value` at `index`, releasing whatever the slot held before.
pub(crate) fn store<T: Element>(
    buf: &mut RawBuffer<SlotOf<T>>,
    index: usize,
    value: T,
) -> Result<(), ArrayError> {
    let mut slot = buf.slot(index)?;
    // SAFETY: in bounds and exclusively borrowed through `buf`.
    let slot = unsafe { slot.as_mut() };
    // SAFETY: array slots are zero or hold an unreleased encoded value.
    unsafe { <T::Repr as Repr<T>>::release(slot) };
    *slot = <T::Repr as Repr<T>>::encode(value);
    Ok(())
}

/// Release the slots in `range`. A no-op for inline representations.
pub(crate) fn release_range<T: Element>(buf: &mut RawBuffer<SlotOf<T>>, range: Range<usize>) {
    if !<T::Repr as Repr<T>>::INDIRECT {
        return;
    }
    for index in range {
        let Ok(mut slot) = buf.slot(index) else {
            break;
        };
        // SAFETY: in bounds, exclusively borrowed, zero or unreleased.
        unsafe { <T::Repr as Repr<T>>::release(slot.as_mut()) };
    }
}

/// Whether `value` would be stored as an all-zero slot.
pub(crate) fn is_zero<T: Element>(value: &T) -> bool {
    <T::Repr as Repr<T>>::is_zero(value)
}

/// Whether `T` uses handle slots.
pub(crate) const fn is_indirect<T: Element>() -> bool {
    <T::Repr as Repr<T>>::INDIRECT
}
