//! Live-length iteration.
//!
//! Iteration never snapshots the length. Before producing the element at
//! the current position it reads the array's length afresh, then advances.
//! If the array shrinks mid-traversal, the remaining range shrinks with it.
//!
//! A borrowing [`Iter`] cannot observe mutation (the borrow checker forbids
//! it), so self-mutating traversal goes through a detached [`Cursor`] or
//! [`Array::fold_live`], whose step function receives `&mut Array`.

use std::iter::FusedIterator;

use offheap_alloc::Allocator;
use offheap_core::ArrayError;

use crate::array::Array;
use crate::element::Element;

/// A traversal position that is checked against the live length on every step.
///
/// The cursor holds no borrow, so the array can be mutated between steps.
///
/// A disposed array has length zero, so the cursor stops silently once
/// [`Array::dispose`] runs, exactly as it would at the end of an empty
/// array. Check [`Array::is_disposed`] to tell the two apart.
///
/// ```
/// use offheap_array::{Array, Cursor};
///
/// let mut array = Array::<u32>::filled(4, 1).unwrap();
/// let mut cursor = Cursor::new();
/// let mut visited = 0;
/// while let Some(_) = cursor.next(&array) {
///     visited += 1;
///     let len = array.len();
///     array.resize(len - 1).unwrap();
/// }
/// assert_eq!(visited, 2);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    position: usize,
}

impl Cursor {
    /// A cursor at index 0.
    pub fn new() -> Self {
        Self { position: 0 }
    }

    /// Index of the next element to be produced.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Produce the element at the current position and advance, or `None`
    /// if the position is at or past the array's current length.
    pub fn next<T: Element, A: Allocator>(&mut self, array: &Array<T, A>) -> Option<T> {
        if self.position >= array.len() {
            return None;
        }
        let item = array.get(self.position).ok()?;
        self.position += 1;
        Some(item)
    }
}

/// Borrowing iterator over an [`Array`], yielding elements by value.
pub struct Iter<'a, T: Element, A: Allocator> {
    array: &'a Array<T, A>,
    cursor: Cursor,
}

impl<'a, T: Element, A: Allocator> Iterator for Iter<'a, T, A> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.cursor.next(self.array)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.array.len().saturating_sub(self.cursor.position());
        (remaining, Some(remaining))
    }
}

impl<T: Element, A: Allocator> ExactSizeIterator for Iter<'_, T, A> {}

impl<T: Element, A: Allocator> FusedIterator for Iter<'_, T, A> {}

impl<'a, T: Element, A: Allocator> IntoIterator for &'a Array<T, A> {
    type Item = T;
    type IntoIter = Iter<'a, T, A>;

    fn into_iter(self) -> Iter<'a, T, A> {
        self.iter()
    }
}

impl<T: Element, A: Allocator> Array<T, A> {
    /// Iterate over the elements from index 0.
    ///
    /// Each call starts a fresh pass. A disposed array yields nothing
    /// rather than an error; see [`Cursor`].
    pub fn iter(&self) -> Iter<'_, T, A> {
        Iter {
            array: self,
            cursor: Cursor::new(),
        }
    }

    /// Fold over the elements while allowing `f` to mutate the array.
    ///
    /// Before each element the live length is consulted, so if `f` resizes
    /// the array the remaining bounds change immediately. Stops at the
    /// first error returned by `f`.
    ///
    /// ```
    /// use offheap_array::Array;
    ///
    /// let mut array = Array::<u32>::filled(5, 1).unwrap();
    /// let total = array
    ///     .fold_live(0, |array, total, item| {
    ///         let len = array.len();
    ///         array.resize(len - 1)?;
    ///         Ok(total + item)
    ///     })
    ///     .unwrap();
    /// assert_eq!(total, 3);
    /// ```
    pub fn fold_live<B, F>(&mut self, init: B, mut f: F) -> Result<B, ArrayError>
    where
        F: FnMut(&mut Self, B, T) -> Result<B, ArrayError>,
    {
        self.ensure_live()?;
        let mut cursor = Cursor::new();
        let mut acc = init;
        while let Some(item) = cursor.next(self) {
            acc = f(self, acc, item)?;
        }
        Ok(acc)
    }
}
