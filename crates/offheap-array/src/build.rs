//! Building arrays from iterators of unknown length.
//!
//! The builder grows the backing block geometrically as items arrive and
//! trims it to the exact count at the end, so an `n`-item input costs
//! `O(log n)` allocations rather than one per item.

use log::debug;
use offheap_alloc::{Allocator, Global};
use offheap_core::{ArrayError, BuildConfig};

use crate::array::Array;
use crate::element::Element;

/// Collect `iter` into an array on `alloc`, growing according to `config`.
///
/// The first block holds `max(lower size hint, initial_capacity)` slots,
/// so exact-size inputs are placed without any growth step.
pub fn collect_with<T, A, I>(iter: I, alloc: A, config: &BuildConfig) -> Result<Array<T, A>, ArrayError>
where
    T: Element,
    A: Allocator,
    I: IntoIterator<Item = T>,
{
    config.validate()?;
    let iter = iter.into_iter();
    let (lower, _) = iter.size_hint();
    let mut array = Array::new_in(lower.max(config.initial_capacity), alloc)?;
    let mut count = 0;
    for item in iter {
        if count == array.len() {
            let grown = config.grow(count);
            debug!("build: growing {count} -> {grown} slots");
            array.resize(grown)?;
        }
        array.set(count, item)?;
        count += 1;
    }
    array.resize(count)?;
    Ok(array)
}

impl<T: Element, A: Allocator> Array<T, A> {
    /// Collect `iter` into an array on `alloc` with the default [`BuildConfig`].
    pub fn from_iter_in<I: IntoIterator<Item = T>>(iter: I, alloc: A) -> Result<Self, ArrayError> {
        collect_with(iter, alloc, &BuildConfig::default())
    }
}

/// Extension for collecting any iterator into an [`Array`].
///
/// ```
/// use offheap_array::CollectArray;
///
/// let evens = (0..100u32).filter(|n| n % 2 == 0).collect_array().unwrap();
/// assert_eq!(evens.len(), 50);
/// assert_eq!(evens.get(49).unwrap(), 98);
/// ```
pub trait CollectArray: Iterator + Sized
where
    Self::Item: Element,
{
    /// Collect into an array on the global allocator.
    fn collect_array(self) -> Result<Array<Self::Item>, ArrayError> {
        Array::from_iter_in(self, Global)
    }

    /// Collect into an array on `alloc`.
    fn collect_array_in<A: Allocator>(self, alloc: A) -> Result<Array<Self::Item, A>, ArrayError> {
        Array::from_iter_in(self, alloc)
    }
}

impl<I> CollectArray for I
where
    I: Iterator,
    I::Item: Element,
{
}
