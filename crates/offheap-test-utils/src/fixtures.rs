//! Reusable allocator test fixtures.
//!
//! - [`CountingAllocator`]: forwards to an inner allocator and records
//!   allocations, frees, copied bytes and the set of live blocks.
//! - [`FailingAllocator`]: fails deterministically on demand.
//!
//! Both use interior mutability and are meant to be shared by reference
//! (`&CountingAllocator` is itself an allocator).

use std::alloc::Layout;
use std::cell::{Cell, RefCell};
use std::ptr::NonNull;

use indexmap::IndexMap;
use offheap_alloc::{Allocator, Global};
use offheap_core::AllocError;

/// Records every call made through it and forwards to `A`.
///
/// Live blocks are keyed by address, so a leak shows up as a non-zero
/// [`live_blocks`](CountingAllocator::live_blocks) and a bad free as a
/// non-zero [`unknown_frees`](CountingAllocator::unknown_frees).
pub struct CountingAllocator<A: Allocator = Global> {
    inner: A,
    live: RefCell<IndexMap<usize, Layout>>,
    allocations: Cell<usize>,
    zeroed_allocations: Cell<usize>,
    frees: Cell<usize>,
    unknown_frees: Cell<usize>,
    copied_bytes: Cell<usize>,
}

impl CountingAllocator {
    pub fn new() -> Self {
        Self::wrapping(Global)
    }
}

impl Default for CountingAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Allocator> CountingAllocator<A> {
    /// Count calls made through to `inner`.
    pub fn wrapping(inner: A) -> Self {
        Self {
            inner,
            live: RefCell::new(IndexMap::new()),
            allocations: Cell::new(0),
            zeroed_allocations: Cell::new(0),
            frees: Cell::new(0),
            unknown_frees: Cell::new(0),
            copied_bytes: Cell::new(0),
        }
    }

    /// Successful non-empty allocations, zeroed or not.
    pub fn allocations(&self) -> usize {
        self.allocations.get()
    }

    /// Successful non-empty allocations that requested zero-fill.
    pub fn zeroed_allocations(&self) -> usize {
        self.zeroed_allocations.get()
    }

    pub fn frees(&self) -> usize {
        self.frees.get()
    }

    /// Frees of addresses this allocator never handed out (or already freed).
    pub fn unknown_frees(&self) -> usize {
        self.unknown_frees.get()
    }

    /// Blocks allocated and not yet freed.
    pub fn live_blocks(&self) -> usize {
        self.live.borrow().len()
    }

    /// Total bytes of all live blocks.
    pub fn live_bytes(&self) -> usize {
        self.live.borrow().values().map(Layout::size).sum()
    }

    /// Bytes moved through [`Allocator::copy_bytes`].
    pub fn copied_bytes(&self) -> usize {
        self.copied_bytes.get()
    }
}

// SAFETY: every block comes from `inner`, which upholds the contract;
// bookkeeping never touches block contents.
unsafe impl<A: Allocator> Allocator for CountingAllocator<A> {
    fn allocate(&self, layout: Layout, zeroed: bool) -> Result<NonNull<u8>, AllocError> {
        let ptr = self.inner.allocate(layout, zeroed)?;
        if layout.size() != 0 {
            self.allocations.set(self.allocations.get() + 1);
            if zeroed {
                self.zeroed_allocations.set(self.zeroed_allocations.get() + 1);
            }
            self.live.borrow_mut().insert(ptr.as_ptr() as usize, layout);
        }
        Ok(ptr)
    }

    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() != 0 {
            self.frees.set(self.frees.get() + 1);
            let known = self.live.borrow_mut().shift_remove(&(ptr.as_ptr() as usize));
            if known != Some(layout) {
                self.unknown_frees.set(self.unknown_frees.get() + 1);
                return;
            }
        }
        // SAFETY: forwarded from the caller; the block was live in `inner`.
        unsafe { self.inner.free(ptr, layout) }
    }

    unsafe fn copy_bytes(&self, dst: NonNull<u8>, src: NonNull<u8>, len: usize) {
        self.copied_bytes.set(self.copied_bytes.get() + len);
        // SAFETY: forwarded from the caller.
        unsafe { self.inner.copy_bytes(dst, src, len) }
    }
}

/// Allocates from [`Global`] until told to fail.
///
/// A failure reports the requested byte count, as a real out-of-memory
/// condition would. Frees and copies always succeed.
#[derive(Default)]
pub struct FailingAllocator {
    /// Successful allocations left before the next failure, if armed.
    countdown: Cell<Option<usize>>,
    failures: Cell<usize>,
}

impl FailingAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the very next allocation, then recover.
    pub fn fail_next(&self) {
        self.fail_after(0);
    }

    /// Let `successes` allocations through, fail the one after, then recover.
    pub fn fail_after(&self, successes: usize) {
        self.countdown.set(Some(successes));
    }

    /// Disarm any pending failure.
    pub fn reset(&self) {
        self.countdown.set(None);
    }

    /// Allocations refused so far.
    pub fn failures(&self) -> usize {
        self.failures.get()
    }
}

// SAFETY: successful allocations come straight from `Global`.
unsafe impl Allocator for FailingAllocator {
    fn allocate(&self, layout: Layout, zeroed: bool) -> Result<NonNull<u8>, AllocError> {
        match self.countdown.get() {
            Some(0) => {
                self.countdown.set(None);
                self.failures.set(self.failures.get() + 1);
                return Err(AllocError {
                    requested_bytes: layout.size(),
                });
            }
            Some(n) => self.countdown.set(Some(n - 1)),
            None => {}
        }
        Global.allocate(layout, zeroed)
    }

    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: every block handed out came from `Global`.
        unsafe { Global.free(ptr, layout) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counting_tracks_live_blocks() {
        let counting = CountingAllocator::new();
        let layout = Layout::array::<u32>(4).unwrap();
        let a = counting.allocate(layout, true).unwrap();
        let b = counting.allocate(layout, false).unwrap();
        assert_eq!(counting.allocations(), 2);
        assert_eq!(counting.zeroed_allocations(), 1);
        assert_eq!(counting.live_blocks(), 2);
        assert_eq!(counting.live_bytes(), 32);
        // SAFETY: both blocks are live, same layout, freed once each.
        unsafe {
            counting.free(a, layout);
            counting.free(b, layout);
        }
        assert_eq!(counting.frees(), 2);
        assert_eq!(counting.live_blocks(), 0);
        assert_eq!(counting.unknown_frees(), 0);
    }

    #[test]
    fn counting_ignores_zero_size_blocks() {
        let counting = CountingAllocator::new();
        let layout = Layout::array::<u64>(0).unwrap();
        let ptr = counting.allocate(layout, true).unwrap();
        // SAFETY: zero-size blocks are accepted and ignored by free.
        unsafe { counting.free(ptr, layout) };
        assert_eq!(counting.allocations(), 0);
        assert_eq!(counting.frees(), 0);
    }

    #[test]
    fn counting_records_copied_bytes() {
        let counting = CountingAllocator::new();
        let layout = Layout::array::<u8>(8).unwrap();
        let src = counting.allocate(layout, true).unwrap();
        let dst = counting.allocate(layout, false).unwrap();
        // SAFETY: both blocks are live, 8 bytes, and distinct.
        unsafe {
            counting.copy_bytes(dst, src, 8);
            counting.free(src, layout);
            counting.free(dst, layout);
        }
        assert_eq!(counting.copied_bytes(), 8);
    }

    #[test]
    fn failing_fails_once_then_recovers() {
        let failing = FailingAllocator::new();
        let layout = Layout::array::<u16>(10).unwrap();
        failing.fail_next();
        assert_eq!(
            failing.allocate(layout, false),
            Err(AllocError { requested_bytes: 20 })
        );
        let ptr = failing.allocate(layout, false).unwrap();
        // SAFETY: live block from this allocator.
        unsafe { failing.free(ptr, layout) };
        assert_eq!(failing.failures(), 1);
    }

    #[test]
    fn failing_after_n_successes() {
        let failing = FailingAllocator::new();
        let layout = Layout::new::<u64>();
        failing.fail_after(2);
        let a = failing.allocate(layout, true).unwrap();
        let b = failing.allocate(layout, true).unwrap();
        assert!(failing.allocate(layout, true).is_err());
        // SAFETY: live blocks from this allocator.
        unsafe {
            failing.free(a, layout);
            failing.free(b, layout);
        }
    }
}
