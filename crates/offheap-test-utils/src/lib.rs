//! Test utilities for offheap development.
//!
//! Provides instrumented [`Allocator`](offheap_alloc::Allocator)
//! implementations for exercising arrays in tests:
//! [`CountingAllocator`] records every call and tracks live blocks,
//! [`FailingAllocator`] refuses allocations on demand.

#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(unsafe_op_in_unsafe_fn)]

pub mod fixtures;

pub use fixtures::{CountingAllocator, FailingAllocator};
