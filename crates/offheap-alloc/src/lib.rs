//! Pluggable allocation capability for offheap arrays.
//!
//! The container never talks to an OS or language allocator directly. It
//! drives an [`Allocator`]: a three-operation contract (allocate, free,
//! copy bytes) implemented by thin backend adapters.
//!
//! ```text
//! Allocator (unsafe trait)
//! ├── Global  : std::alloc (the Rust global allocation API)
//! ├── Heap    : the C heap through libc (unix only)
//! └── &A      : forwards to A, so one allocator can back many arrays
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(unsafe_op_in_unsafe_fn)]

pub mod capability;
pub mod global;
#[cfg(unix)]
pub mod heap;

pub use capability::Allocator;
pub use global::Global;
#[cfg(unix)]
pub use heap::Heap;
pub use offheap_core::AllocError;
