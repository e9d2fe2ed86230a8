//! Resizable contiguous arrays whose storage comes from a pluggable allocator.
//!
//! An [`Array`] owns one block of raw memory obtained through an
//! [`Allocator`] and never relies on an implicit heap for its slots. It
//! offers checked indexing, several construction policies, resize, bulk
//! copy and iteration, and releases its block explicitly through
//! [`Array::dispose`] or implicitly on drop.
//!
//! # Architecture
//!
//! ```text
//! Array<T, A> (container, sole entry point)
//! ├── RawBuffer<Slot>   : owned block + element count, stride = size_of::<Slot>()
//! ├── A: Allocator      : allocate / free / copy_bytes
//! └── element accessor  : index → slot address, read/write by representation
//!     ├── Inline        : plain `Pod` values stored as raw bytes
//!     └── Indirect      : Handle<T> pointing at a separately pinned object
//! ```
//!
//! # Slot representation
//!
//! The representation is chosen per type through [`Element::Repr`], so the
//! branch is resolved at compile time and never tested per access. A slot
//! of all-zero bytes is always the empty state: `0` for inline values and
//! "no handle" (read back as `T::default()`) for indirect ones.
//!
//! # Iteration under mutation
//!
//! Iteration re-reads the live length before every element. See
//! [`Cursor`] and [`Array::fold_live`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(unsafe_op_in_unsafe_fn)]

mod array;
pub mod buffer;
pub mod build;
pub mod element;
pub mod iter;
mod resize;

pub use array::Array;
pub use build::{collect_with, CollectArray};
pub use element::{Element, Handle, Indirect, Inline, Repr, SlotOf};
pub use iter::{Cursor, Iter};
pub use offheap_alloc::{Allocator, Global};
pub use offheap_core::{ArrayError, BuildConfig};
