//! Offheap: resizable contiguous arrays whose memory comes from a pluggable allocator.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the offheap sub-crates. For most users, adding `offheap` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use offheap::prelude::*;
//!
//! #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
//! #[bytemuck(crate = "offheap::bytemuck")]
//! #[repr(C)]
//! struct Particle {
//!     x: f32,
//!     y: f32,
//!     mass: f32,
//! }
//!
//! impl Element for Particle {
//!     type Repr = Inline;
//! }
//!
//! // Plain data is stored inline, straight in the allocated block.
//! let mut particles = Array::<Particle>::from_fn(4, |i| Particle {
//!     x: i as f32,
//!     y: 0.0,
//!     mass: 1.0,
//! })
//! .unwrap();
//! particles.resize(6).unwrap();
//! assert_eq!(particles.get(5).unwrap(), Particle::default());
//! assert_eq!(particles.as_slice()[3].x, 3.0);
//!
//! // Owned types are pinned behind handles in the slots.
//! let names: Array<String> = ["a", "b"].map(String::from).into_iter().collect_array().unwrap();
//! assert_eq!(names.get(1).unwrap(), "b");
//!
//! // Every access is checked.
//! assert!(matches!(
//!     names.get(2),
//!     Err(ArrayError::IndexOutOfBounds { index: 2, len: 2 })
//! ));
//! ```
//!
//! # Plain-data element types
//!
//! Inline elements are `bytemuck::Pod` types. The `Pod` / `Zeroable`
//! derives emit paths rooted at `::bytemuck`, so a crate that depends only
//! on `offheap` points them at the re-export with
//! `#[bytemuck(crate = "offheap::bytemuck")]`, as above. Crates with their
//! own `bytemuck` dependency can omit the attribute.
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `offheap-core` | Error and configuration types |
//! | [`alloc`] | `offheap-alloc` | The allocator capability and heap adapters |
//! | [`array`] | `offheap-array` | The array container, slot representations, iteration |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Error and configuration types (`offheap-core`).
pub use offheap_core as types;

/// The allocation capability and its adapters (`offheap-alloc`).
///
/// Implement [`alloc::Allocator`] to back arrays with a custom memory source;
/// [`alloc::Global`] is the default.
pub use offheap_alloc as alloc;

/// The array container (`offheap-array`).
///
/// Besides [`array::Array`], this exposes the slot representation machinery
/// ([`array::Element`], [`array::Repr`], [`array::Handle`]) and the raw
/// buffer type for allocator implementors who want to inspect layouts.
pub use offheap_array as array;

/// Plain-data marker traits and their derives, re-exported for
/// `#[bytemuck(crate = "offheap::bytemuck")]`.
pub use bytemuck;

/// Common imports for typical usage.
///
/// ```rust
/// use offheap::prelude::*;
/// ```
pub mod prelude {
    // Container
    pub use offheap_array::{collect_with, Array, CollectArray, Cursor};

    // Slot representation
    pub use offheap_array::{Element, Indirect, Inline};

    // Allocation
    pub use offheap_alloc::{Allocator, Global};

    // Errors and configuration
    pub use offheap_core::{AllocError, ArrayError, BuildConfig};

    // Deriving plain-data element types
    pub use bytemuck::{Pod, Zeroable};
}
