//! Error and configuration types for the offheap workspace.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! error taxonomy shared by the allocation capability and the array
//! container, plus the tunables of the bulk-build helper.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;

pub use config::BuildConfig;
pub use error::{AllocError, ArrayError};
