//! Adapter over the Rust global allocation API.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use log::{trace, warn};
use offheap_core::AllocError;

use crate::capability::{dangling, Allocator};

/// Allocates through `std::alloc`, i.e. whatever `#[global_allocator]` the
/// final binary installs.
///
/// This is the default allocator for `offheap_array::Array`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Global;

// SAFETY: `std::alloc::alloc{,_zeroed}` return blocks satisfying `layout`
// (or null, which is mapped to an error); zero-size layouts never reach them.
unsafe impl Allocator for Global {
    fn allocate(&self, layout: Layout, zeroed: bool) -> Result<NonNull<u8>, AllocError> {
        if layout.size() == 0 {
            return Ok(dangling(layout));
        }
        // SAFETY: layout has a non-zero size.
        let raw = unsafe {
            if zeroed {
                alloc::alloc_zeroed(layout)
            } else {
                alloc::alloc(layout)
            }
        };
        match NonNull::new(raw) {
            Some(ptr) => {
                trace!("global: allocated {} bytes at {:p}", layout.size(), ptr);
                Ok(ptr)
            }
            None => {
                warn!("global: allocation of {} bytes failed", layout.size());
                Err(AllocError {
                    requested_bytes: layout.size(),
                })
            }
        }
    }

    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() == 0 {
            return;
        }
        trace!("global: freeing {} bytes at {:p}", layout.size(), ptr);
        // SAFETY: the caller guarantees ptr/layout came from `allocate`.
        unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
    }
}
