//! Adapter over the C heap (`malloc`/`calloc`/`free`).
//!
//! Blocks come from the process heap managed by libc rather than the Rust
//! global allocator, so they are invisible to any `#[global_allocator]`
//! instrumentation.

use std::alloc::Layout;
use std::mem;
use std::ptr::{self, NonNull};

use log::{trace, warn};
use offheap_core::AllocError;

use crate::capability::{dangling, Allocator};

/// Alignment `malloc` is guaranteed to provide on every supported target.
const MIN_ALIGN: usize = mem::size_of::<usize>();

/// Allocates from the C heap through `libc`.
///
/// Layouts aligned beyond the pointer size go through `posix_memalign`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Heap;

impl Heap {
    unsafe fn raw_alloc(layout: Layout, zeroed: bool) -> *mut u8 {
        let size = layout.size();
        if layout.align() <= MIN_ALIGN {
            // SAFETY: size is non-zero; the result is checked for null by the caller.
            return unsafe {
                if zeroed {
                    libc::calloc(size, 1) as *mut u8
                } else {
                    libc::malloc(size) as *mut u8
                }
            };
        }
        let mut out: *mut libc::c_void = ptr::null_mut();
        // SAFETY: align is a power of two and a multiple of the pointer size.
        let rc = unsafe { libc::posix_memalign(&mut out, layout.align(), size) };
        if rc != 0 || out.is_null() {
            return ptr::null_mut();
        }
        if zeroed {
            // SAFETY: out is a fresh block of `size` bytes.
            unsafe { ptr::write_bytes(out as *mut u8, 0, size) };
        }
        out as *mut u8
    }
}

// SAFETY: malloc/calloc return blocks aligned to at least MIN_ALIGN and
// posix_memalign honours the requested alignment; calloc and the explicit
// write_bytes zero the block when asked. Null results become errors.
unsafe impl Allocator for Heap {
    fn allocate(&self, layout: Layout, zeroed: bool) -> Result<NonNull<u8>, AllocError> {
        if layout.size() == 0 {
            return Ok(dangling(layout));
        }
        // SAFETY: layout has a non-zero size.
        let raw = unsafe { Self::raw_alloc(layout, zeroed) };
        match NonNull::new(raw) {
            Some(ptr) => {
                trace!("heap: allocated {} bytes at {:p}", layout.size(), ptr);
                Ok(ptr)
            }
            None => {
                warn!("heap: allocation of {} bytes failed", layout.size());
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
        trace!("heap: freeing {} bytes at {:p}", layout.size(), ptr);
        // SAFETY: ptr came from malloc/calloc/posix_memalign, all of which
        // are released with free.
        unsafe { libc::free(ptr.as_ptr() as *mut libc::c_void) }
    }

    unsafe fn copy_bytes(&self, dst: NonNull<u8>, src: NonNull<u8>, len: usize) {
        // SAFETY: the caller guarantees valid, non-overlapping ranges.
        unsafe {
            libc::memcpy(
                dst.as_ptr() as *mut libc::c_void,
                src.as_ptr() as *const libc::c_void,
                len,
            );
        }
    }
}
