//! Aligned scratch allocation for shuffle and codec temporaries.

use std::alloc::{alloc_zeroed, dealloc, handle_alloc_error, Layout};
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

/// Alignment of every scratch buffer. Vectorized shuffle kernels may
/// load and store whole lanes, so both ends of a transpose must sit on
/// a 16-byte boundary.
pub(crate) const SCRATCH_ALIGN: usize = 16;

/// A heap buffer aligned to [`SCRATCH_ALIGN`].
///
/// Unlike `Vec<u8>` the alignment is guaranteed, which the block
/// decompressor relies on when deciding whether it can unshuffle
/// straight into the caller's output. Not resizable.
pub(crate) struct AlignedBuf {
    ptr: NonNull<u8>,
    len: usize,
    cap: usize,
}

impl AlignedBuf {
    /// Allocate `len` zeroed bytes.
    pub(crate) fn zeroed(len: usize) -> AlignedBuf {
        // Zero-size layouts are not allocatable; keep one byte so the
        // pointer is always real and aligned.
        let cap = len.max(1);
        let layout = Layout::from_size_align(cap, SCRATCH_ALIGN).expect("scratch layout");
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = match NonNull::new(raw) {
            Some(p) => p,
            None => handle_alloc_error(layout),
        };
        AlignedBuf { ptr, len, cap }
    }
}

impl Deref for AlignedBuf {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl DerefMut for AlignedBuf {
    fn deref_mut(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for AlignedBuf {
    fn drop(&mut self) {
        let layout = Layout::from_size_align(self.cap, SCRATCH_ALIGN).expect("scratch layout");
        unsafe { dealloc(self.ptr.as_ptr(), layout) };
    }
}

// The buffer uniquely owns its allocation.
unsafe impl Send for AlignedBuf {}
