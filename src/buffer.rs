//! Aligned backing storage for the numeric containers.
//!
//! Every `Vector` and `Matrix` in this crate owns exactly one
//! [`AlignedBuffer`]: a fixed-size block of `f32`s allocated at a 16-byte
//! boundary so the lane-width kernels can assume aligned loads/stores.
//!
//! Ownership is strict: the type is move-only (no `Clone`), it frees its
//! block exactly once, and [`AlignedBuffer::release`] is idempotent, so a
//! double free is structurally impossible.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::{Error, Result};

/// Byte alignment required by the lane-width kernels.
pub const ALIGNMENT: usize = 16;

/// A fixed-size, 16-byte-aligned block of `f32` memory.
///
/// The buffer is never resized. Contents are zero-initialized.
#[derive(Debug)]
pub struct AlignedBuffer {
    ptr: NonNull<f32>,
    len: usize,
}

// The buffer is uniquely owned; access is governed by &/&mut like a Vec.
unsafe impl Send for AlignedBuffer {}
unsafe impl Sync for AlignedBuffer {}

impl AlignedBuffer {
    /// Allocate a zeroed buffer of `len` floats.
    ///
    /// Returns `AllocationFailure` if the allocator refuses, or
    /// `InvalidConfig` for a zero length (a buffer always backs at least one
    /// element of real storage).
    pub fn zeroed(len: usize) -> Result<Self> {
        if len == 0 {
            return Err(Error::InvalidConfig(
                "buffer length must be > 0".to_owned(),
            ));
        }

        let layout = Layout::from_size_align(len * std::mem::size_of::<f32>(), ALIGNMENT)
            .map_err(|e| Error::AllocationFailure(format!("bad layout for {len} floats: {e}")))?;

        // Zeroed so fresh vectors/matrices start in a defined state.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw.cast::<f32>()).ok_or_else(|| {
            Error::AllocationFailure(format!("aligned allocation of {len} floats failed"))
        })?;

        Ok(Self { ptr, len })
    }

    /// Number of floats in the buffer. Zero after release.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True once the buffer has been released.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Set every element to zero.
    #[inline]
    pub fn clear(&mut self) {
        self.as_mut_slice().fill(0.0);
    }

    /// Free the block. Safe to call more than once; the second call is a
    /// no-op. After release the buffer is empty and no longer addressable.
    pub fn release(&mut self) {
        if self.len == 0 {
            return;
        }
        let layout = Layout::from_size_align(self.len * std::mem::size_of::<f32>(), ALIGNMENT)
            .expect("layout was validated at allocation");
        unsafe {
            alloc::dealloc(self.ptr.as_ptr().cast::<u8>(), layout);
        }
        self.ptr = NonNull::dangling();
        self.len = 0;
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        self.release();
    }
}
