//! Page-aligned transfer buffers.
//!
//! [`AlignedBuffer`] over-allocates by one alignment unit from the global
//! allocator and exposes the first aligned window inside that block. The
//! raw allocation and its layout are kept alongside the aligned view, so
//! dropping the buffer releases the whole block exactly once.

use crate::block_size::page_size;

use std::alloc::{self, Layout};
use std::io;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::slice;

/// An owned, zero-initialized byte buffer whose start address is aligned.
///
/// # Example
///
/// ```
/// use blkcat::{page_size, AlignedBuffer};
///
/// let buf = AlignedBuffer::new(8192).unwrap();
/// assert_eq!(buf.len(), 8192);
/// assert_eq!(buf.as_ptr() as usize % page_size(), 0);
/// ```
pub struct AlignedBuffer {
    /// Start of the underlying allocation.
    raw: NonNull<u8>,
    /// Layout of the underlying allocation (`len + alignment` bytes).
    layout: Layout,
    /// Distance from `raw` to the aligned start; always `< alignment`.
    offset: usize,
    len: usize,
    alignment: usize,
}

impl AlignedBuffer {
    /// Allocate a page-aligned buffer of `len` bytes.
    ///
    /// A zero `len` is allowed: the page of slack is still allocated and
    /// the (empty) buffer still starts on a page boundary.
    pub fn new(len: usize) -> io::Result<Self> {
        Self::with_alignment(len, page_size())
    }

    /// Allocate a buffer of `len` bytes aligned to `alignment`.
    ///
    /// `alignment` must be a power of two. Fails with
    /// [`io::ErrorKind::OutOfMemory`] if the allocator cannot satisfy the
    /// request.
    pub fn with_alignment(len: usize, alignment: usize) -> io::Result<Self> {
        if !alignment.is_power_of_two() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("alignment {} is not a power of two", alignment),
            ));
        }

        let total = len.checked_add(alignment).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "buffer size overflows usize")
        })?;
        let layout = Layout::from_size_align(total, 1)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        // SAFETY: `layout` has a non-zero size because `alignment >= 1`.
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        let raw = NonNull::new(ptr).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::OutOfMemory,
                format!("failed to allocate {} bytes", total),
            )
        })?;

        let addr = raw.as_ptr() as usize;
        let aligned = (addr + alignment - 1) & !(alignment - 1);
        let offset = aligned - addr;

        Ok(Self {
            raw,
            layout,
            offset,
            len,
            alignment,
        })
    }

    /// Get a pointer to the aligned start of the buffer.
    pub fn as_ptr(&self) -> *const u8 {
        // SAFETY: `offset < alignment`, so the result stays inside the allocation.
        unsafe { self.raw.as_ptr().add(self.offset) }
    }

    /// Get a mutable pointer to the aligned start of the buffer.
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        // SAFETY: see `as_ptr`.
        unsafe { self.raw.as_ptr().add(self.offset) }
    }

    /// Number of usable bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer has no usable bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Alignment of the buffer start in bytes.
    pub fn alignment(&self) -> usize {
        self.alignment
    }
}

impl Deref for AlignedBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        // SAFETY: `offset + len <= layout.size()` and the memory was zeroed on
        // allocation. The borrow is tied to `&self`.
        unsafe { slice::from_raw_parts(self.as_ptr(), self.len) }
    }
}

impl DerefMut for AlignedBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        // SAFETY: as in `deref`; `&mut self` guarantees exclusive access.
        unsafe { slice::from_raw_parts_mut(self.as_mut_ptr(), self.len) }
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        // SAFETY: `raw` was returned by `alloc_zeroed` with exactly `layout`
        // and is released only here.
        unsafe { alloc::dealloc(self.raw.as_ptr(), self.layout) };
    }
}

impl std::fmt::Debug for AlignedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("ptr", &self.as_ptr())
            .field("len", &self.len)
            .field("alignment", &self.alignment)
            .finish()
    }
}

// SAFETY: the buffer exclusively owns its allocation.
unsafe impl Send for AlignedBuffer {}
unsafe impl Sync for AlignedBuffer {}
