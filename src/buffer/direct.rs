use std::alloc::{self, Layout};
use std::fmt;
use std::ptr::NonNull;

use super::ExternalBuffer;
use crate::{Error, Result};

const ALIGN: usize = 64;

/// A fixed-size allocation outside any managed heap.
///
/// The address never changes for the lifetime of the value, so it can be handed
/// to native code without pinning.
pub struct OffHeapBuffer {
    ptr: NonNull<u8>,
    capacity: usize,
    read_only: bool,
}

// SAFETY: the allocation is exclusively owned; shared access only reads or goes
// through the engine under `&mut`-equivalent exclusivity of a single call.
unsafe impl Send for OffHeapBuffer {}

impl OffHeapBuffer {
    /// Allocates `capacity` zeroed bytes.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Ok(Self {
                ptr: NonNull::dangling(),
                capacity,
                read_only: false,
            });
        }
        let layout = Self::layout(capacity)?;
        // SAFETY: layout has non-zero size.
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(ptr).ok_or(Error::OutOfMemory("off-heap buffer allocation"))?;
        Ok(Self {
            ptr,
            capacity,
            read_only: false,
        })
    }

    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let mut buffer = Self::new(data.len())?;
        buffer.as_mut_slice().copy_from_slice(data);
        Ok(buffer)
    }

    fn layout(capacity: usize) -> Result<Layout> {
        Layout::from_size_align(capacity, ALIGN)
            .map_err(|_| Error::OutOfMemory("off-heap buffer layout"))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Marks the buffer as read-only, so it is refused as an output region.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: `ptr` is valid for `capacity` bytes and `&mut self` is exclusive.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.capacity) }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        // SAFETY: `ptr` is valid for `capacity` initialised bytes.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.capacity) }.to_vec()
    }
}

impl Drop for OffHeapBuffer {
    fn drop(&mut self) {
        if self.capacity == 0 {
            return;
        }
        if let Ok(layout) = Self::layout(self.capacity) {
            // SAFETY: allocated in `new` with this exact layout.
            unsafe { alloc::dealloc(self.ptr.as_ptr(), layout) };
        }
    }
}

impl fmt::Debug for OffHeapBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OffHeapBuffer")
            .field("capacity", &self.capacity)
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}

// SAFETY: `ptr` is valid for `capacity` bytes until drop and never moves.
unsafe impl ExternalBuffer for OffHeapBuffer {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn address(&self) -> Option<NonNull<u8>> {
        Some(self.ptr)
    }

    fn writable(&self) -> bool {
        !self.read_only
    }
}
