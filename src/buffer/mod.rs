//! Buffer regions and the two ways a host hands memory to the engine.
//!
//! A [`Region`] is a `(buffer, offset, len)` triple over one of two buffer kinds:
//!
//! - [`ManagedArray`]: memory owned by a host runtime that may relocate it. Its
//!   address only exists inside a *critical section*, entered on acquisition and
//!   left on release. While any managed array is acquired, the thread must not
//!   allocate, call back into the host, or block.
//! - [`ExternalBuffer`]: memory with a fixed native address for as long as the
//!   buffer object is borrowed. No pinning, but the address may be missing.
//!
//! Regions are resolved to raw addresses only by the crate's mediator, which
//! releases them again on every exit path.

mod critical;
mod direct;
mod heap;

use std::fmt;
use std::ptr::NonNull;

pub(crate) use critical::with_pair;
pub use critical::in_critical_section;
pub(crate) use critical::with_region;
pub use direct::OffHeapBuffer;
pub use heap::HeapBuffer;

use crate::{Error, Result};

/// How a managed array is handed back to its runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReleaseMode {
    /// The region was only read; the runtime may skip copying it back.
    Discard,
    /// The region was written; changes must become visible to the runtime.
    Commit,
}

/// The closed set of buffer kinds a region can live in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferKind {
    Managed,
    External,
}

/// A byte array whose lifetime and address are controlled by a host runtime.
///
/// # Safety
///
/// Implementors guarantee that a pointer returned by
/// [`enter_critical`](ManagedArray::enter_critical) is valid for reads and writes
/// of [`capacity`](ManagedArray::capacity) bytes, and is not touched by anyone
/// else, until the matching [`exit_critical`](ManagedArray::exit_critical).
pub unsafe trait ManagedArray {
    fn capacity(&self) -> usize;

    /// Pins the array and returns its base address, or `None` when the runtime
    /// is out of resources.
    ///
    /// # Safety
    ///
    /// Every `Some` must be paired with exactly one `exit_critical` using the
    /// same base. Between the two the caller must not allocate, call into the
    /// host runtime, or block.
    unsafe fn enter_critical(&self) -> Option<NonNull<u8>>;

    /// Unpins the array. With [`ReleaseMode::Commit`] writes made through the
    /// base pointer are published to the runtime.
    ///
    /// # Safety
    ///
    /// `base` must come from the matching `enter_critical` on `self`.
    unsafe fn exit_critical(&self, base: NonNull<u8>, mode: ReleaseMode);
}

/// Memory with a stable native address that lives outside any managed heap.
///
/// # Safety
///
/// When [`address`](ExternalBuffer::address) returns `Some`, the pointer must be
/// valid for reads of [`capacity`](ExternalBuffer::capacity) bytes for as long as
/// `self` is borrowed, and valid for writes as well if
/// [`writable`](ExternalBuffer::writable) returns `true`.
pub unsafe trait ExternalBuffer {
    fn capacity(&self) -> usize;

    /// The native address, or `None` if the object is not really backed by
    /// off-heap memory.
    fn address(&self) -> Option<NonNull<u8>>;

    fn writable(&self) -> bool {
        true
    }
}

/// A borrowed buffer of either kind.
#[derive(Clone, Copy)]
pub enum Buffer<'a> {
    Managed(&'a dyn ManagedArray),
    External(&'a dyn ExternalBuffer),
}

impl<'a> Buffer<'a> {
    pub fn managed(array: &'a impl ManagedArray) -> Self {
        Buffer::Managed(array)
    }

    pub fn external(buffer: &'a impl ExternalBuffer) -> Self {
        Buffer::External(buffer)
    }

    pub fn kind(&self) -> BufferKind {
        match self {
            Buffer::Managed(_) => BufferKind::Managed,
            Buffer::External(_) => BufferKind::External,
        }
    }

    pub fn capacity(&self) -> usize {
        match self {
            Buffer::Managed(a) => a.capacity(),
            Buffer::External(b) => b.capacity(),
        }
    }
}

impl fmt::Debug for Buffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("kind", &self.kind())
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// A contiguous byte range inside a [`Buffer`].
///
/// `offset + len <= capacity` holds for every region; it is checked once at
/// construction and assumed everywhere below.
#[derive(Clone, Copy, Debug)]
pub struct Region<'a> {
    buffer: Buffer<'a>,
    offset: usize,
    len: usize,
}

impl<'a> Region<'a> {
    pub fn new(buffer: Buffer<'a>, offset: usize, len: usize) -> Result<Self> {
        check_bounds(buffer.capacity(), offset, len)?;
        Ok(Self {
            buffer,
            offset,
            len,
        })
    }

    /// The full capacity of `buffer`.
    pub fn whole(buffer: Buffer<'a>) -> Self {
        Self {
            buffer,
            offset: 0,
            len: buffer.capacity(),
        }
    }

    /// Everything from `offset` to the end of `buffer`.
    pub fn tail(buffer: Buffer<'a>, offset: usize) -> Result<Self> {
        let len = buffer
            .capacity()
            .checked_sub(offset)
            .ok_or(Error::OutOfBounds {
                offset,
                len: 0,
                capacity: buffer.capacity(),
            })?;
        Self::new(buffer, offset, len)
    }

    /// # Safety
    ///
    /// `offset + len` must not exceed the capacity of `buffer`.
    pub unsafe fn new_unchecked(buffer: Buffer<'a>, offset: usize, len: usize) -> Self {
        debug_assert!(check_bounds(buffer.capacity(), offset, len).is_ok());
        Self {
            buffer,
            offset,
            len,
        }
    }

    pub fn buffer(&self) -> Buffer<'a> {
        self.buffer
    }

    pub fn kind(&self) -> BufferKind {
        self.buffer.kind()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Checks that `offset..offset + len` fits in `capacity` without overflowing.
pub fn check_bounds(capacity: usize, offset: usize, len: usize) -> Result<()> {
    match offset.checked_add(len) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err(Error::OutOfBounds {
            offset,
            len,
            capacity,
        }),
    }
}
