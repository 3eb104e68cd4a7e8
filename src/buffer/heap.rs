use std::cell::{Cell, UnsafeCell};
use std::fmt;
use std::ptr::NonNull;

use super::{in_critical_section, ManagedArray, ReleaseMode};

/// A growable byte array that behaves like a runtime-managed array.
///
/// Its storage may move when it is resized, so native code can only reach it
/// through a critical section, which pins it. Resizing a pinned buffer is a bug
/// and panics.
///
/// Useful on its own and as the reference `Managed` buffer for tests.
pub struct HeapBuffer {
    data: UnsafeCell<Vec<u8>>,
    pins: Cell<usize>,
}

impl HeapBuffer {
    /// A zero-filled buffer of `len` bytes.
    pub fn new(len: usize) -> Self {
        Self::from_vec(vec![0; len])
    }

    pub fn from_vec(data: Vec<u8>) -> Self {
        Self {
            data: UnsafeCell::new(data),
            pins: Cell::new(0),
        }
    }

    pub fn len(&self) -> usize {
        // SAFETY: reading the length never races with the engine, which only
        // writes element bytes.
        unsafe { (*self.data.get()).len() }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_pinned(&self) -> bool {
        self.pins.get() > 0
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.data.get_mut()
    }

    /// Copies the current contents out.
    pub fn to_vec(&self) -> Vec<u8> {
        debug_assert!(!self.is_pinned());
        // SAFETY: not pinned, so no native writer holds the storage.
        unsafe { (*self.data.get()).clone() }
    }

    /// Resizes the storage, possibly moving it.
    pub fn resize(&mut self, new_len: usize) {
        assert!(
            !self.is_pinned() && !in_critical_section(),
            "HeapBuffer resized inside a critical section"
        );
        self.data.get_mut().resize(new_len, 0);
    }

    pub fn into_vec(self) -> Vec<u8> {
        assert!(!self.is_pinned(), "HeapBuffer consumed while pinned");
        self.data.into_inner()
    }
}

impl fmt::Debug for HeapBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapBuffer")
            .field("len", &self.len())
            .field("pins", &self.pins.get())
            .finish()
    }
}

impl From<Vec<u8>> for HeapBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self::from_vec(data)
    }
}

// SAFETY: storage cannot move while `pins > 0`, because every relocating method
// takes `&mut self` and asserts the buffer is unpinned.
unsafe impl ManagedArray for HeapBuffer {
    fn capacity(&self) -> usize {
        self.len()
    }

    unsafe fn enter_critical(&self) -> Option<NonNull<u8>> {
        self.pins.set(self.pins.get() + 1);
        // SAFETY: the Vec itself is not borrowed elsewhere during this call.
        NonNull::new(unsafe { (*self.data.get()).as_mut_ptr() })
    }

    unsafe fn exit_critical(&self, _base: NonNull<u8>, _mode: ReleaseMode) {
        // writes went straight into the storage, so commit and discard coincide
        self.pins.set(self.pins.get() - 1);
    }
}
