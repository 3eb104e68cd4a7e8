#![allow(dead_code)]

use std::cell::RefCell;
use std::ptr::NonNull;

use deflate_bridge::buffer::{ExternalBuffer, ManagedArray, ReleaseMode};
use deflate_bridge::{Buffer, BufferKind, HeapBuffer, OffHeapBuffer, Region};
use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng as _};

/// Routes crate logs to the test harness; set `RUST_LOG=trace` to see them.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub const KIND_PAIRS: [(BufferKind, BufferKind); 4] = [
    (BufferKind::Managed, BufferKind::Managed),
    (BufferKind::Managed, BufferKind::External),
    (BufferKind::External, BufferKind::Managed),
    (BufferKind::External, BufferKind::External),
];

pub fn payloads() -> Vec<(&'static str, Vec<u8>)> {
    let mut rng = StdRng::seed_from_u64(14);

    vec![
        ("empty", Vec::new()),
        ("single byte", vec![0x42]),
        ("zeroes", vec![0u8; 4096]),
        (
            "text",
            b"libdeflate is a library for fast, whole-buffer DEFLATE-based compression. ".repeat(50),
        ),
        ("ascending", (0..8192).map(|i| i as u8).collect()),
        (
            "small alphabet",
            (0..8192).map(|_| rng.random_range(b'a'..=b'd')).collect(),
        ),
        ("random", (0..8192).map(|_| rng.random::<u8>()).collect()),
    ]
}

/// An owned buffer of either kind, for tests that iterate over kinds.
pub enum OwnedBuffer {
    Heap(HeapBuffer),
    Direct(OffHeapBuffer),
}

impl OwnedBuffer {
    pub fn new(kind: BufferKind, data: &[u8]) -> Self {
        match kind {
            BufferKind::Managed => OwnedBuffer::Heap(HeapBuffer::from_vec(data.to_vec())),
            BufferKind::External => OwnedBuffer::Direct(OffHeapBuffer::from_slice(data).unwrap()),
        }
    }

    pub fn zeroed(kind: BufferKind, len: usize) -> Self {
        Self::new(kind, &vec![0; len])
    }

    pub fn buffer(&self) -> Buffer<'_> {
        match self {
            OwnedBuffer::Heap(heap) => Buffer::managed(heap),
            OwnedBuffer::Direct(direct) => Buffer::external(direct),
        }
    }

    pub fn whole(&self) -> Region<'_> {
        Region::whole(self.buffer())
    }

    pub fn region(&self, offset: usize, len: usize) -> Region<'_> {
        Region::new(self.buffer(), offset, len).unwrap()
    }

    pub fn to_vec(&self) -> Vec<u8> {
        match self {
            OwnedBuffer::Heap(heap) => heap.to_vec(),
            OwnedBuffer::Direct(direct) => direct.to_vec(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Enter,
    Exit(ReleaseMode),
}

/// A managed array that records every critical-section transition.
pub struct RecordingArray {
    inner: HeapBuffer,
    refuse_entry: bool,
    events: RefCell<Vec<Event>>,
}

impl RecordingArray {
    pub fn new(data: &[u8]) -> Self {
        Self {
            inner: HeapBuffer::from_vec(data.to_vec()),
            refuse_entry: false,
            events: RefCell::new(Vec::new()),
        }
    }

    /// An array whose runtime always fails to enter the critical section.
    pub fn refusing(len: usize) -> Self {
        Self {
            refuse_entry: true,
            ..Self::new(&vec![0; len])
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.inner.to_vec()
    }
}

unsafe impl ManagedArray for RecordingArray {
    fn capacity(&self) -> usize {
        self.inner.len()
    }

    unsafe fn enter_critical(&self) -> Option<NonNull<u8>> {
        self.events.borrow_mut().push(Event::Enter);
        if self.refuse_entry {
            return None;
        }
        unsafe { self.inner.enter_critical() }
    }

    unsafe fn exit_critical(&self, base: NonNull<u8>, mode: ReleaseMode) {
        self.events.borrow_mut().push(Event::Exit(mode));
        unsafe { self.inner.exit_critical(base, mode) };
    }
}

/// An external buffer object that has no native address behind it.
pub struct Unaddressable(pub usize);

unsafe impl ExternalBuffer for Unaddressable {
    fn capacity(&self) -> usize {
        self.0
    }

    fn address(&self) -> Option<NonNull<u8>> {
        None
    }
}
