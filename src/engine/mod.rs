//! Thin layer over the libdeflate C API.
//!
//! Everything that touches a raw engine handle or calls into C lives here. The
//! functions are pure pass-throughs: no validation, no allocation, and nothing
//! retained past the call. Callers hand in addresses that the buffer mediator
//! has already resolved.

use std::ffi::c_void;
use std::ptr::{self, NonNull};

use crate::{CompressionFormat, CompressionLevel, Error, Result};

/// Raw declarations of the native engine.
///
/// Only this module names them; the rest of the crate goes through the wrappers
/// below.
mod ffi {
    pub(super) use libdeflate_sys::{
        libdeflate_adler32, libdeflate_alloc_compressor, libdeflate_alloc_decompressor,
        libdeflate_compressor, libdeflate_crc32, libdeflate_decompressor,
        libdeflate_deflate_compress, libdeflate_deflate_compress_bound,
        libdeflate_deflate_decompress_ex, libdeflate_free_compressor,
        libdeflate_free_decompressor, libdeflate_gzip_compress, libdeflate_gzip_compress_bound,
        libdeflate_gzip_decompress_ex, libdeflate_result, libdeflate_result_LIBDEFLATE_BAD_DATA,
        libdeflate_result_LIBDEFLATE_INSUFFICIENT_SPACE, libdeflate_result_LIBDEFLATE_SHORT_OUTPUT,
        libdeflate_result_LIBDEFLATE_SUCCESS, libdeflate_zlib_compress,
        libdeflate_zlib_compress_bound, libdeflate_zlib_decompress_ex,
    };
}

/// Owned handle to a native compressor.
///
/// Construction is the only allocation path and `Drop` the only free path, so a
/// handle is released exactly once no matter how its owner goes away.
#[derive(Debug)]
pub(crate) struct CompressorContext {
    raw: NonNull<ffi::libdeflate_compressor>,
    level: CompressionLevel,
}

// SAFETY: a libdeflate compressor has no thread affinity. It is not safe for
// concurrent use, which `&mut self` on every call already rules out (no `Sync`).
unsafe impl Send for CompressorContext {}

impl CompressorContext {
    pub(crate) fn new(level: CompressionLevel) -> Result<Self> {
        // SAFETY: any level in 0..=12 is accepted by the engine.
        let raw = unsafe { ffi::libdeflate_alloc_compressor(level.get()) };
        match NonNull::new(raw) {
            Some(raw) => {
                log::debug!("allocated libdeflate compressor at level {}", level.get());
                Ok(Self { raw, level })
            }
            None => {
                log::error!("libdeflate failed to allocate a compressor");
                Err(Error::OutOfMemory("libdeflate allocate compressor"))
            }
        }
    }

    pub(crate) fn level(&self) -> CompressionLevel {
        self.level
    }
}

impl Drop for CompressorContext {
    fn drop(&mut self) {
        // SAFETY: `raw` came from `libdeflate_alloc_compressor` and is freed once.
        unsafe { ffi::libdeflate_free_compressor(self.raw.as_ptr()) };
        log::debug!("freed libdeflate compressor");
    }
}

/// Owned handle to a native decompressor. See [`CompressorContext`].
#[derive(Debug)]
pub(crate) struct DecompressorContext {
    raw: NonNull<ffi::libdeflate_decompressor>,
}

// SAFETY: same reasoning as for `CompressorContext`.
unsafe impl Send for DecompressorContext {}

impl DecompressorContext {
    pub(crate) fn new() -> Result<Self> {
        // SAFETY: no preconditions.
        let raw = unsafe { ffi::libdeflate_alloc_decompressor() };
        match NonNull::new(raw) {
            Some(raw) => {
                log::debug!("allocated libdeflate decompressor");
                Ok(Self { raw })
            }
            None => {
                log::error!("libdeflate failed to allocate a decompressor");
                Err(Error::OutOfMemory("libdeflate allocate decompressor"))
            }
        }
    }
}

impl Drop for DecompressorContext {
    fn drop(&mut self) {
        // SAFETY: `raw` came from `libdeflate_alloc_decompressor` and is freed once.
        unsafe { ffi::libdeflate_free_decompressor(self.raw.as_ptr()) };
        log::debug!("freed libdeflate decompressor");
    }
}

/// Classification of a native decompression result code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NativeStatus {
    Success,
    BadData,
    /// Only possible when the exact output size was asserted.
    ShortOutput,
    InsufficientSpace,
    Unrecognized(i64),
}

impl NativeStatus {
    fn from_raw(code: ffi::libdeflate_result) -> Self {
        match code {
            ffi::libdeflate_result_LIBDEFLATE_SUCCESS => NativeStatus::Success,
            ffi::libdeflate_result_LIBDEFLATE_BAD_DATA => NativeStatus::BadData,
            ffi::libdeflate_result_LIBDEFLATE_SHORT_OUTPUT => NativeStatus::ShortOutput,
            ffi::libdeflate_result_LIBDEFLATE_INSUFFICIENT_SPACE => {
                NativeStatus::InsufficientSpace
            }
            other => NativeStatus::Unrecognized(i64::from(other)),
        }
    }
}

/// What one native decompression call reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RawDecompression {
    pub(crate) status: NativeStatus,
    /// Compressed bytes the engine read.
    pub(crate) consumed: usize,
    /// Bytes written; only reported for capacity (non-exact) calls.
    pub(crate) produced: usize,
}

/// Compresses `in_len` bytes at `input` into at most `out_cap` bytes at `output`.
///
/// Returns the compressed size, or 0 when the output did not fit.
///
/// # Safety
///
/// `input` must be readable for `in_len` bytes and `output` writable for
/// `out_cap` bytes for the whole call, and the two ranges must not overlap.
pub(crate) unsafe fn compress(
    ctx: &mut CompressorContext,
    format: CompressionFormat,
    input: *const u8,
    in_len: usize,
    output: *mut u8,
    out_cap: usize,
) -> usize {
    let c = ctx.raw.as_ptr();
    let src = input.cast::<c_void>();
    let dst = output.cast::<c_void>();
    // SAFETY: forwarded from the caller.
    unsafe {
        match format {
            CompressionFormat::Deflate => {
                ffi::libdeflate_deflate_compress(c, src, in_len, dst, out_cap)
            }
            CompressionFormat::Zlib => ffi::libdeflate_zlib_compress(c, src, in_len, dst, out_cap),
            CompressionFormat::Gzip => ffi::libdeflate_gzip_compress(c, src, in_len, dst, out_cap),
        }
    }
}

/// Decompresses the stream at `input` into `output`.
///
/// With `exact == true` the engine must produce exactly `out_avail` bytes and
/// reports `ShortOutput` otherwise; `produced` is then left at zero. With
/// `exact == false`, `out_avail` is a capacity and `produced` holds the real
/// output size.
///
/// # Safety
///
/// Same contract as [`compress`] with `out_avail` as the writable length.
pub(crate) unsafe fn decompress(
    ctx: &mut DecompressorContext,
    format: CompressionFormat,
    input: *const u8,
    in_len: usize,
    output: *mut u8,
    out_avail: usize,
    exact: bool,
) -> RawDecompression {
    let d = ctx.raw.as_ptr();
    let src = input.cast::<c_void>();
    let dst = output.cast::<c_void>();
    let mut consumed = 0usize;
    let mut produced = 0usize;
    let produced_ret: *mut usize = if exact {
        ptr::null_mut()
    } else {
        &mut produced
    };

    // SAFETY: forwarded from the caller; both out-pointers are live locals.
    let code = unsafe {
        match format {
            CompressionFormat::Deflate => ffi::libdeflate_deflate_decompress_ex(
                d,
                src,
                in_len,
                dst,
                out_avail,
                &mut consumed,
                produced_ret,
            ),
            CompressionFormat::Zlib => ffi::libdeflate_zlib_decompress_ex(
                d,
                src,
                in_len,
                dst,
                out_avail,
                &mut consumed,
                produced_ret,
            ),
            CompressionFormat::Gzip => ffi::libdeflate_gzip_decompress_ex(
                d,
                src,
                in_len,
                dst,
                out_avail,
                &mut consumed,
                produced_ret,
            ),
        }
    };

    RawDecompression {
        status: NativeStatus::from_raw(code),
        consumed,
        produced,
    }
}

/// Worst-case compressed size for `len` input bytes.
///
/// With `None` the bound holds for every compression level.
pub(crate) fn compress_bound(
    ctx: Option<&CompressorContext>,
    format: CompressionFormat,
    len: usize,
) -> usize {
    let c = ctx.map_or(ptr::null_mut(), |ctx| ctx.raw.as_ptr());
    // SAFETY: the bound functions only read the level from a non-null handle
    // and accept null for the generic bound.
    unsafe {
        match format {
            CompressionFormat::Deflate => ffi::libdeflate_deflate_compress_bound(c, len),
            CompressionFormat::Zlib => ffi::libdeflate_zlib_compress_bound(c, len),
            CompressionFormat::Gzip => ffi::libdeflate_gzip_compress_bound(c, len),
        }
    }
}

/// Continues a CRC-32 over `len` bytes at `data`.
///
/// # Safety
///
/// `data` must be readable for `len` bytes.
pub(crate) unsafe fn crc32(seed: u32, data: *const u8, len: usize) -> u32 {
    // SAFETY: forwarded from the caller.
    unsafe { ffi::libdeflate_crc32(seed, data.cast::<c_void>(), len) }
}

/// Continues an Adler-32 over `len` bytes at `data`.
///
/// # Safety
///
/// `data` must be readable for `len` bytes.
pub(crate) unsafe fn adler32(seed: u32, data: *const u8, len: usize) -> u32 {
    // SAFETY: forwarded from the caller.
    unsafe { ffi::libdeflate_adler32(seed, data.cast::<c_void>(), len) }
}
