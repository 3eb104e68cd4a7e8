#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod buffer;
mod checksum;
mod codec;
mod compressor;
mod cursor;
mod decompressor;
mod engine;
mod error;
mod format;
mod outcome;

#[cfg(feature = "bytes")]
mod buf;

#[cfg(feature = "python")]
mod python;

pub use buffer::{Buffer, BufferKind, HeapBuffer, OffHeapBuffer, Region};
pub use checksum::{adler32, adler32_slice, crc32, crc32_slice, Adler32, Crc32};
pub use codec::Codec;
pub use compressor::Compressor;
pub use cursor::AdvanceCursor;
pub use decompressor::Decompressor;
pub use error::{Error, Result, Side};
pub use format::{CompressionFormat, CompressionLevel};
pub use outcome::{DecompressionMode, Outcome};

/// Low-level compression interface using caller-provided buffers.
///
/// Codecs write into pre-allocated slices and return a sub-slice showing exactly
/// what was written, so buffers can be reused across calls.
///
/// # Type Parameters
///
/// - `In`: Uncompressed data type
/// - `Out`: Compressed data type (defaults to `In`)
///
/// # Buffer Sizing
///
/// Caller must ensure output buffers are large enough. For compression,
/// [`Codec::max_compressed_len`] is always enough. For decompression, the size
/// depends on the data.
pub trait CodecToSlice<In, Out = In> {
    /// Error type returned by compression/decompression operations.
    type Error;

    /// Compresses input into output buffer, returning slice of data written.
    fn compress_to_slice<'out>(
        &mut self,
        input: &[In],
        output: &'out mut [Out],
    ) -> std::result::Result<&'out [Out], Self::Error>;

    /// Decompresses input into output buffer, returning slice of data written.
    fn decompress_to_slice<'out>(
        &mut self,
        input: &[Out],
        output: &'out mut [In],
    ) -> std::result::Result<&'out [In], Self::Error>;
}
