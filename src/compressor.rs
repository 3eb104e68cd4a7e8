use std::io::Cursor;

use crate::buffer::{self, Region};
use crate::cursor::AdvanceCursor;
use crate::engine::{self, CompressorContext};
use crate::{CompressionFormat, CompressionLevel, Error, Result};

/// A libdeflate compressor.
///
/// Owns one native compressor context for its whole life and frees it on drop.
/// A compressor is not meant to be shared between threads; use one per thread
/// (it is `Send`, so it can be moved).
#[derive(Debug)]
pub struct Compressor {
    ctx: CompressorContext,
}

impl Compressor {
    /// Creates a compressor at [`CompressionLevel::DEFAULT`].
    pub fn new() -> Result<Self> {
        Self::with_level(CompressionLevel::DEFAULT)
    }

    pub fn with_level(level: CompressionLevel) -> Result<Self> {
        Ok(Self {
            ctx: CompressorContext::new(level)?,
        })
    }

    pub fn level(&self) -> CompressionLevel {
        self.ctx.level()
    }

    /// Compresses `input` into `output`, either of which may be managed or
    /// external memory.
    ///
    /// Returns the number of bytes written at the start of `output`. The regions
    /// must not overlap.
    pub fn compress_region(
        &mut self,
        input: &Region<'_>,
        output: &Region<'_>,
        format: CompressionFormat,
    ) -> Result<usize> {
        let ctx = &mut self.ctx;
        let written = buffer::with_pair(input, output, |src, dst| {
            // SAFETY: both regions stay acquired for the duration of the call.
            unsafe {
                engine::compress(
                    ctx,
                    format,
                    src.as_ptr(),
                    src.len(),
                    dst.as_mut_ptr(),
                    dst.len(),
                )
            }
        })?;
        written_or_too_small(written, output.len())
    }

    /// Compresses `input` into `output`, returning the number of bytes written.
    ///
    /// Fails with [`Error::BufferTooSmall`] when `output` is shorter than needed;
    /// [`Compressor::compress_bound`] gives a size that is always enough.
    pub fn compress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        format: CompressionFormat,
    ) -> Result<usize> {
        // SAFETY: slices are valid for their lengths and cannot overlap.
        let written = unsafe {
            engine::compress(
                &mut self.ctx,
                format,
                input.as_ptr(),
                input.len(),
                output.as_mut_ptr(),
                output.len(),
            )
        };
        written_or_too_small(written, output.len())
    }

    /// Compresses `input` into a new vector sized by the worst-case bound.
    pub fn compress_to_vec(&mut self, input: &[u8], format: CompressionFormat) -> Result<Vec<u8>> {
        let mut output = vec![0; self.compress_bound(format, input.len())];
        let written = self.compress(input, &mut output, format)?;
        output.truncate(written);
        Ok(output)
    }

    /// Compresses everything remaining in `input` into the remainder of `output`.
    ///
    /// `output` advances by the bytes produced. `input` advances past everything
    /// it had remaining, whether or not compression succeeded.
    pub fn compress_cursor<I, O>(
        &mut self,
        input: &mut Cursor<I>,
        output: &mut Cursor<O>,
        format: CompressionFormat,
    ) -> Result<usize>
    where
        I: AsRef<[u8]>,
        O: AsRef<[u8]> + AsMut<[u8]>,
    {
        let (in_pos, in_avail) = (input.offset(), input.remaining());
        let out_pos = output.offset();
        let result = self.compress(
            &input.get_ref().as_ref()[in_pos..],
            &mut output.get_mut().as_mut()[out_pos..],
            format,
        );
        input.advance(in_avail);
        let written = result?;
        output.advance(written);
        Ok(written)
    }

    /// Worst-case compressed size of `len` bytes with this compressor's level.
    pub fn compress_bound(&self, format: CompressionFormat, len: usize) -> usize {
        engine::compress_bound(Some(&self.ctx), format, len)
    }

    /// Worst-case compressed size of `len` bytes at any level.
    ///
    /// Needs no compressor, so it is safe to call from any thread.
    pub fn generic_compress_bound(format: CompressionFormat, len: usize) -> usize {
        engine::compress_bound(None, format, len)
    }
}

fn written_or_too_small(written: usize, capacity: usize) -> Result<usize> {
    if written == 0 {
        log::trace!("compressed output does not fit in {capacity} bytes");
        Err(Error::BufferTooSmall)
    } else {
        Ok(written)
    }
}
