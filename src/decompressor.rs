use std::io::Cursor;

use crate::buffer::{self, Region};
use crate::cursor::AdvanceCursor;
use crate::engine::{self, DecompressorContext, RawDecompression};
use crate::outcome::{interpret, DecompressionMode, Outcome};
use crate::{CompressionFormat, Error, Result};

/// Smallest output buffer [`Decompressor::decompress_to_vec`] starts with.
const MIN_INITIAL_CAPACITY: usize = 64;

/// A libdeflate decompressor.
///
/// Owns one native decompressor context and frees it on drop. Like
/// [`Compressor`](crate::Compressor) it is `Send` but not `Sync`.
#[derive(Debug)]
pub struct Decompressor {
    ctx: DecompressorContext,
}

impl Decompressor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            ctx: DecompressorContext::new()?,
        })
    }

    /// Decompresses one stream from `input` into `output`.
    ///
    /// With `expected = Some(n)` the stream must decompress to exactly `n` bytes,
    /// which must fit in `output`. With `None` the size is unknown and `output`
    /// is a capacity; if it is too small the result is
    /// [`Outcome::InsufficientSpace`] and the caller may retry with more room.
    ///
    /// Trailing bytes after the end of the stream are allowed and reported
    /// through [`Outcome::consumed`].
    pub fn decompress_region(
        &mut self,
        input: &Region<'_>,
        output: &Region<'_>,
        format: CompressionFormat,
        expected: Option<usize>,
    ) -> Result<Outcome> {
        let mode = mode_for(expected, output.len())?;
        let ctx = &mut self.ctx;
        let raw = buffer::with_pair(input, output, |src, dst| {
            // SAFETY: both regions stay acquired for the duration of the call and
            // the output window never exceeds the output region.
            unsafe {
                engine::decompress(
                    ctx,
                    format,
                    src.as_ptr(),
                    src.len(),
                    dst.as_mut_ptr(),
                    mode.output_window(),
                    mode.is_known(),
                )
            }
        })?;
        // regions are released by now, so logging is allowed again
        interpret(raw, mode)
    }

    /// Slice version of [`Decompressor::decompress_region`].
    pub fn decompress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        format: CompressionFormat,
        expected: Option<usize>,
    ) -> Result<Outcome> {
        let mode = mode_for(expected, output.len())?;
        interpret(self.decompress_raw(input, output, format, mode), mode)
    }

    /// Decompresses into `output` without knowing the size in advance.
    ///
    /// Returns the number of bytes written, or `None` if `output` was too small.
    pub fn decompress_unknown_size(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        format: CompressionFormat,
    ) -> Result<Option<usize>> {
        Ok(self.decompress(input, output, format, None)?.produced())
    }

    /// Decompresses from the remainder of `input` into the remainder of `output`.
    ///
    /// On success `input` advances by the bytes consumed, leaving any trailing
    /// data in place, and `output` by the bytes produced. Neither cursor moves
    /// otherwise.
    pub fn decompress_cursor<I, O>(
        &mut self,
        input: &mut Cursor<I>,
        output: &mut Cursor<O>,
        format: CompressionFormat,
        expected: Option<usize>,
    ) -> Result<Outcome>
    where
        I: AsRef<[u8]>,
        O: AsRef<[u8]> + AsMut<[u8]>,
    {
        let (in_pos, out_pos) = (input.offset(), output.offset());
        let outcome = self.decompress(
            &input.get_ref().as_ref()[in_pos..],
            &mut output.get_mut().as_mut()[out_pos..],
            format,
            expected,
        )?;
        if let Outcome::Success { produced, consumed } = outcome {
            input.advance(consumed);
            output.advance(produced);
        }
        Ok(outcome)
    }

    /// Decompresses a stream of exactly `size` bytes into a new vector.
    pub fn decompress_exact_to_vec(
        &mut self,
        input: &[u8],
        format: CompressionFormat,
        size: usize,
    ) -> Result<Vec<u8>> {
        let mut output = vec![0; size];
        let _ = self.decompress(input, &mut output, format, Some(size))?;
        Ok(output)
    }

    /// Decompresses a stream of unknown size into a new vector.
    ///
    /// The output starts at a small multiple of the input size and doubles after
    /// every [`Outcome::InsufficientSpace`], up to `limit` bytes. A stream that
    /// still does not fit fails with [`Error::OutputLimitExceeded`].
    pub fn decompress_to_vec(
        &mut self,
        input: &[u8],
        format: CompressionFormat,
        limit: usize,
    ) -> Result<Vec<u8>> {
        let mut capacity = input
            .len()
            .saturating_mul(4)
            .max(MIN_INITIAL_CAPACITY)
            .min(limit);
        let mut output = Vec::new();
        loop {
            debug_assert!(!buffer::in_critical_section());
            output.resize(capacity, 0);
            match self.decompress(input, &mut output, format, None)? {
                Outcome::Success { produced, .. } => {
                    output.truncate(produced);
                    return Ok(output);
                }
                Outcome::InsufficientSpace if capacity >= limit => {
                    return Err(Error::OutputLimitExceeded { limit });
                }
                Outcome::InsufficientSpace => {
                    capacity = capacity.saturating_mul(2).min(limit);
                    log::trace!("retrying decompression with {capacity} bytes of output");
                }
            }
        }
    }

    fn decompress_raw(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        format: CompressionFormat,
        mode: DecompressionMode,
    ) -> RawDecompression {
        // SAFETY: `mode_for` checked the window against `output.len()`, and
        // slices are valid for their lengths and cannot overlap.
        unsafe {
            engine::decompress(
                &mut self.ctx,
                format,
                input.as_ptr(),
                input.len(),
                output.as_mut_ptr(),
                mode.output_window(),
                mode.is_known(),
            )
        }
    }
}

/// Builds the mode for a call, rejecting an asserted size larger than the output.
fn mode_for(expected: Option<usize>, capacity: usize) -> Result<DecompressionMode> {
    if let Some(n) = expected {
        buffer::check_bounds(capacity, 0, n)?;
    }
    Ok(DecompressionMode::new(expected, capacity))
}
