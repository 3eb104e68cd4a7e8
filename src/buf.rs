//! Compression between [`bytes`] buffers.
//!
//! Output always goes into the spare capacity of a [`BytesMut`], after its
//! current contents; the buffer is never grown. Reserve room first, for example
//! with [`Compressor::compress_bound`].

use bytes::{Buf, Bytes, BytesMut};

use crate::outcome::Outcome;
use crate::{CompressionFormat, Compressor, Decompressor, Result};

/// Runs `f` over the spare capacity of `output` and keeps the first `n` bytes
/// written, where `n` is what `written` extracts from the result.
fn with_spare<T>(
    output: &mut BytesMut,
    f: impl FnOnce(&mut [u8]) -> Result<T>,
    written: impl FnOnce(&T) -> usize,
) -> Result<T> {
    let start = output.len();
    output.resize(output.capacity(), 0);
    let result = f(&mut output[start..]);
    let n = result.as_ref().map_or(0, written);
    output.truncate(start + n);
    result
}

impl Compressor {
    /// Compresses everything remaining in `input`, appending to `output`.
    ///
    /// `input` may be split over several chunks, in which case it is flattened
    /// into one temporary copy first. It is consumed whether or not compression
    /// succeeds.
    pub fn compress_buf<B: Buf>(
        &mut self,
        input: &mut B,
        output: &mut BytesMut,
        format: CompressionFormat,
    ) -> Result<usize> {
        let remaining = input.remaining();
        if input.chunk().len() >= remaining {
            let result = with_spare(
                output,
                |spare| self.compress(&input.chunk()[..remaining], spare, format),
                |n| *n,
            );
            input.advance(remaining);
            result
        } else {
            let flat = input.copy_to_bytes(remaining);
            with_spare(output, |spare| self.compress(&flat, spare, format), |n| *n)
        }
    }
}

impl Decompressor {
    /// Decompresses one stream from the front of `input`, appending to `output`.
    ///
    /// On success `input` advances past the stream, so trailing data stays
    /// readable. See [`Decompressor::decompress`] for `expected`.
    pub fn decompress_buf(
        &mut self,
        input: &mut Bytes,
        output: &mut BytesMut,
        format: CompressionFormat,
        expected: Option<usize>,
    ) -> Result<Outcome> {
        let outcome = with_spare(
            output,
            |spare| self.decompress(input, spare, format, expected),
            |outcome| outcome.produced().unwrap_or(0),
        )?;
        if let Some(consumed) = outcome.consumed() {
            input.advance(consumed);
        }
        Ok(outcome)
    }
}
