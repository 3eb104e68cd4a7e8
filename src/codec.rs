use crate::{CodecToSlice, CompressionFormat, CompressionLevel, Compressor, Decompressor, Error, Result};

/// A compressor and decompressor pair bound to one container format.
///
/// Implements [`CodecToSlice`] for callers that just want bytes in, bytes out.
/// Decompression treats the output as a capacity; an output that is too small
/// is reported as [`Error::BufferTooSmall`].
#[derive(Debug)]
pub struct Codec {
    format: CompressionFormat,
    compressor: Compressor,
    decompressor: Decompressor,
}

impl Codec {
    pub fn new(format: CompressionFormat) -> Result<Self> {
        Self::with_level(format, CompressionLevel::DEFAULT)
    }

    pub fn with_level(format: CompressionFormat, level: CompressionLevel) -> Result<Self> {
        Ok(Self {
            format,
            compressor: Compressor::with_level(level)?,
            decompressor: Decompressor::new()?,
        })
    }

    pub fn format(&self) -> CompressionFormat {
        self.format
    }

    pub fn compressor(&mut self) -> &mut Compressor {
        &mut self.compressor
    }

    pub fn decompressor(&mut self) -> &mut Decompressor {
        &mut self.decompressor
    }

    /// Worst-case output size for compressing `len` bytes.
    pub fn max_compressed_len(&self, len: usize) -> usize {
        self.compressor.compress_bound(self.format, len)
    }
}

impl CodecToSlice<u8> for Codec {
    type Error = Error;

    fn compress_to_slice<'out>(
        &mut self,
        input: &[u8],
        output: &'out mut [u8],
    ) -> Result<&'out [u8]> {
        let written = self.compressor.compress(input, output, self.format)?;
        Ok(&output[..written])
    }

    fn decompress_to_slice<'out>(
        &mut self,
        input: &[u8],
        output: &'out mut [u8],
    ) -> Result<&'out [u8]> {
        let written = self
            .decompressor
            .decompress_unknown_size(input, output, self.format)?
            .ok_or(Error::BufferTooSmall)?;
        Ok(&output[..written])
    }
}
