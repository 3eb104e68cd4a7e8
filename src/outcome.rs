//! Classification of native decompression results.

use crate::engine::{NativeStatus, RawDecompression};
use crate::{Error, Result};

/// What the caller knows about the decompressed size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecompressionMode {
    /// The stream must decompress to exactly this many bytes.
    KnownSize(usize),
    /// The stream may decompress to anything up to this capacity.
    UnknownSize(usize),
}

impl DecompressionMode {
    /// `expected` if the caller asserted a size, otherwise the output capacity.
    pub fn new(expected: Option<usize>, capacity: usize) -> Self {
        match expected {
            Some(n) => DecompressionMode::KnownSize(n),
            None => DecompressionMode::UnknownSize(capacity),
        }
    }

    /// Number of output bytes handed to the engine.
    pub fn output_window(self) -> usize {
        match self {
            DecompressionMode::KnownSize(n) | DecompressionMode::UnknownSize(n) => n,
        }
    }

    pub fn is_known(self) -> bool {
        matches!(self, DecompressionMode::KnownSize(_))
    }
}

/// A non-failing decompression result.
///
/// Failures come back as [`Error`]; `InsufficientSpace` is kept apart because it
/// is the expected, recoverable signal to grow the output and try again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub enum Outcome {
    Success {
        /// Bytes written to the output region.
        produced: usize,
        /// Bytes read from the input region; the end of the compressed stream.
        consumed: usize,
    },
    /// The output region was too small for an unknown-size decompression.
    InsufficientSpace,
}

impl Outcome {
    /// Bytes produced, or `None` for [`Outcome::InsufficientSpace`].
    pub fn produced(self) -> Option<usize> {
        match self {
            Outcome::Success { produced, .. } => Some(produced),
            Outcome::InsufficientSpace => None,
        }
    }

    /// Bytes consumed, or `None` for [`Outcome::InsufficientSpace`].
    pub fn consumed(self) -> Option<usize> {
        match self {
            Outcome::Success { consumed, .. } => Some(consumed),
            Outcome::InsufficientSpace => None,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

/// Maps one native result onto an [`Outcome`] or a typed failure.
pub(crate) fn interpret(raw: RawDecompression, mode: DecompressionMode) -> Result<Outcome> {
    match (raw.status, mode) {
        (NativeStatus::Success, DecompressionMode::KnownSize(n)) => Ok(Outcome::Success {
            produced: n,
            consumed: raw.consumed,
        }),
        (NativeStatus::Success, DecompressionMode::UnknownSize(_)) => Ok(Outcome::Success {
            produced: raw.produced,
            consumed: raw.consumed,
        }),
        (NativeStatus::BadData, _) => {
            log::debug!("libdeflate rejected input as corrupt");
            Err(Error::CorruptData)
        }
        (NativeStatus::ShortOutput, DecompressionMode::KnownSize(expected)) => {
            log::debug!("decompressed data is shorter than the asserted {expected} bytes");
            Err(Error::SizeMismatch { expected })
        }
        (NativeStatus::InsufficientSpace, DecompressionMode::KnownSize(expected)) => {
            log::debug!("decompressed data is longer than the asserted {expected} bytes");
            Err(Error::BufferTooSmall)
        }
        (NativeStatus::InsufficientSpace, DecompressionMode::UnknownSize(capacity)) => {
            log::trace!("output capacity {capacity} too small, caller should grow and retry");
            Ok(Outcome::InsufficientSpace)
        }
        // the engine only reports a short output when an exact size was requested
        (NativeStatus::ShortOutput, DecompressionMode::UnknownSize(_)) => {
            log::warn!("libdeflate reported short output without an asserted size");
            Err(Error::UnknownEngineError(2))
        }
        (NativeStatus::Unrecognized(code), _) => {
            log::warn!("libdeflate returned unrecognized result code {code}");
            Err(Error::UnknownEngineError(code))
        }
    }
}
