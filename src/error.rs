use std::fmt;

use thiserror::Error;

/// Alias for the result type of bridge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which side of an invocation a buffer was supplied for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// The region the engine reads from.
    Input,
    /// The region the engine writes into.
    Output,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Input => f.write_str("input"),
            Side::Output => f.write_str("output"),
        }
    }
}

/// Errors that can occur when bridging buffers to the native engine.
///
/// The recoverable "output too small, grow and retry" condition of unknown-size
/// decompression is deliberately not in here: it is reported as
/// [`Outcome::InsufficientSpace`](crate::Outcome::InsufficientSpace).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The engine or the host runtime could not allocate what the call needed
    #[error("out of memory: {0}")]
    OutOfMemory(&'static str),

    /// An external buffer did not expose a usable native address
    #[error("unable to obtain direct access to {side} buffer")]
    BufferUnavailable {
        /// The region that failed to resolve
        side: Side,
    },

    /// The engine rejected the compressed stream
    #[error("input data is corrupted")]
    CorruptData,

    /// Known-size decompression finished with fewer bytes than asserted
    #[error("decompressed data is shorter than expected size {expected}")]
    SizeMismatch {
        /// The size the caller asserted
        expected: usize,
    },

    /// The output region cannot hold the result
    #[error("data would be too large for given output buffer")]
    BufferTooSmall,

    /// The engine returned a result code this crate does not know
    #[error("unknown libdeflate error (code {0})")]
    UnknownEngineError(i64),

    /// Compression level outside `0..=12`
    #[error("invalid compression level {0}, must be between 0 and 12")]
    InvalidCompressionLevel(i32),

    /// A region does not fit inside its buffer
    #[error("region offset {offset} + length {len} out of bounds for capacity {capacity}")]
    OutOfBounds {
        /// Requested start of the region
        offset: usize,
        /// Requested length of the region
        len: usize,
        /// Capacity of the backing buffer
        capacity: usize,
    },

    /// Input and output regions share bytes of the same buffer
    #[error("input and output regions overlap")]
    OverlappingRegions,

    /// A format name that does not map to a container
    #[error("unknown compression format {0:?}")]
    UnknownFormat(String),

    /// A grow-and-retry loop hit the caller's ceiling
    #[error("decompressed output exceeds limit of {limit} bytes")]
    OutputLimitExceeded {
        /// The ceiling that was hit
        limit: usize,
    },
}

impl Error {
    /// Returns `true` for failures caused by the compressed data itself rather
    /// than by the caller's buffers or the environment.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Error::CorruptData
                | Error::SizeMismatch { .. }
                | Error::BufferTooSmall
                | Error::UnknownEngineError(_)
        )
    }
}
