use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// The container wrapped around a DEFLATE stream.
///
/// Selects which of the engine's three entry points handles a call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompressionFormat {
    /// Raw DEFLATE (RFC 1951), no header or trailer
    Deflate,
    /// zlib wrapper (RFC 1950) with Adler-32 trailer
    Zlib,
    /// gzip wrapper (RFC 1952) with CRC-32 and size trailer
    Gzip,
}

impl CompressionFormat {
    /// All formats, in native tag order.
    pub const ALL: [CompressionFormat; 3] = [
        CompressionFormat::Deflate,
        CompressionFormat::Zlib,
        CompressionFormat::Gzip,
    ];

    /// Stable numeric tag used by host bindings.
    pub fn native_tag(self) -> u8 {
        match self {
            CompressionFormat::Deflate => 0,
            CompressionFormat::Zlib => 1,
            CompressionFormat::Gzip => 2,
        }
    }

    /// Inverse of [`CompressionFormat::native_tag`].
    pub fn from_native_tag(tag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.native_tag() == tag)
    }

    /// Lowercase name as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            CompressionFormat::Deflate => "deflate",
            CompressionFormat::Zlib => "zlib",
            CompressionFormat::Gzip => "gzip",
        }
    }
}

impl fmt::Display for CompressionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CompressionFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "deflate" | "raw" => Ok(CompressionFormat::Deflate),
            "zlib" => Ok(CompressionFormat::Zlib),
            "gzip" | "gz" => Ok(CompressionFormat::Gzip),
            _ => Err(Error::UnknownFormat(s.to_string())),
        }
    }
}

/// A validated libdeflate compression level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    /// Level 0 stores blocks uncompressed.
    pub const MIN: CompressionLevel = CompressionLevel(0);
    /// Slowest, strongest level.
    pub const MAX: CompressionLevel = CompressionLevel(12);
    /// Level used when the caller does not pick one.
    pub const DEFAULT: CompressionLevel = CompressionLevel(6);

    /// Host runtimes conventionally pass `-1` for "default level".
    pub const DEFAULT_SENTINEL: i32 = -1;

    /// Validates `level`. `-1` selects [`CompressionLevel::DEFAULT`].
    pub fn new(level: i32) -> Result<Self> {
        if level == Self::DEFAULT_SENTINEL {
            return Ok(Self::DEFAULT);
        }
        match u8::try_from(level) {
            Ok(l) if l <= Self::MAX.0 => Ok(CompressionLevel(l)),
            _ => Err(Error::InvalidCompressionLevel(level)),
        }
    }

    pub fn get(self) -> i32 {
        i32::from(self.0)
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i32> for CompressionLevel {
    type Error = Error;

    fn try_from(level: i32) -> Result<Self> {
        Self::new(level)
    }
}
