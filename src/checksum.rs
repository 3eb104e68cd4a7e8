//! CRC-32 and Adler-32 over slices and regions, backed by libdeflate.

use std::hash::Hasher;

use crate::buffer::{self, Region};
use crate::engine;
use crate::Result;

/// Continues a CRC-32 with `seed` over `region`.
///
/// Start with a seed of `0`; feeding the result back as the next seed gives the
/// checksum of the concatenated data.
pub fn crc32(seed: u32, region: &Region<'_>) -> Result<u32> {
    // SAFETY: the region stays acquired while the engine reads it.
    buffer::with_region(region, |r| unsafe { engine::crc32(seed, r.as_ptr(), r.len()) })
}

/// Continues an Adler-32 with `seed` over `region`. Start with a seed of `1`.
pub fn adler32(seed: u32, region: &Region<'_>) -> Result<u32> {
    // SAFETY: the region stays acquired while the engine reads it.
    buffer::with_region(region, |r| unsafe { engine::adler32(seed, r.as_ptr(), r.len()) })
}

pub fn crc32_slice(seed: u32, data: &[u8]) -> u32 {
    // SAFETY: the slice is readable for its length.
    unsafe { engine::crc32(seed, data.as_ptr(), data.len()) }
}

pub fn adler32_slice(seed: u32, data: &[u8]) -> u32 {
    // SAFETY: the slice is readable for its length.
    unsafe { engine::adler32(seed, data.as_ptr(), data.len()) }
}

macro_rules! implement_checksums {
    ($(
        $(#[$($attrs:tt)*])*
        $name:ident { initial: $initial:literal, slice: $slice:ident, region: $region:ident },
    )*) => {
        $(
            $(#[$($attrs)*])*
            #[derive(Clone, Copy, Debug, PartialEq, Eq)]
            pub struct $name {
                value: u32,
            }

            impl $name {
                /// Value of the checksum over no data.
                pub const INITIAL: u32 = $initial;

                pub fn new() -> Self {
                    Self { value: Self::INITIAL }
                }

                pub fn update(&mut self, data: &[u8]) {
                    self.value = $slice(self.value, data);
                }

                pub fn update_byte(&mut self, byte: u8) {
                    self.update(&[byte]);
                }

                pub fn update_region(&mut self, region: &Region<'_>) -> Result<()> {
                    self.value = $region(self.value, region)?;
                    Ok(())
                }

                pub fn value(&self) -> u32 {
                    self.value
                }

                pub fn reset(&mut self) {
                    self.value = Self::INITIAL;
                }
            }

            impl Default for $name {
                fn default() -> Self {
                    Self::new()
                }
            }

            impl Hasher for $name {
                fn finish(&self) -> u64 {
                    u64::from(self.value)
                }

                fn write(&mut self, bytes: &[u8]) {
                    self.update(bytes);
                }
            }
        )*
    };
}

implement_checksums! {
    /// Running CRC-32 (the gzip checksum).
    Crc32 { initial: 0, slice: crc32_slice, region: crc32 },
    /// Running Adler-32 (the zlib checksum).
    Adler32 { initial: 1, slice: adler32_slice, region: adler32 },
}
