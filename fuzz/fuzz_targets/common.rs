use deflate_bridge::{CompressionFormat, CompressionLevel};

#[derive(arbitrary::Arbitrary)]
pub struct FuzzInput {
    pub data: Vec<u8>,
    pub format: FuzzFormat,
    pub level: u8,
    /// Extra output room beyond the exact size, for unknown-size calls
    pub slack: u16,
}

impl FuzzInput {
    pub fn level(&self) -> CompressionLevel {
        CompressionLevel::new(i32::from(self.level % 13)).unwrap()
    }
}

impl std::fmt::Debug for FuzzInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FuzzInput")
            .field("format", &self.format)
            .field("level", &self.level)
            .field("slack", &self.slack)
            .field("data", &HexSlice(&self.data))
            .finish()
    }
}

#[derive(arbitrary::Arbitrary, Clone, Copy, PartialEq, Eq, Debug)]
pub enum FuzzFormat {
    Deflate,
    Zlib,
    Gzip,
}

impl From<FuzzFormat> for CompressionFormat {
    fn from(format: FuzzFormat) -> Self {
        match format {
            FuzzFormat::Deflate => CompressionFormat::Deflate,
            FuzzFormat::Zlib => CompressionFormat::Zlib,
            FuzzFormat::Gzip => CompressionFormat::Gzip,
        }
    }
}

pub struct HexSlice<'a>(pub &'a [u8]);

impl std::fmt::Debug for HexSlice<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const MAX: usize = 32;

        let total = self.0.len();
        let shown = total.min(MAX);

        let mut list = f.debug_list();

        for v in &self.0[..shown] {
            list.entry(&format_args!("{v:#04x}"));
        }

        if total > MAX {
            list.entry(&format_args!(".. out of {total} total"));
        }

        list.finish()
    }
}
