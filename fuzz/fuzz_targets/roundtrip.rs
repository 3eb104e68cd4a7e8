#![no_main]

use deflate_bridge::buffer::in_critical_section;
use deflate_bridge::{Buffer, CompressionFormat, Compressor, Decompressor, HeapBuffer, Region};
use libfuzzer_sys::fuzz_target;
mod common;
use common::*;

fuzz_target!(|input: FuzzInput| {
    let format = CompressionFormat::from(input.format);
    let mut compressor = Compressor::with_level(input.level()).unwrap();

    // Compress between managed buffers sized by the bound
    let src = HeapBuffer::from_vec(input.data.clone());
    let dst = HeapBuffer::new(compressor.compress_bound(format, input.data.len()));
    let n = compressor
        .compress_region(
            &Region::whole(Buffer::managed(&src)),
            &Region::whole(Buffer::managed(&dst)),
            format,
        )
        .expect("compression within the bound must succeed");
    assert!(!in_critical_section());
    let compressed = dst.to_vec();

    // Exact-size decompression
    let mut decompressor = Decompressor::new().unwrap();
    let mut output = vec![0u8; input.data.len()];
    let outcome = decompressor
        .decompress(&compressed[..n], &mut output, format, Some(input.data.len()))
        .unwrap();
    assert_eq!(outcome.consumed(), Some(n));
    assert_eq!(output, input.data, "Decompressed output mismatches");

    // Unknown-size decompression with some slack
    let mut output = vec![0u8; input.data.len() + usize::from(input.slack)];
    let produced = decompressor
        .decompress_unknown_size(&compressed[..n], &mut output, format)
        .unwrap();
    assert_eq!(produced, Some(input.data.len()));
});
