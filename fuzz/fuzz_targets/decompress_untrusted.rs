#![no_main]

use deflate_bridge::buffer::in_critical_section;
use deflate_bridge::{
    Buffer, CompressionFormat, Decompressor, HeapBuffer, OffHeapBuffer, Outcome, Region,
};
use libfuzzer_sys::fuzz_target;
mod common;
use common::*;

fuzz_target!(|input: FuzzInput| {
    let format = CompressionFormat::from(input.format);
    let mut decompressor = Decompressor::new().unwrap();

    // Arbitrary bytes must never crash or leave a buffer pinned
    let src = OffHeapBuffer::from_slice(&input.data).unwrap();
    let dst = HeapBuffer::new(usize::from(input.slack));
    let result = decompressor.decompress_region(
        &Region::whole(Buffer::external(&src)),
        &Region::whole(Buffer::managed(&dst)),
        format,
        None,
    );
    assert!(!in_critical_section());
    assert!(!dst.is_pinned());

    match &result {
        Ok(Outcome::Success { produced, consumed }) => {
            assert!(*produced <= dst.len());
            assert!(*consumed <= input.data.len());
        }
        Ok(Outcome::InsufficientSpace) => {}
        Err(err) => assert!(err.is_data_error(), "unexpected error {err:?}"),
    }

    // The growing helper agrees with the single call whenever that one fit
    if let Ok(Outcome::Success { produced, .. }) = result {
        let grown = decompressor
            .decompress_to_vec(&input.data, format, 1 << 20)
            .unwrap();
        assert_eq!(grown.len(), produced);
        assert_eq!(&grown[..], &dst.to_vec()[..produced]);
    }
});
