mod common;

use common::{init_logging, Event, RecordingArray, Unaddressable};
use deflate_bridge::buffer::{in_critical_section, ReleaseMode};
use deflate_bridge::{
    crc32, Buffer, CompressionFormat, Compressor, Decompressor, Error, HeapBuffer,
    OffHeapBuffer, Region, Side,
};

const ACQUIRED_FOR_READ: [Event; 2] = [Event::Enter, Event::Exit(ReleaseMode::Discard)];
const ACQUIRED_FOR_WRITE: [Event; 2] = [Event::Enter, Event::Exit(ReleaseMode::Commit)];

fn stream(data: &[u8], format: CompressionFormat) -> Vec<u8> {
    Compressor::new().unwrap().compress_to_vec(data, format).unwrap()
}

#[test]
fn each_region_is_released_once_with_its_own_buffer() {
    init_logging();
    let data = b"released exactly once, released exactly once".repeat(4);
    let compressed = stream(&data, CompressionFormat::Deflate);
    let input = RecordingArray::new(&compressed);
    let output = RecordingArray::new(&vec![0; data.len()]);

    let outcome = Decompressor::new()
        .unwrap()
        .decompress_region(
            &Region::whole(Buffer::managed(&input)),
            &Region::whole(Buffer::managed(&output)),
            CompressionFormat::Deflate,
            Some(data.len()),
        )
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(input.events(), ACQUIRED_FOR_READ);
    assert_eq!(output.events(), ACQUIRED_FOR_WRITE);
    assert_eq!(output.to_vec(), data);
    assert!(!in_critical_section());
}

#[test]
fn compression_releases_input_and_commits_output() {
    let input = RecordingArray::new(b"compress me, compress me, compress me");
    let output = RecordingArray::new(&[0; 128]);

    let n = Compressor::new()
        .unwrap()
        .compress_region(
            &Region::whole(Buffer::managed(&input)),
            &Region::whole(Buffer::managed(&output)),
            CompressionFormat::Zlib,
        )
        .unwrap();

    assert!(n > 0);
    assert_eq!(input.events(), ACQUIRED_FOR_READ);
    assert_eq!(output.events(), ACQUIRED_FOR_WRITE);
}

#[test]
fn failed_second_acquisition_releases_the_first() {
    init_logging();
    let input = RecordingArray::new(b"input that is never compressed");
    let output = RecordingArray::refusing(64);

    let err = Compressor::new()
        .unwrap()
        .compress_region(
            &Region::whole(Buffer::managed(&input)),
            &Region::whole(Buffer::managed(&output)),
            CompressionFormat::Gzip,
        )
        .unwrap_err();

    assert!(matches!(err, Error::OutOfMemory(_)));
    assert_eq!(input.events(), ACQUIRED_FOR_READ);
    assert_eq!(output.events(), [Event::Enter]);
    assert!(!in_critical_section());
}

#[test]
fn missing_external_address_is_reported_before_pinning() {
    let input = RecordingArray::new(b"never pinned");
    let output = Unaddressable(64);

    let err = Compressor::new()
        .unwrap()
        .compress_region(
            &Region::whole(Buffer::managed(&input)),
            &Region::whole(Buffer::external(&output)),
            CompressionFormat::Deflate,
        )
        .unwrap_err();

    assert_eq!(err, Error::BufferUnavailable { side: Side::Output });
    assert!(input.events().is_empty());
}

#[test]
fn missing_input_address_leaves_output_alone() {
    let input = Unaddressable(16);
    let output = RecordingArray::new(&[0; 64]);

    let err = Decompressor::new()
        .unwrap()
        .decompress_region(
            &Region::whole(Buffer::external(&input)),
            &Region::whole(Buffer::managed(&output)),
            CompressionFormat::Zlib,
            None,
        )
        .unwrap_err();

    assert_eq!(err, Error::BufferUnavailable { side: Side::Input });
    assert!(output.events().is_empty());
}

#[test]
fn data_errors_still_release_both_regions() {
    init_logging();
    let mut corrupt = stream(b"a checksum that will not match", CompressionFormat::Zlib);
    let last = corrupt.len() - 1;
    corrupt[last] ^= 0xFF;
    let input = RecordingArray::new(&corrupt);
    let output = RecordingArray::new(&[0; 64]);

    let err = Decompressor::new()
        .unwrap()
        .decompress_region(
            &Region::whole(Buffer::managed(&input)),
            &Region::whole(Buffer::managed(&output)),
            CompressionFormat::Zlib,
            None,
        )
        .unwrap_err();

    assert_eq!(err, Error::CorruptData);
    assert_eq!(input.events(), ACQUIRED_FOR_READ);
    assert_eq!(output.events(), ACQUIRED_FOR_WRITE);
}

#[test]
fn output_too_small_still_releases_both_regions() {
    let input = RecordingArray::new(&[1u8; 4096]);
    let output = RecordingArray::new(&[0; 4]);

    let err = Compressor::new()
        .unwrap()
        .compress_region(
            &Region::whole(Buffer::managed(&input)),
            &Region::whole(Buffer::managed(&output)),
            CompressionFormat::Gzip,
        )
        .unwrap_err();

    assert_eq!(err, Error::BufferTooSmall);
    assert_eq!(input.events(), ACQUIRED_FOR_READ);
    assert_eq!(output.events(), ACQUIRED_FOR_WRITE);
}

#[test]
fn mixed_kinds_only_pin_the_managed_side() {
    let data = b"mixed kinds".repeat(8);
    let input = RecordingArray::new(&data);
    let output = OffHeapBuffer::new(128).unwrap();

    Compressor::new()
        .unwrap()
        .compress_region(
            &Region::whole(Buffer::managed(&input)),
            &Region::whole(Buffer::external(&output)),
            CompressionFormat::Deflate,
        )
        .unwrap();
    assert_eq!(input.events(), ACQUIRED_FOR_READ);
}

#[test]
fn checksum_of_refusing_array_is_out_of_memory() {
    let array = RecordingArray::refusing(8);
    let err = crc32(0, &Region::whole(Buffer::managed(&array))).unwrap_err();
    assert!(matches!(err, Error::OutOfMemory(_)));
    assert!(!in_critical_section());
}

#[test]
fn asserted_size_beyond_output_never_pins() {
    let input = RecordingArray::new(&stream(b"abc", CompressionFormat::Deflate));
    let output = RecordingArray::new(&[0; 2]);

    let err = Decompressor::new()
        .unwrap()
        .decompress_region(
            &Region::whole(Buffer::managed(&input)),
            &Region::whole(Buffer::managed(&output)),
            CompressionFormat::Deflate,
            Some(3),
        )
        .unwrap_err();

    assert!(matches!(err, Error::OutOfBounds { .. }));
    assert!(input.events().is_empty());
    assert!(output.events().is_empty());
}

#[test]
fn overlapping_regions_of_one_buffer_are_refused() {
    let array = RecordingArray::new(&b"overlap ".repeat(30));
    let err = Compressor::new()
        .unwrap()
        .compress_region(
            &Region::new(Buffer::managed(&array), 0, 240).unwrap(),
            &Region::new(Buffer::managed(&array), 10, 100).unwrap(),
            CompressionFormat::Deflate,
        )
        .unwrap_err();
    assert_eq!(err, Error::OverlappingRegions);
    assert!(array.events().is_empty());

    let heap = HeapBuffer::new(256);
    let err = Decompressor::new()
        .unwrap()
        .decompress_region(
            &Region::new(Buffer::managed(&heap), 0, 128).unwrap(),
            &Region::new(Buffer::managed(&heap), 100, 156).unwrap(),
            CompressionFormat::Zlib,
            None,
        )
        .unwrap_err();
    assert_eq!(err, Error::OverlappingRegions);
    assert!(!heap.is_pinned());
}

#[test]
fn disjoint_regions_of_one_buffer_roundtrip() {
    let data = b"same buffer, different halves".repeat(4);
    let mut bytes = data.clone();
    bytes.resize(1024, 0);
    let heap = HeapBuffer::from_vec(bytes);

    let n = Compressor::new()
        .unwrap()
        .compress_region(
            &Region::new(Buffer::managed(&heap), 0, data.len()).unwrap(),
            &Region::tail(Buffer::managed(&heap), 512).unwrap(),
            CompressionFormat::Gzip,
        )
        .unwrap();
    let stream = heap.to_vec()[512..512 + n].to_vec();
    let back = Decompressor::new()
        .unwrap()
        .decompress_exact_to_vec(&stream, CompressionFormat::Gzip, data.len())
        .unwrap();
    assert_eq!(back, data);
}
