//! Benchmark suite for libdeflate compression through the buffer bridge.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use deflate_bridge::{
    Buffer, CompressionFormat, CompressionLevel, Compressor, Crc32, Decompressor, HeapBuffer,
    OffHeapBuffer, Region,
};
use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng};

const SIZES: &[usize; 2] = &[16 * 1024, 256 * 1024];
const SEED: u64 = 456;

type DataGeneratorFn = fn(usize) -> Vec<u8>;

/// Uniformly random bytes, close to incompressible
fn generate_random_data(size: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(SEED);
    (0..size).map(|_| rng.random()).collect()
}

/// Random words from a small vocabulary, roughly like text
fn generate_text_data(size: usize) -> Vec<u8> {
    const WORDS: &[&[u8]] = &[
        b"deflate ", b"buffer ", b"region ", b"managed ", b"external ", b"critical ",
        b"section ", b"engine ", b"the ", b"a ", b"of ", b"and ",
    ];
    let mut rng = StdRng::seed_from_u64(SEED);
    let mut data = Vec::with_capacity(size + 16);
    while data.len() < size {
        data.extend_from_slice(WORDS[rng.random_range(0..WORDS.len())]);
    }
    data.truncate(size);
    data
}

/// Short runs of repeated bytes
fn generate_run_data(size: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(SEED);
    let mut data = Vec::with_capacity(size + 64);
    while data.len() < size {
        let byte: u8 = rng.random();
        let run = rng.random_range(1..64);
        data.extend(std::iter::repeat_n(byte, run));
    }
    data.truncate(size);
    data
}

fn patterns() -> [(&'static str, DataGeneratorFn); 3] {
    [
        ("random", generate_random_data),
        ("text", generate_text_data),
        ("runs", generate_run_data),
    ]
}

fn benchmark_compression(c: &mut Criterion) {
    let mut group = c.benchmark_group("compression");

    for &size in SIZES {
        for (name, generator) in patterns() {
            let data = generator(size);
            let mut compressor = Compressor::new().unwrap();
            let mut output = vec![0u8; compressor.compress_bound(CompressionFormat::Gzip, size)];

            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(BenchmarkId::new(name, size), &data, |b, data| {
                b.iter(|| {
                    black_box(
                        compressor
                            .compress(black_box(data), &mut output, CompressionFormat::Gzip)
                            .unwrap(),
                    )
                });
            });
        }
    }

    group.finish();
}

fn benchmark_decompression(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompression");

    for &size in SIZES {
        for (name, generator) in patterns() {
            let data = generator(size);
            let compressed = Compressor::new()
                .unwrap()
                .compress_to_vec(&data, CompressionFormat::Gzip)
                .unwrap();
            let mut decompressor = Decompressor::new().unwrap();
            let mut output = vec![0u8; size];

            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(BenchmarkId::new(name, size), &compressed, |b, compressed| {
                b.iter(|| {
                    black_box(
                        decompressor
                            .decompress(
                                black_box(compressed),
                                &mut output,
                                CompressionFormat::Gzip,
                                Some(size),
                            )
                            .unwrap(),
                    )
                });
            });
        }
    }

    group.finish();
}

fn benchmark_levels(c: &mut Criterion) {
    let mut group = c.benchmark_group("levels");

    let size = *SIZES.last().unwrap();
    let data = generate_text_data(size);

    for level in [1, 6, 9, 12] {
        let mut compressor = Compressor::with_level(CompressionLevel::new(level).unwrap()).unwrap();
        let mut output = vec![0u8; compressor.compress_bound(CompressionFormat::Deflate, size)];

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(format!("level_{level}"), |b| {
            b.iter(|| {
                black_box(
                    compressor
                        .compress(black_box(&data), &mut output, CompressionFormat::Deflate)
                        .unwrap(),
                )
            });
        });
    }

    group.finish();
}

/// Compares slice calls with the mediated region path for both buffer kinds.
fn benchmark_buffer_kinds(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_kinds");

    let size = *SIZES.first().unwrap();
    let data = generate_text_data(size);
    let mut compressor = Compressor::new().unwrap();
    let bound = compressor.compress_bound(CompressionFormat::Zlib, size);

    let heap_in = HeapBuffer::from_vec(data.clone());
    let heap_out = HeapBuffer::new(bound);
    let direct_in = OffHeapBuffer::from_slice(&data).unwrap();
    let direct_out = OffHeapBuffer::new(bound).unwrap();

    group.throughput(Throughput::Bytes(size as u64));
    group.bench_function("managed", |b| {
        let (src, dst) = (Buffer::managed(&heap_in), Buffer::managed(&heap_out));
        b.iter(|| {
            black_box(
                compressor
                    .compress_region(&Region::whole(src), &Region::whole(dst), CompressionFormat::Zlib)
                    .unwrap(),
            )
        });
    });
    group.bench_function("external", |b| {
        let (src, dst) = (Buffer::external(&direct_in), Buffer::external(&direct_out));
        b.iter(|| {
            black_box(
                compressor
                    .compress_region(&Region::whole(src), &Region::whole(dst), CompressionFormat::Zlib)
                    .unwrap(),
            )
        });
    });

    group.finish();
}

fn benchmark_checksums(c: &mut Criterion) {
    let mut group = c.benchmark_group("checksums");

    for &size in SIZES {
        let data = generate_random_data(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("crc32", size), &data, |b, data| {
            b.iter(|| {
                let mut crc = Crc32::new();
                crc.update(black_box(data));
                black_box(crc.value())
            });
        });
        group.bench_with_input(BenchmarkId::new("adler32", size), &data, |b, data| {
            b.iter(|| black_box(deflate_bridge::adler32_slice(1, black_box(data))));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_compression,
    benchmark_decompression,
    benchmark_levels,
    benchmark_buffer_kinds,
    benchmark_checksums
);
criterion_main!(benches);
