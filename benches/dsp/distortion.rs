//! Benchmarks for the waveshapers.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use singularity::dsp::distortion::{shape_buffer, ShaperKind};

use crate::BLOCK_SIZES;

pub fn bench_distortion(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/distortion");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.05).sin()).collect();
        let mut buffer = input.clone();

        for (name, kind) in [
            ("soft", ShaperKind::Soft),
            ("hard", ShaperKind::Hard),
            ("foldback", ShaperKind::Foldback),
        ] {
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    buffer.copy_from_slice(&input);
                    shape_buffer(black_box(&mut buffer), kind, 4.0, 0.7, 1.0);
                })
            });
        }
    }

    group.finish();
}
