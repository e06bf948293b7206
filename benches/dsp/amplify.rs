//! Benchmarks for gain, ring modulation and mixing.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use singularity::dsp::amplify::{
    apply_gain, mix_into, multiply_accumulate, multiply_in_place, ramp_gain,
};

use crate::BLOCK_SIZES;

pub fn bench_amplify(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/amplify");

    for &size in BLOCK_SIZES {
        let signal: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();
        let modulator: Vec<f32> = (0..size).map(|i| (i as f32 * 0.37).sin()).collect();
        let mut buffer = signal.clone();

        group.bench_with_input(BenchmarkId::new("apply_gain", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&signal);
                apply_gain(black_box(&mut buffer), 0.5);
            })
        });

        group.bench_with_input(BenchmarkId::new("ramp_gain", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&signal);
                ramp_gain(black_box(&mut buffer), 0.2, 0.8);
            })
        });

        group.bench_with_input(BenchmarkId::new("ringmod", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&signal);
                multiply_in_place(black_box(&mut buffer), black_box(&modulator));
            })
        });

        group.bench_with_input(BenchmarkId::new("ringmod_suma", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&signal);
                multiply_accumulate(black_box(&mut buffer), black_box(&modulator));
            })
        });

        let mut bus = vec![0.0f32; size];
        group.bench_with_input(BenchmarkId::new("mix_into", size), &size, |b, _| {
            b.iter(|| mix_into(black_box(&mut bus), black_box(&signal), 0.25))
        });
    }

    group.finish();
}
