//! Benchmarks for ADSR envelope generator.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use singularity::dsp::envelope::Envelope;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Attack phase (ramping up)
        let mut env = Envelope::adsr(0.1, 0.1, 0.7, 0.3);
        env.note_on();
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| env.render(black_box(&mut buffer), SAMPLE_RATE))
        });

        // Sustain phase (holding steady)
        let mut env = Envelope::adsr(0.001, 0.001, 0.7, 0.3);
        env.note_on();
        env.advance(200, SAMPLE_RATE);
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| env.render(black_box(&mut buffer), SAMPLE_RATE))
        });

        // Controller-style: one value per buffer
        let mut env = Envelope::adsr(0.5, 0.5, 0.7, 0.3);
        env.note_on();
        group.bench_with_input(BenchmarkId::new("advance", size), &size, |b, _| {
            b.iter(|| black_box(env.advance(black_box(size), SAMPLE_RATE)))
        });
    }

    group.finish();
}
