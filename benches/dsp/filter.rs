//! Benchmarks for state-variable filter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use singularity::dsp::filter::SVFilter;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        // sawtooth-like ramp
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        for (name, filter) in [
            ("lowpass", SVFilter::lowpass(1000.0)),
            ("highpass", SVFilter::highpass(1000.0)),
            ("bandpass", SVFilter::bandpass(1000.0)),
            ("notch", SVFilter::notch(1000.0)),
        ] {
            let mut filter = filter.with_resonance(0.5);
            let mut buffer = input.clone();
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    buffer.copy_from_slice(&input);
                    filter.render(black_box(&mut buffer), SAMPLE_RATE);
                })
            });
        }

        // Cutoff moved every buffer, as a modulated FILTER block does
        let mut filter = SVFilter::lowpass(1000.0).with_resonance(0.5);
        let mut buffer = input.clone();
        let mut cutoff = 200.0f32;
        group.bench_with_input(BenchmarkId::new("lowpass_modulated", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                cutoff = if cutoff > 8_000.0 { 200.0 } else { cutoff * 1.1 };
                filter.render_at(black_box(&mut buffer), SAMPLE_RATE, cutoff);
            })
        });
    }

    group.finish();
}
