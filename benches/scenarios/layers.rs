//! Benchmarks for single layers: control blocks plus the DSP chain.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use singularity::{
    control::KeyOnInfo,
    programs,
    synth::{BlockMask, LayerInst},
    MAX_BLOCK_SIZE,
};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_layers(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/layers");
    let koi = KeyOnInfo {
        note: 45, // A2
        velocity: 100,
        layer: 0,
        sample_rate: SAMPLE_RATE,
        time: 0,
    };

    for &size in BLOCK_SIZES {
        for (_, program) in programs::all() {
            let Some(data) = program.layers.first() else {
                continue;
            };
            let mut layer = LayerInst::new(0, MAX_BLOCK_SIZE);
            layer.key_on(data.clone(), &koi);

            group.bench_with_input(BenchmarkId::new(program.name.as_str(), size), &size, |b, _| {
                b.iter(|| black_box(layer.compute(black_box(size), BlockMask::ALL)))
            });
        }
    }

    group.finish();
}
