//! Benchmarks for the whole voice pool.
//!
//! Every voice sounding is the worst case the compute thread has to meet.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion};
use singularity::{ProgramBank, ProgramData, Synth, SynthConfig};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

const VOICES: usize = 16;

/// A synth with every voice playing `program`.
fn full_synth(program: &str) -> Option<(Synth, Arc<ProgramData>)> {
    let bank = ProgramBank::factory().ok()?;
    let program = bank.program_by_name(program)?.clone();
    let config = SynthConfig::default()
        .with_sample_rate(SAMPLE_RATE)
        .with_max_voices(VOICES);
    let mut synth = Synth::new(config, Arc::new(bank)).ok()?;
    for i in 0..VOICES {
        synth.key_on(36 + 3 * i as u8, 100, &program);
    }
    Some((synth, program))
}

pub fn bench_synth(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/synth");

    for &size in BLOCK_SIZES {
        let mut left = vec![0.0f32; size];
        let mut right = vec![0.0f32; size];

        for name in ["lead", "bell", "pad"] {
            let Some((mut synth, _)) = full_synth(name) else {
                continue;
            };
            let id = BenchmarkId::new(format!("{name}_x{VOICES}"), size);
            group.bench_with_input(id, &size, |b, _| {
                b.iter(|| synth.compute(black_box(&mut left), black_box(&mut right)))
            });
        }

        // Steady stream of note-ons into a full pool
        if let Some((mut synth, pluck)) = full_synth("pluck") {
            let mut note = 48u8;
            group.bench_with_input(BenchmarkId::new("pluck_stealing", size), &size, |b, _| {
                b.iter(|| {
                    note = if note >= 84 { 48 } else { note + 1 };
                    synth.key_on(note, 90, &pluck);
                    synth.compute(black_box(&mut left), black_box(&mut right));
                })
            });
        }
    }

    group.finish();
}
