//! Spectral checks: OSC blocks play the pitch their settings ask for.

use std::sync::Arc;

use rustfft::{num_complex::Complex, FftPlanner};
use singularity::{
    block::{DspBlockData, OscillatorData},
    dsp::oscillator::OscillatorWaveform,
    LayerData, ProgramBank, ProgramData, Synth, SynthConfig,
};

const SAMPLE_RATE: f32 = 48_000.0;
const FFT_SIZE: usize = 8192;

fn render(osc: OscillatorData, note: u8) -> Vec<f32> {
    let program = ProgramData::new("tone")
        .with_layer(LayerData::new("osc").with_block(DspBlockData::Oscillator(osc)));
    let bank = ProgramBank::new("pitch").with_program(0, program).unwrap();
    let program = bank.program_by_name("tone").cloned().unwrap();

    let config = SynthConfig::default().with_sample_rate(SAMPLE_RATE).with_max_voices(1);
    let mut synth = Synth::new(config, Arc::new(bank)).unwrap();
    synth.key_on(note, 100, &program).unwrap();

    let mut left = vec![0.0f32; FFT_SIZE];
    let mut right = vec![0.0f32; FFT_SIZE];
    synth.compute(&mut left, &mut right);
    left
}

/// Frequency of the strongest bin, Hann windowed.
fn dominant_frequency(signal: &[f32]) -> f32 {
    let n = signal.len();
    let mut spectrum: Vec<Complex<f32>> = signal
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let w = 0.5 - 0.5 * (std::f32::consts::TAU * i as f32 / n as f32).cos();
            Complex::new(x * w, 0.0)
        })
        .collect();

    FftPlanner::<f32>::new().plan_fft_forward(n).process(&mut spectrum);

    let peak = spectrum[1..n / 2]
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.norm().total_cmp(&b.norm()))
        .map(|(i, _)| i + 1)
        .unwrap_or(0);
    peak as f32 * SAMPLE_RATE / n as f32
}

fn assert_near(actual: f32, expected: f32) {
    let bin = SAMPLE_RATE / FFT_SIZE as f32;
    assert!(
        (actual - expected).abs() <= bin,
        "expected {expected} Hz, got {actual} Hz"
    );
}

#[test]
fn note_pitch() {
    let tone = render(OscillatorData::new(OscillatorWaveform::Sine), 69);
    assert_near(dominant_frequency(&tone), 440.0);
}

#[test]
fn coarse_and_fine_tuning() {
    let octave_up = OscillatorData {
        coarse: 12,
        ..OscillatorData::new(OscillatorWaveform::Sine)
    };
    assert_near(dominant_frequency(&render(octave_up, 57)), 440.0);

    let fifth_up = OscillatorData {
        coarse: 7,
        fine_cents: 1.955, // just intonation
        ..OscillatorData::new(OscillatorWaveform::Sine)
    };
    assert_near(dominant_frequency(&render(fifth_up, 69)), 660.0);
}

#[test]
fn fixed_frequency_ignores_the_note() {
    let fixed = OscillatorData {
        fixed_hz: Some(1_000.0),
        ..OscillatorData::new(OscillatorWaveform::Triangle)
    };
    assert_near(dominant_frequency(&render(fixed.clone(), 30)), 1_000.0);
    assert_near(dominant_frequency(&render(fixed, 100)), 1_000.0);
}
