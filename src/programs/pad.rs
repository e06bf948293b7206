//! Pad program: sustained, atmospheric texture.
//!
//! Two velocity layers. Soft playing gets a single dark sawtooth; harder
//! playing switches to a detuned pair with a slowly sweeping filter, spread
//! across the stereo field.
//!
//! # How It Works
//!
//! 1. Slow attack (300ms) and long release (600ms)
//! 2. Hard layer: second saw added 8 cents up on the same channel
//! 3. Hard layer: a unipolar LFO moves the cutoff by up to 1.5 kHz
//! 4. Hard layer: panner placed last turns the buffer stereo

use crate::{
    block::{AmpData, Combine, DspBlockData, FilterData, ModRoute, OscillatorData, PannerData},
    control::{
        controller::{EnvelopeData, LfoData},
        ControlBlockData, ControllerData,
    },
    dsp::{lfo::Polarity, oscillator::OscillatorWaveform},
    patch::{LayerData, ProgramData},
};

fn pad_envelope() -> ControllerData {
    ControllerData::envelope("ampenv", EnvelopeData::adsr(0.3, 0.1, 0.8, 0.6))
}

pub fn pad() -> ProgramData {
    let soft = LayerData::new("soft")
        .with_vel_range(0, 79)
        .with_control_block(ControlBlockData::new().with(0, pad_envelope()))
        .with_block(DspBlockData::Oscillator(OscillatorData::new(OscillatorWaveform::Saw)))
        .with_block(DspBlockData::Filter(FilterData {
            cutoff_hz: 1_500.0,
            ..FilterData::default()
        }))
        .with_block(DspBlockData::Amp(AmpData {
            source: Some(ModRoute::named("ampenv", 1.0)),
            ..AmpData::default()
        }));

    let sweep = LfoData {
        rate_hz: 0.3,
        polarity: Polarity::Unipolar,
        sync: false,
        ..LfoData::default()
    };
    let hard = LayerData::new("hard")
        .with_vel_range(80, 127)
        .with_control_block(
            ControlBlockData::new()
                .with(0, pad_envelope())
                .with(1, ControllerData::lfo("sweep", sweep)),
        )
        .with_block(DspBlockData::Oscillator(OscillatorData {
            level: 0.5,
            ..OscillatorData::new(OscillatorWaveform::Saw)
        }))
        .with_block(DspBlockData::Oscillator(OscillatorData {
            combine: Combine::Add,
            fine_cents: 8.0,
            level: 0.5,
            ..OscillatorData::new(OscillatorWaveform::Saw)
        }))
        .with_block(DspBlockData::Filter(FilterData {
            cutoff_hz: 2_000.0,
            cutoff_mod: Some(ModRoute::named("sweep", 1_500.0)),
            ..FilterData::default()
        }))
        .with_block(DspBlockData::Amp(AmpData {
            source: Some(ModRoute::named("ampenv", 1.0)),
            ..AmpData::default()
        }))
        .with_block(DspBlockData::Panner(PannerData {
            pan: 0.3,
            pan_mod: None,
        }));

    ProgramData::new("pad")
        .with_role("pad")
        .with_layer(soft)
        .with_layer(hard)
}
