//! Lead program.
//!
//! A bright sawtooth with gentle vibrato and a filter that opens with the
//! amplitude envelope.
//!
//! # How It Works
//!
//! 1. Sawtooth oscillator, pitch modulated by a sine LFO (±12 cents)
//! 2. Low-pass filter; the envelope adds up to 2.5 kHz on top of 1.2 kHz
//! 3. Amp follows the same envelope, with half velocity tracking
//!
//! # Variations
//!
//! - Raise the LFO depth for a wobbly, expressive lead
//! - Add a second detuned OSC with `combine = "add"` for a thicker sound

use crate::{
    block::{AmpData, DspBlockData, FilterData, ModRoute, OscillatorData},
    control::{
        controller::{EnvelopeData, LfoData},
        ControlBlockData, ControllerData,
    },
    dsp::oscillator::OscillatorWaveform,
    patch::{LayerData, ProgramData},
};

pub fn lead() -> ProgramData {
    let controls = ControlBlockData::new()
        .with(0, ControllerData::envelope("ampenv", EnvelopeData::adsr(0.01, 0.2, 0.7, 0.25)))
        .with(
            1,
            ControllerData::lfo(
                "vibrato",
                LfoData {
                    rate_hz: 5.5,
                    ..LfoData::default()
                },
            ),
        );

    ProgramData::new("lead").with_role("lead").with_layer(
        LayerData::new("saw")
            .with_control_block(controls)
            .with_block(DspBlockData::Oscillator(OscillatorData {
                pitch_mod: Some(ModRoute::named("vibrato", 12.0)),
                ..OscillatorData::new(OscillatorWaveform::Saw)
            }))
            .with_block(DspBlockData::Filter(FilterData {
                cutoff_hz: 1_200.0,
                resonance: 0.35,
                cutoff_mod: Some(ModRoute::named("ampenv", 2_500.0)),
                ..FilterData::default()
            }))
            .with_block(DspBlockData::Amp(AmpData {
                vel_track: 0.5,
                source: Some(ModRoute::named("ampenv", 1.0)),
                ..AmpData::default()
            })),
    )
}
