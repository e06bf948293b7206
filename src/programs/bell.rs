//! Bell program.
//!
//! Ring modulation of two sines at an inharmonic ratio. The product holds
//! only sum and difference frequencies, which is what gives struck metal its
//! clangorous partials.
//!
//! # How It Works
//!
//! 1. Carrier sine on the upper channel at the note pitch
//! 2. Modulator sine on the lower channel, 19 semitones and 14 cents up
//!    (close to a 3.5:1 ratio)
//! 3. `RINGMOD SUMA` keeps the carrier and adds the product, so the
//!    fundamental stays audible
//! 4. Long percussive envelope, release shortening up the keyboard

use crate::{
    block::{AmpData, Channel, DspBlockData, ModRoute, OscillatorData},
    control::{controller::EnvelopeData, ControlBlockData, ControllerData},
    dsp::oscillator::OscillatorWaveform,
    patch::{LayerData, ProgramData},
};

pub fn bell() -> ProgramData {
    let envelope = EnvelopeData {
        release_key_track: 0.5,
        ..EnvelopeData::adsr(0.001, 1.8, 0.0, 1.2)
    };
    let controls = ControlBlockData::new().with(0, ControllerData::envelope("ampenv", envelope));

    ProgramData::new("bell").with_role("keys").with_layer(
        LayerData::new("ring")
            .with_control_block(controls)
            .with_block(DspBlockData::Oscillator(OscillatorData::new(OscillatorWaveform::Sine)))
            .with_block(DspBlockData::Oscillator(OscillatorData {
                channel: Channel::Lower,
                coarse: 19,
                fine_cents: 14.0,
                ..OscillatorData::new(OscillatorWaveform::Sine)
            }))
            .with_block(DspBlockData::RingModSumA)
            .with_block(DspBlockData::Amp(AmpData {
                gain_db: -6.0,
                vel_track: 0.8,
                source: Some(ModRoute::named("ampenv", 1.0)),
            })),
    )
}
