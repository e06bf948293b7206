//! Bass program.
//!
//! A square wave filtered down, one octave below the played note. Square
//! waves have only odd harmonics, giving a hollow, woody character.
//!
//! A separate fast filter envelope gives each note a short "pluck" of
//! brightness before settling, in the manner of classic acid basses.

use crate::{
    block::{AmpData, DspBlockData, FilterData, ModRoute, OscillatorData, ShaperData},
    control::{controller::EnvelopeData, ControlBlockData, ControllerData},
    dsp::{distortion::ShaperKind, oscillator::OscillatorWaveform},
    patch::{LayerData, ProgramData},
};

pub fn bass() -> ProgramData {
    let controls = ControlBlockData::new()
        .with(0, ControllerData::envelope("ampenv", EnvelopeData::adsr(0.005, 0.1, 0.7, 0.15)))
        .with(1, ControllerData::envelope("filtenv", EnvelopeData::adsr(0.001, 0.12, 0.0, 0.1)));

    ProgramData::new("bass").with_role("bass").with_layer(
        LayerData::new("square")
            .with_key_range(0, 84)
            .with_control_block(controls)
            .with_block(DspBlockData::Oscillator(OscillatorData {
                coarse: -12,
                ..OscillatorData::new(OscillatorWaveform::Square)
            }))
            .with_block(DspBlockData::Filter(FilterData {
                cutoff_hz: 400.0,
                resonance: 0.5,
                cutoff_mod: Some(ModRoute::named("filtenv", 1_800.0)),
                ..FilterData::default()
            }))
            .with_block(DspBlockData::Shaper(ShaperData {
                kind: ShaperKind::Soft,
                drive: 1.5,
                ..ShaperData::default()
            }))
            .with_block(DspBlockData::Amp(AmpData {
                source: Some(ModRoute::named("ampenv", 1.0)),
                ..AmpData::default()
            })),
    )
}
