//! Pluck program: percussive, quickly-decaying note.
//!
//! Triangle wave with an instant attack and no sustain. A key-track
//! controller opens the filter for higher notes so the top of the keyboard
//! does not turn dull.

use crate::{
    block::{AmpData, DspBlockData, FilterData, ModRoute, OscillatorData},
    control::{controller::EnvelopeData, ControlBlockData, ControllerData},
    dsp::oscillator::OscillatorWaveform,
    patch::{LayerData, ProgramData},
};

pub fn pluck() -> ProgramData {
    let controls = ControlBlockData::new()
        .with(0, ControllerData::envelope("ampenv", EnvelopeData::adsr(0.001, 0.15, 0.0, 0.1)))
        .with(1, ControllerData::key_track("keytrack", 60, 1.0));

    ProgramData::new("pluck").with_role("arp").with_layer(
        LayerData::new("tri")
            .with_control_block(controls)
            .with_block(DspBlockData::Oscillator(OscillatorData::new(OscillatorWaveform::Triangle)))
            .with_block(DspBlockData::Filter(FilterData {
                cutoff_hz: 4_000.0,
                cutoff_mod: Some(ModRoute::named("keytrack", 1_000.0)),
                ..FilterData::default()
            }))
            .with_block(DspBlockData::Amp(AmpData {
                vel_track: 1.0,
                source: Some(ModRoute::named("ampenv", 1.0)),
                ..AmpData::default()
            })),
    )
}
