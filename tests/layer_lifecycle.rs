use std::sync::Arc;

use singularity::{
    block::{AmpData, Channel, DspBlockData, FilterData, ModRoute, OscillatorData},
    control::{
        controller::{EnvelopeData, LfoData},
        ControlBlockData, ControllerData, ControllerKey, CtrlRef, KeyOnInfo,
    },
    dsp::oscillator::OscillatorWaveform,
    synth::{BlockMask, LayerInst, LayerState},
    LayerData, MAX_CTRL_PER_BLOCK,
};

const SAMPLE_RATE: f32 = 48_000.0;
const FRAMES: usize = 128;

fn koi(note: u8, velocity: u8) -> KeyOnInfo {
    KeyOnInfo {
        note,
        velocity,
        layer: 0,
        sample_rate: SAMPLE_RATE,
        time: 0,
    }
}

fn enveloped(waveform: OscillatorWaveform, env: EnvelopeData) -> Arc<LayerData> {
    Arc::new(
        LayerData::new("main")
            .with_control_block(ControlBlockData::new().with(0, ControllerData::envelope("ampenv", env)))
            .with_block(DspBlockData::Oscillator(OscillatorData::new(waveform)))
            .with_block(DspBlockData::Amp(AmpData {
                source: Some(ModRoute::named("ampenv", 1.0)),
                ..AmpData::default()
            })),
    )
}

#[test]
fn sustained_note_walks_the_full_lifecycle() {
    // square wave: every sample sits at ±gain, so the buffer peak tracks the envelope
    let data = enveloped(OscillatorWaveform::Square, EnvelopeData::adsr(0.01, 0.05, 0.7, 0.05));
    let mut layer = LayerInst::new(0, FRAMES);
    let mut states = vec![layer.state()];

    layer.key_on(data, &koi(60, 100));
    states.push(layer.state());

    for _ in 0..5 {
        assert!(layer.compute(FRAMES, BlockMask::ALL));
        assert!(layer.peak() > 0.0, "sustained buffer is silent");
    }
    states.push(layer.state());

    assert!(layer.key_off());
    states.push(layer.state());

    let mut release_peaks = Vec::new();
    for _ in 0..100 {
        layer.compute(FRAMES, BlockMask::ALL);
        release_peaks.push(layer.peak());
        if layer.state() == LayerState::Finished {
            break;
        }
    }
    states.push(layer.state());

    assert_eq!(
        states,
        [
            LayerState::Idle,
            LayerState::KeyOn,
            LayerState::Sustain,
            LayerState::Releasing,
            LayerState::Finished,
        ]
    );
    assert!(release_peaks.len() > 2);
    for pair in release_peaks.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-6, "release grew: {pair:?}");
    }
    assert!(release_peaks.last().copied().unwrap_or(1.0) < 0.1);
}

fn ring_layer(block: DspBlockData) -> Arc<LayerData> {
    // 1 Hz squares hold their first half-cycle value for the whole buffer
    Arc::new(
        LayerData::new("ring")
            .with_block(DspBlockData::Oscillator(OscillatorData {
                fixed_hz: Some(1.0),
                ..OscillatorData::new(OscillatorWaveform::Square)
            }))
            .with_block(DspBlockData::Oscillator(OscillatorData {
                channel: Channel::Lower,
                fixed_hz: Some(1.0),
                level: 0.5,
                ..OscillatorData::new(OscillatorWaveform::Square)
            }))
            .with_block(block),
    )
}

#[test]
fn ring_mod_overwrites_and_suma_accumulates() {
    for (block, expected) in [(DspBlockData::RingMod, 0.5), (DspBlockData::RingModSumA, 1.5)] {
        let mut layer = LayerInst::new(0, FRAMES);
        layer.key_on(ring_layer(block), &koi(60, 100));
        layer.compute(FRAMES, BlockMask::ALL);

        assert!(layer.buffer().upper().iter().all(|&s| s == expected));
        assert!(layer.buffer().lower().iter().all(|&s| s == 0.5));
    }
}

fn sparse_controls() -> Arc<LayerData> {
    Arc::new(
        LayerData::new("sparse")
            .with_control_block(
                ControlBlockData::new()
                    .with(0, ControllerData::envelope("ampenv", EnvelopeData::default()))
                    .with(3, ControllerData::velocity("vel", 1.0)),
            )
            .with_control_block(ControlBlockData::new().with(2, ControllerData::key_track("kt", 60, 1.0))),
    )
}

#[test]
fn instances_mirror_data_slots() {
    let data = sparse_controls();
    let mut layer = LayerInst::new(0, FRAMES);
    layer.key_on(data.clone(), &koi(72, 64));

    for (block, cbd) in data.control_blocks.iter().enumerate() {
        for slot in 0..MAX_CTRL_PER_BLOCK {
            let inst = layer.control_block(block).controller(slot);
            assert_eq!(inst.is_some(), cbd.get(slot).is_some(), "block {block} slot {slot}");
        }
    }
}

#[test]
fn every_controller_is_registered_both_ways() {
    let data = sparse_controls();
    let mut layer = LayerInst::new(0, FRAMES);
    layer.key_on(data.clone(), &koi(72, 64));

    let maps = layer.maps();
    assert_eq!(maps.len(), 3);
    for (block, cbd) in data.control_blocks.iter().enumerate() {
        for (slot, controller) in cbd.iter() {
            let at = CtrlRef { block, slot };
            assert_eq!(maps.by_data(ControllerKey::new(block, slot)), Some(at));
            assert_eq!(maps.by_name(&controller.name), Some(at));
        }
    }

    let kt = layer.control_block(1).controller(2).map(|c| c.value());
    assert_eq!(kt, Some(1.0));
}

#[test]
fn second_key_off_changes_nothing() {
    let data = enveloped(OscillatorWaveform::Sine, EnvelopeData::adsr(0.01, 0.1, 0.5, 0.5));
    let mut layer = LayerInst::new(0, FRAMES);
    layer.key_on(data, &koi(60, 100));
    layer.compute(FRAMES, BlockMask::ALL);

    assert!(layer.key_off());
    layer.compute(FRAMES, BlockMask::ALL);
    let before = layer.control_block(0).controller(0).map(|c| c.value());

    assert!(!layer.key_off());
    assert_eq!(layer.state(), LayerState::Releasing);
    assert_eq!(layer.control_block(0).controller(0).map(|c| c.value()), before);
}

fn modulated() -> Arc<LayerData> {
    Arc::new(
        LayerData::new("wobble")
            .with_control_block(
                ControlBlockData::new()
                    .with(0, ControllerData::envelope("ampenv", EnvelopeData::adsr(0.02, 0.1, 0.6, 0.2)))
                    .with(1, ControllerData::lfo("lfo", LfoData::default())),
            )
            .with_block(DspBlockData::Oscillator(OscillatorData::new(OscillatorWaveform::Saw)))
            .with_block(DspBlockData::Filter(FilterData {
                cutoff_mod: Some(ModRoute::named("lfo", 600.0)),
                ..FilterData::default()
            }))
            .with_block(DspBlockData::Amp(AmpData {
                source: Some(ModRoute::named("ampenv", 1.0)),
                ..AmpData::default()
            })),
    )
}

fn run(layer: &mut LayerInst, buffers: usize) -> Vec<f32> {
    let mut out = Vec::new();
    for _ in 0..buffers {
        layer.compute(FRAMES, BlockMask::ALL);
        out.extend_from_slice(layer.buffer().upper());
    }
    out
}

#[test]
fn retrigger_matches_a_fresh_layer() {
    let data = modulated();

    let mut fresh = LayerInst::new(0, FRAMES);
    fresh.key_on(data.clone(), &koi(57, 90));
    let expected = run(&mut fresh, 4);

    let mut reused = LayerInst::new(0, FRAMES);
    reused.key_on(data.clone(), &koi(57, 90));
    run(&mut reused, 7);
    reused.key_off();
    run(&mut reused, 2);

    reused.key_on(data, &koi(57, 90));
    assert_eq!(reused.maps().len(), 2);
    assert_eq!(run(&mut reused, 4), expected);
}
