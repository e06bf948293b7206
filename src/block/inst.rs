use std::f32::consts::FRAC_PI_4;

use crate::{
    block::{
        buffer::{Combine, DspBuffer},
        data::{DspBlockData, ModRoute, ModSource},
    },
    control::{ControlMaps, ControlView, ControllerKey, CtrlRef, KeyOnInfo},
    dsp::{
        amplify::{apply_gain, db_to_linear, multiply_accumulate, multiply_in_place, ramp_gain},
        distortion::shape_buffer,
        filter::SVFilter,
        oscillator::OscillatorBlock,
        RenderCtx,
    },
    MAX_CTRL_BLOCKS_PER_LAYER, MAX_CTRL_PER_BLOCK,
};

/// Everything a block may read while computing one buffer.
#[derive(Clone, Copy)]
pub struct BlockCtx<'a> {
    pub sample_rate: f32,
    /// Pitch of the note that owns the layer.
    pub frequency: f32,
    pub velocity: f32,
    pub controls: ControlView<'a>,
}

/// Mutable per-voice state, one variant per block kind.
#[derive(Debug, Clone)]
pub enum BlockState {
    None,
    Oscillator(OscillatorBlock),
    Filter { upper: SVFilter, lower: SVFilter },
    /// Key-on gain: patch gain × velocity response.
    Amp { gain: f32 },
    Shaper,
    Panner,
    RingMod,
    RingModSumA,
}

impl BlockState {
    fn name(&self) -> &'static str {
        match self {
            BlockState::None => "NONE",
            BlockState::Oscillator(_) => "OSC",
            BlockState::Filter { .. } => "FILTER",
            BlockState::Amp { .. } => "AMP",
            BlockState::Shaper => "SHAPER",
            BlockState::Panner => "PANNER",
            BlockState::RingMod => "RINGMOD",
            BlockState::RingModSumA => "RINGMOD SUMA",
        }
    }
}

/// One instantiated position of a layer's DSP chain.
///
/// Holds the index of its [`DspBlockData`] inside the layer rather than a
/// reference, so the layer can hand the matching template back in on every
/// call.
#[derive(Debug, Clone)]
pub struct DspBlock {
    data_index: usize,
    state: BlockState,
    route: Option<CtrlRef>,
}

fn resolve(route: &ModRoute, maps: &ControlMaps) -> Option<CtrlRef> {
    match &route.from {
        ModSource::Named(name) => maps.by_name(name),
        ModSource::Slot { block, slot } => {
            if *block < MAX_CTRL_BLOCKS_PER_LAYER && *slot < MAX_CTRL_PER_BLOCK {
                maps.by_data(ControllerKey::new(*block, *slot))
            } else {
                None
            }
        }
    }
}

impl DspBlock {
    pub fn new(data_index: usize, state: BlockState) -> Self {
        Self {
            data_index,
            state,
            route: None,
        }
    }

    pub fn data_index(&self) -> usize {
        self.data_index
    }

    pub fn kind_name(&self) -> &'static str {
        self.state.name()
    }

    /// The controller this block reads, resolved at key-on.
    pub fn route(&self) -> Option<CtrlRef> {
        self.route
    }

    /// Reset state and resolve the modulation route.
    ///
    /// The layer's control blocks must already be keyed on: routes are looked
    /// up in `maps`, which is filled by [`ControlBlockInst::key_on`].
    ///
    /// [`ControlBlockInst::key_on`]: crate::control::ControlBlockInst::key_on
    pub fn key_on(&mut self, data: &DspBlockData, koi: &KeyOnInfo, maps: &ControlMaps) {
        self.route = data.route().and_then(|route| resolve(route, maps));
        assert!(
            data.route().is_none() || self.route.is_some(),
            "{} block routes from an unregistered controller",
            data.name()
        );

        match (&mut self.state, data) {
            (BlockState::Oscillator(osc), DspBlockData::Oscillator(_)) => osc.reset(),
            (BlockState::Filter { upper, lower }, DspBlockData::Filter(_)) => {
                upper.reset();
                lower.reset();
            }
            (BlockState::Amp { gain }, DspBlockData::Amp(amp)) => {
                let vel = koi.velocity as f32 / 127.0;
                let vel_gain = 1.0 - amp.vel_track + amp.vel_track * vel;
                *gain = db_to_linear(amp.gain_db) * vel_gain;
            }
            _ => {}
        }
    }

    fn modulation(&self, data: &DspBlockData, ctx: &BlockCtx) -> f32 {
        match (self.route, data.route()) {
            (Some(at), Some(route)) => ctx.controls.value(at) * route.depth,
            _ => 0.0,
        }
    }

    /// Process one buffer in place.
    ///
    /// Panics if `data` is not the template this block was created from.
    pub fn compute(&mut self, data: &DspBlockData, buffer: &mut DspBuffer, ctx: &BlockCtx) {
        let modulation = self.modulation(data, ctx);

        match (&mut self.state, data) {
            (BlockState::None, DspBlockData::None) => {}

            (BlockState::Oscillator(osc), DspBlockData::Oscillator(d)) => {
                let base = d.fixed_hz.unwrap_or(ctx.frequency);
                let cents = d.coarse as f32 * 100.0 + d.fine_cents + modulation;
                let frequency = base * 2.0_f32.powf(cents / 1200.0);
                let rctx = RenderCtx::from_freq(ctx.sample_rate, frequency, ctx.velocity);

                let out = buffer.channel_mut(d.channel);
                match d.combine {
                    Combine::Overwrite => {
                        osc.render(out, &rctx);
                        if d.level != 1.0 {
                            apply_gain(out, d.level);
                        }
                    }
                    Combine::Add => osc.render_add(out, &rctx, d.level),
                }
            }

            (BlockState::Filter { upper, lower }, DspBlockData::Filter(d)) => {
                let cutoff = d.cutoff_hz + modulation;
                upper.render_at(buffer.upper_mut(), ctx.sample_rate, cutoff);
                if buffer.is_stereo() {
                    lower.render_at(buffer.lower_mut(), ctx.sample_rate, cutoff);
                }
            }

            (BlockState::Amp { gain }, DspBlockData::Amp(d)) => {
                let (from, to) = match (self.route, &d.source) {
                    (Some(at), Some(route)) => (
                        *gain * ctx.controls.prev_value(at) * route.depth,
                        *gain * ctx.controls.value(at) * route.depth,
                    ),
                    _ => (*gain, *gain),
                };
                let stereo = buffer.is_stereo();
                let (upper, lower) = buffer.planes_mut();
                ramp_gain(upper, from, to);
                if stereo {
                    ramp_gain(lower, from, to);
                }
            }

            (BlockState::Shaper, DspBlockData::Shaper(d)) => {
                let stereo = buffer.is_stereo();
                let (upper, lower) = buffer.planes_mut();
                shape_buffer(upper, d.kind, d.drive, d.threshold, d.output_gain);
                if stereo {
                    shape_buffer(lower, d.kind, d.drive, d.threshold, d.output_gain);
                }
            }

            (BlockState::Panner, DspBlockData::Panner(d)) => {
                let pan = (d.pan + modulation).clamp(-1.0, 1.0);
                let angle = (pan + 1.0) * FRAC_PI_4;
                let (left_gain, right_gain) = (angle.cos(), angle.sin());
                let was_stereo = buffer.is_stereo();

                let (upper, lower) = buffer.planes_mut();
                for (u, l) in upper.iter_mut().zip(lower.iter_mut()) {
                    let mono = if was_stereo { (*u + *l) * 0.5 } else { *u };
                    *u = mono * left_gain;
                    *l = mono * right_gain;
                }
                buffer.set_stereo(true);
            }

            (BlockState::RingMod, DspBlockData::RingMod) => {
                let (a, b) = buffer.planes_mut();
                multiply_in_place(a, b);
            }

            (BlockState::RingModSumA, DspBlockData::RingModSumA) => {
                let (a, b) = buffer.planes_mut();
                multiply_accumulate(a, b);
            }

            (state, data) => panic!(
                "DSP block state {} does not match data {}",
                state.name(),
                data.name()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{
        buffer::Channel,
        data::{AmpData, OscillatorData, PannerData},
    };
    use crate::control::{controller::ControllerData, ControlBlockData, ControlBlockInst};
    use crate::dsp::oscillator::OscillatorWaveform;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn ctx(controls: &[ControlBlockInst]) -> BlockCtx<'_> {
        BlockCtx {
            sample_rate: SAMPLE_RATE,
            frequency: 440.0,
            velocity: 100.0,
            controls: ControlView::new(controls),
        }
    }

    fn koi() -> KeyOnInfo {
        KeyOnInfo {
            note: 69,
            velocity: 127,
            layer: 0,
            sample_rate: SAMPLE_RATE,
            time: 0,
        }
    }

    fn ring_inputs() -> DspBuffer {
        let mut buffer = DspBuffer::new(64);
        buffer.prepare(64);
        buffer.upper_mut().fill(1.0);
        buffer.lower_mut().fill(0.5);
        buffer
    }

    fn run(data: &DspBlockData, buffer: &mut DspBuffer) {
        let mut block = data.create_instance(0);
        block.key_on(data, &koi(), &ControlMaps::new());
        block.compute(data, buffer, &ctx(&[]));
    }

    #[test]
    fn ring_mod_overwrites_with_product() {
        let mut buffer = ring_inputs();
        run(&DspBlockData::RingMod, &mut buffer);
        assert!(buffer.upper().iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn ring_mod_sum_accumulates_product() {
        let mut buffer = ring_inputs();
        run(&DspBlockData::RingModSumA, &mut buffer);
        assert!(buffer.upper().iter().all(|&s| (s - 1.5).abs() < 1e-6));
        assert!(buffer.lower().iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn oscillator_add_keeps_existing_signal() {
        let data = DspBlockData::Oscillator(OscillatorData {
            waveform: OscillatorWaveform::Square,
            channel: Channel::Lower,
            combine: Combine::Add,
            level: 0.25,
            ..OscillatorData::default()
        });
        let mut buffer = ring_inputs();
        run(&data, &mut buffer);
        // square starts high
        assert!((buffer.lower()[0] - 0.75).abs() < 1e-6);
        assert!(buffer.upper().iter().all(|&s| s == 1.0));
    }

    #[test]
    fn fixed_frequency_ignores_note() {
        let data = DspBlockData::Oscillator(OscillatorData {
            waveform: OscillatorWaveform::Saw,
            fixed_hz: Some(0.0),
            ..OscillatorData::default()
        });
        let mut buffer = ring_inputs();
        run(&data, &mut buffer);
        // zero Hz saw sits at the start of its ramp
        assert!(buffer.upper().iter().all(|&s| (s + 1.0).abs() < 1e-6));
    }

    #[test]
    fn centred_panner_is_constant_power() {
        let data = DspBlockData::Panner(PannerData::default());
        let mut buffer = ring_inputs();
        run(&data, &mut buffer);

        assert!(buffer.is_stereo());
        let (l, r) = (buffer.upper()[0], buffer.lower()[0]);
        assert!((l - r).abs() < 1e-6);
        assert!((l * l + r * r - 1.0).abs() < 1e-5);
    }

    #[test]
    fn amp_ramps_between_controller_values() {
        let cbd = ControlBlockData::new().with(0, ControllerData::constant("level", 0.5));
        let mut maps = ControlMaps::new();
        let mut controls = [ControlBlockInst::new()];
        controls[0].key_on(&koi(), &cbd, 0, &mut maps);

        let data = DspBlockData::Amp(AmpData {
            source: Some(ModRoute::named("level", 1.0)),
            ..AmpData::default()
        });
        let mut block = data.create_instance(0);
        block.key_on(&data, &koi(), &maps);
        assert_eq!(block.route(), Some(CtrlRef { block: 0, slot: 0 }));

        let mut buffer = ring_inputs();
        block.compute(&data, &mut buffer, &ctx(&controls));
        assert!(buffer.upper().iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn amp_velocity_tracking() {
        let data = DspBlockData::Amp(AmpData {
            vel_track: 1.0,
            ..AmpData::default()
        });
        let mut block = data.create_instance(0);
        block.key_on(
            &data,
            &KeyOnInfo {
                velocity: 0,
                ..koi()
            },
            &ControlMaps::new(),
        );
        let mut buffer = ring_inputs();
        block.compute(&data, &mut buffer, &ctx(&[]));
        assert!(buffer.upper().iter().all(|&s| s == 0.0));
    }

    #[test]
    #[should_panic(expected = "unregistered controller")]
    fn unresolved_route_panics() {
        let data = DspBlockData::Amp(AmpData {
            source: Some(ModRoute::named("missing", 1.0)),
            ..AmpData::default()
        });
        data.create_instance(0).key_on(&data, &koi(), &ControlMaps::new());
    }

    #[test]
    #[should_panic(expected = "does not match")]
    fn mismatched_data_panics() {
        let mut block = DspBlockData::RingMod.create_instance(0);
        let mut buffer = ring_inputs();
        block.compute(&DspBlockData::RingModSumA, &mut buffer, &ctx(&[]));
    }
}
