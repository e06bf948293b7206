use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    block::{
        buffer::{Channel, Combine},
        inst::{BlockState, DspBlock},
    },
    dsp::{
        distortion::ShaperKind,
        filter::{FilterType, SVFilter},
        oscillator::{OscillatorBlock, OscillatorWaveform},
    },
    error::PatchError,
};

/// Where a modulated parameter reads its controller from.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
#[derive(Debug, Clone, PartialEq)]
pub enum ModSource {
    /// Controller name, looked up in the layer's name map.
    Named(Arc<str>),
    /// Controller data position: control block index and slot.
    Slot { block: usize, slot: usize },
}

impl ModSource {
    pub fn named(name: &str) -> Self {
        ModSource::Named(Arc::from(name))
    }
}

impl std::fmt::Display for ModSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModSource::Named(name) => write!(f, "'{name}'"),
            ModSource::Slot { block, slot } => write!(f, "block {block} slot {slot}"),
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ModRoute {
    pub from: ModSource,
    #[cfg_attr(feature = "serde", serde(default = "unit_depth"))]
    pub depth: f32,
}

#[cfg(feature = "serde")]
fn unit_depth() -> f32 {
    1.0
}

impl ModRoute {
    pub fn new(from: ModSource, depth: f32) -> Self {
        Self { from, depth }
    }

    pub fn named(name: &str, depth: f32) -> Self {
        Self::new(ModSource::named(name), depth)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct OscillatorData {
    pub waveform: OscillatorWaveform,
    pub channel: Channel,
    pub combine: Combine,
    /// Semitones.
    pub coarse: i32,
    pub fine_cents: f32,
    /// Ignore the note and play this frequency.
    pub fixed_hz: Option<f32>,
    pub level: f32,
    /// Pitch offset in cents: controller value × depth.
    pub pitch_mod: Option<ModRoute>,
}

impl Default for OscillatorData {
    fn default() -> Self {
        Self {
            waveform: OscillatorWaveform::Sine,
            channel: Channel::Upper,
            combine: Combine::Overwrite,
            coarse: 0,
            fine_cents: 0.0,
            fixed_hz: None,
            level: 1.0,
            pitch_mod: None,
        }
    }
}

impl OscillatorData {
    pub fn new(waveform: OscillatorWaveform) -> Self {
        Self {
            waveform,
            ..Self::default()
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct FilterData {
    pub filter_type: FilterType,
    pub cutoff_hz: f32,
    pub resonance: f32,
    /// Cutoff offset in Hz: controller value × depth.
    pub cutoff_mod: Option<ModRoute>,
}

impl Default for FilterData {
    fn default() -> Self {
        Self {
            filter_type: FilterType::LowPass,
            cutoff_hz: 2_000.0,
            resonance: 0.2,
            cutoff_mod: None,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct AmpData {
    pub gain_db: f32,
    /// 0 ignores velocity, 1 scales linearly with it.
    pub vel_track: f32,
    /// Usually the layer's amplitude envelope.
    pub source: Option<ModRoute>,
}

impl Default for AmpData {
    fn default() -> Self {
        Self {
            gain_db: 0.0,
            vel_track: 0.0,
            source: None,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct ShaperData {
    pub kind: ShaperKind,
    pub drive: f32,
    pub threshold: f32,
    pub output_gain: f32,
}

impl Default for ShaperData {
    fn default() -> Self {
        Self {
            kind: ShaperKind::Soft,
            drive: 2.0,
            threshold: 1.0,
            output_gain: 1.0,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PannerData {
    /// -1 hard left, +1 hard right.
    pub pan: f32,
    pub pan_mod: Option<ModRoute>,
}

/// Immutable template for one position in a layer's DSP chain.
///
/// The serde tag names follow the upper-case block names used in patch files.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "block"))]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DspBlockData {
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "NONE"))]
    None,
    #[cfg_attr(feature = "serde", serde(rename = "OSC"))]
    Oscillator(OscillatorData),
    #[cfg_attr(feature = "serde", serde(rename = "FILTER"))]
    Filter(FilterData),
    #[cfg_attr(feature = "serde", serde(rename = "AMP"))]
    Amp(AmpData),
    #[cfg_attr(feature = "serde", serde(rename = "SHAPER"))]
    Shaper(ShaperData),
    #[cfg_attr(feature = "serde", serde(rename = "PANNER"))]
    Panner(PannerData),
    /// upper ← upper × lower
    #[cfg_attr(feature = "serde", serde(rename = "RINGMOD"))]
    RingMod,
    /// upper ← upper + upper × lower
    #[cfg_attr(feature = "serde", serde(rename = "RINGMOD SUMA"))]
    RingModSumA,
}

impl DspBlockData {
    pub fn name(&self) -> &'static str {
        match self {
            DspBlockData::None => "NONE",
            DspBlockData::Oscillator(_) => "OSC",
            DspBlockData::Filter(_) => "FILTER",
            DspBlockData::Amp(_) => "AMP",
            DspBlockData::Shaper(_) => "SHAPER",
            DspBlockData::Panner(_) => "PANNER",
            DspBlockData::RingMod => "RINGMOD",
            DspBlockData::RingModSumA => "RINGMOD SUMA",
        }
    }

    /// Build a fresh instance for chain position `data_index`.
    pub fn create_instance(&self, data_index: usize) -> DspBlock {
        let state = match self {
            DspBlockData::None => BlockState::None,
            DspBlockData::Oscillator(osc) => BlockState::Oscillator(OscillatorBlock::new(osc.waveform)),
            DspBlockData::Filter(f) => {
                let filter = SVFilter::new(f.filter_type)
                    .with_cutoff(f.cutoff_hz)
                    .with_resonance(f.resonance);
                BlockState::Filter {
                    lower: filter.clone(),
                    upper: filter,
                }
            }
            DspBlockData::Amp(_) => BlockState::Amp { gain: 1.0 },
            DspBlockData::Shaper(_) => BlockState::Shaper,
            DspBlockData::Panner(_) => BlockState::Panner,
            DspBlockData::RingMod => BlockState::RingMod,
            DspBlockData::RingModSumA => BlockState::RingModSumA,
        };
        DspBlock::new(data_index, state)
    }

    /// The block's modulation input, if it has one.
    pub fn route(&self) -> Option<&ModRoute> {
        match self {
            DspBlockData::Oscillator(osc) => osc.pitch_mod.as_ref(),
            DspBlockData::Filter(f) => f.cutoff_mod.as_ref(),
            DspBlockData::Amp(amp) => amp.source.as_ref(),
            DspBlockData::Panner(pan) => pan.pan_mod.as_ref(),
            _ => None,
        }
    }

    /// Whether the block leaves a stereo pair in upper/lower.
    pub fn is_stereo(&self) -> bool {
        matches!(self, DspBlockData::Panner(_))
    }

    /// Parameter range checks. Route targets are checked by the owning layer.
    pub fn validate(&self) -> Result<(), PatchError> {
        let owner = self.name();
        let finite = |param: &'static str, v: f32| {
            if v.is_finite() {
                Ok(())
            } else {
                Err(PatchError::invalid(owner, param, "not finite"))
            }
        };
        if let Some(route) = self.route() {
            finite("depth", route.depth)?;
        }

        match self {
            DspBlockData::Oscillator(osc) => {
                finite("level", osc.level)?;
                finite("fine_cents", osc.fine_cents)?;
                if let Some(hz) = osc.fixed_hz {
                    if !(hz.is_finite() && hz >= 0.0) {
                        return Err(PatchError::invalid(owner, "fixed_hz", "must be >= 0"));
                    }
                }
                if osc.coarse.abs() > 48 {
                    return Err(PatchError::invalid(owner, "coarse", "must be within ±48 semitones"));
                }
            }
            DspBlockData::Filter(f) => {
                if !(f.cutoff_hz.is_finite() && f.cutoff_hz > 0.0) {
                    return Err(PatchError::invalid(owner, "cutoff_hz", "must be > 0"));
                }
                if !(0.0..1.0).contains(&f.resonance) {
                    return Err(PatchError::invalid(owner, "resonance", "must be in [0, 1)"));
                }
            }
            DspBlockData::Amp(amp) => {
                finite("gain_db", amp.gain_db)?;
                if !(0.0..=1.0).contains(&amp.vel_track) {
                    return Err(PatchError::invalid(owner, "vel_track", "must be in [0, 1]"));
                }
            }
            DspBlockData::Shaper(s) => {
                if !(s.drive.is_finite() && s.drive > 0.0) {
                    return Err(PatchError::invalid(owner, "drive", "must be > 0"));
                }
                if !(s.threshold.is_finite() && s.threshold > 0.0) {
                    return Err(PatchError::invalid(owner, "threshold", "must be > 0"));
                }
                finite("output_gain", s.output_gain)?;
            }
            DspBlockData::Panner(p) => {
                if !(-1.0..=1.0).contains(&p.pan) {
                    return Err(PatchError::invalid(owner, "pan", "must be in [-1, 1]"));
                }
            }
            DspBlockData::None | DspBlockData::RingMod | DspBlockData::RingModSumA => {}
        }
        Ok(())
    }
}
