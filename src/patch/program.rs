use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    block::{DspBlockData, ModSource},
    control::{ControlBlockData, ControllerData, ControllerKey},
    error::PatchError,
    MAX_CTRL_BLOCKS_PER_LAYER, MAX_CTRL_PER_BLOCK, MAX_DSP_BLOCKS_PER_LAYER,
    MAX_LAYERS_PER_PROGRAM,
};

/// Inclusive MIDI range, used for both keys and velocities.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRange {
    pub lo: u8,
    pub hi: u8,
}

impl Default for KeyRange {
    fn default() -> Self {
        Self::FULL
    }
}

impl KeyRange {
    pub const FULL: KeyRange = KeyRange { lo: 0, hi: 127 };

    pub fn new(lo: u8, hi: u8) -> Self {
        Self { lo, hi }
    }

    pub fn contains(&self, value: u8) -> bool {
        (self.lo..=self.hi).contains(&value)
    }
}

/// One sub-chain of a program: its controllers and its DSP chain.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct LayerData {
    pub name: String,
    pub key_range: KeyRange,
    pub vel_range: KeyRange,
    pub gain_db: f32,
    pub control_blocks: Vec<ControlBlockData>,
    pub dsp_blocks: Vec<DspBlockData>,
}

impl Default for LayerData {
    fn default() -> Self {
        Self {
            name: String::from("layer"),
            key_range: KeyRange::FULL,
            vel_range: KeyRange::FULL,
            gain_db: 0.0,
            control_blocks: Vec::new(),
            dsp_blocks: Vec::new(),
        }
    }
}

impl LayerData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_control_block(mut self, block: ControlBlockData) -> Self {
        self.control_blocks.push(block);
        self
    }

    pub fn with_block(mut self, block: DspBlockData) -> Self {
        self.dsp_blocks.push(block);
        self
    }

    pub fn with_key_range(mut self, lo: u8, hi: u8) -> Self {
        self.key_range = KeyRange::new(lo, hi);
        self
    }

    pub fn with_vel_range(mut self, lo: u8, hi: u8) -> Self {
        self.vel_range = KeyRange::new(lo, hi);
        self
    }

    pub fn with_gain_db(mut self, gain_db: f32) -> Self {
        self.gain_db = gain_db;
        self
    }

    /// Whether a note should instantiate this layer.
    pub fn accepts(&self, note: u8, velocity: u8) -> bool {
        self.key_range.contains(note) && self.vel_range.contains(velocity)
    }

    /// The controller template registered under `key`.
    pub fn controller(&self, key: ControllerKey) -> Option<&ControllerData> {
        self.control_blocks
            .get(key.block())
            .and_then(|block| block.get(key.slot()))
    }

    fn has_named(&self, name: &str) -> bool {
        self.control_blocks
            .iter()
            .any(|block| block.find(name).is_some())
    }

    /// Structural and parameter checks. Everything the key-on path asserts is
    /// checked here first.
    pub fn validate(&self) -> Result<(), PatchError> {
        if self.control_blocks.len() > MAX_CTRL_BLOCKS_PER_LAYER {
            return Err(PatchError::TooManyControlBlocks {
                layer: self.name.clone(),
                count: self.control_blocks.len(),
                max: MAX_CTRL_BLOCKS_PER_LAYER,
            });
        }
        if self.dsp_blocks.len() > MAX_DSP_BLOCKS_PER_LAYER {
            return Err(PatchError::TooManyDspBlocks {
                layer: self.name.clone(),
                count: self.dsp_blocks.len(),
                max: MAX_DSP_BLOCKS_PER_LAYER,
            });
        }
        for (param, range) in [("key_range", self.key_range), ("vel_range", self.vel_range)] {
            if range.lo > range.hi || range.hi > 127 {
                return Err(PatchError::invalid(
                    format!("layer '{}'", self.name),
                    param,
                    format!("{}..={} is not a MIDI range", range.lo, range.hi),
                ));
            }
        }
        if !self.gain_db.is_finite() {
            return Err(PatchError::invalid(
                format!("layer '{}'", self.name),
                "gain_db",
                "not finite",
            ));
        }

        for block in &self.control_blocks {
            block.validate()?;
        }

        for block in &self.dsp_blocks {
            block.validate()?;

            let Some(route) = block.route() else {
                continue;
            };
            let found = match &route.from {
                ModSource::Named(name) => self.has_named(name),
                ModSource::Slot { block, slot } => {
                    *block < MAX_CTRL_BLOCKS_PER_LAYER
                        && *slot < MAX_CTRL_PER_BLOCK
                        && self.controller(ControllerKey::new(*block, *slot)).is_some()
                }
            };
            if !found {
                return Err(PatchError::UnknownController {
                    layer: self.name.clone(),
                    route: route.from.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// An immutable program: a named stack of layers.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramData {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub role: Option<String>,
    pub layers: Vec<Arc<LayerData>>,
}

impl ProgramData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: None,
            layers: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_layer(mut self, layer: LayerData) -> Self {
        self.layers.push(Arc::new(layer));
        self
    }

    pub fn validate(&self) -> Result<(), PatchError> {
        if self.layers.is_empty() {
            return Err(PatchError::invalid(
                format!("program '{}'", self.name),
                "layers",
                "a program needs at least one layer",
            ));
        }
        if self.layers.len() > MAX_LAYERS_PER_PROGRAM {
            return Err(PatchError::TooManyLayers {
                program: self.name.clone(),
                count: self.layers.len(),
                max: MAX_LAYERS_PER_PROGRAM,
            });
        }
        self.layers.iter().try_for_each(|layer| layer.validate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{AmpData, ModRoute};
    use crate::control::controller::EnvelopeData;

    fn amp_from(source: ModSource) -> DspBlockData {
        DspBlockData::Amp(AmpData {
            source: Some(ModRoute::new(source, 1.0)),
            ..AmpData::default()
        })
    }

    fn env_block() -> ControlBlockData {
        ControlBlockData::new().with(1, ControllerData::envelope("ampenv", EnvelopeData::default()))
    }

    #[test]
    fn routes_must_name_a_controller() {
        let layer = LayerData::new("main")
            .with_control_block(env_block())
            .with_block(amp_from(ModSource::named("filtenv")));

        assert!(matches!(
            layer.validate(),
            Err(PatchError::UnknownController { .. })
        ));
    }

    #[test]
    fn slot_routes_must_hit_a_populated_slot() {
        let ok = LayerData::new("main")
            .with_control_block(env_block())
            .with_block(amp_from(ModSource::Slot { block: 0, slot: 1 }));
        assert!(ok.validate().is_ok());

        let empty = LayerData::new("main")
            .with_control_block(env_block())
            .with_block(amp_from(ModSource::Slot { block: 0, slot: 0 }));
        assert!(empty.validate().is_err());

        let out_of_range = LayerData::new("main")
            .with_block(amp_from(ModSource::Slot { block: 9, slot: 0 }));
        assert!(out_of_range.validate().is_err());
    }

    #[test]
    fn too_many_blocks() {
        let mut layer = LayerData::new("long");
        layer.dsp_blocks = vec![DspBlockData::None; MAX_DSP_BLOCKS_PER_LAYER + 1];
        assert!(matches!(
            layer.validate(),
            Err(PatchError::TooManyDspBlocks { .. })
        ));
    }

    #[test]
    fn layer_ranges_filter_notes() {
        let layer = LayerData::new("soft").with_vel_range(0, 63).with_key_range(36, 72);
        assert!(layer.accepts(60, 40));
        assert!(!layer.accepts(60, 100));
        assert!(!layer.accepts(80, 40));
    }

    #[test]
    fn programs_need_layers() {
        assert!(ProgramData::new("empty").validate().is_err());

        let mut crowded = ProgramData::new("crowded");
        for _ in 0..=MAX_LAYERS_PER_PROGRAM {
            crowded = crowded.with_layer(LayerData::new("l"));
        }
        assert!(matches!(
            crowded.validate(),
            Err(PatchError::TooManyLayers { .. })
        ));
    }
}
