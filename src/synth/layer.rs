use std::array;
use std::sync::Arc;

use crate::{
    block::{BlockCtx, DspBlock, DspBuffer},
    control::{
        ControlBlockInst, ControlMaps, ControlView, ControllerInst, KeyOnInfo, KeyOnModifiers,
    },
    dsp::{
        amplify::{db_to_linear, mix_into},
        midi_note_to_freq,
    },
    patch::LayerData,
    MAX_CTRL_BLOCKS_PER_LAYER, MAX_DSP_BLOCKS_PER_LAYER,
};

/*
Layer Lifecycle
===============

    Idle ──key_on──→ KeyOn ──first compute──→ Sustain
                       │                         │
                       └──────── key_off ────────┤
                                                 ▼
    Idle ←──reclaim── Finished ←──all done── Releasing

KeyOn only lasts until the first buffer: `compute` promotes it to Sustain
before running anything, so a note triggered and computed in the same buffer
is already sustaining when its audio is produced.

Releasing keeps computing. Controllers run their release tails and the layer
becomes Finished on the buffer where the last controller reports done. That
buffer's audio is still mixed; the voice pool reclaims the layer at the next
buffer boundary.

Per buffer:

    control block 0 ─→ control block 1 ─→ ...      values for this buffer
            │
            ▼
    dsp block 0 ─→ dsp block 1 ─→ ...              audio, reading those values
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerState {
    Idle,
    KeyOn,
    Sustain,
    Releasing,
    Finished,
}

/// Which DSP chain positions run. Bit `i` enables position `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockMask(u32);

impl Default for BlockMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl BlockMask {
    pub const ALL: BlockMask = BlockMask(u32::MAX);

    pub fn is_enabled(self, index: usize) -> bool {
        index < 32 && self.0 & (1 << index) != 0
    }

    pub fn set(&mut self, index: usize, enabled: bool) {
        if index >= 32 {
            return;
        }
        if enabled {
            self.0 |= 1 << index;
        } else {
            self.0 &= !(1 << index);
        }
    }
}

/// One sounding layer of a voice. Storage is allocated once, at pool
/// construction; key-on only fills slots.
pub struct LayerInst {
    index: usize,
    state: LayerState,
    data: Option<Arc<LayerData>>,
    control_blocks: [ControlBlockInst; MAX_CTRL_BLOCKS_PER_LAYER],
    dsp_blocks: [Option<DspBlock>; MAX_DSP_BLOCKS_PER_LAYER],
    maps: ControlMaps,
    buffer: DspBuffer,
    sample_rate: f32,
    frequency: f32,
    velocity: u8,
    gain: f32,
    peak: f32,
}

impl LayerInst {
    pub fn new(index: usize, max_block_size: usize) -> Self {
        Self {
            index,
            state: LayerState::Idle,
            data: None,
            control_blocks: array::from_fn(|_| ControlBlockInst::new()),
            dsp_blocks: array::from_fn(|_| None),
            maps: ControlMaps::new(),
            buffer: DspBuffer::new(max_block_size),
            sample_rate: 0.0,
            frequency: 0.0,
            velocity: 0,
            gain: 1.0,
            peak: 0.0,
        }
    }

    /// Control blocks key on first so the DSP chain can resolve its routes
    /// through the freshly filled maps.
    pub fn key_on(&mut self, data: Arc<LayerData>, koi: &KeyOnInfo) {
        self.key_on_with(data, koi, None);
    }

    /// [`key_on`](Self::key_on), then attach `mods` to the named controllers
    /// before the DSP chain is built.
    pub fn key_on_with(
        &mut self,
        data: Arc<LayerData>,
        koi: &KeyOnInfo,
        mods: Option<&KeyOnModifiers>,
    ) {
        assert_eq!(koi.layer, self.index, "key-on routed to the wrong layer");
        assert!(
            data.control_blocks.len() <= MAX_CTRL_BLOCKS_PER_LAYER,
            "layer '{}' has too many control blocks",
            data.name
        );
        assert!(
            data.dsp_blocks.len() <= MAX_DSP_BLOCKS_PER_LAYER,
            "layer '{}' has too many DSP blocks",
            data.name
        );

        self.reclaim();

        for (index, cbd) in data.control_blocks.iter().enumerate() {
            self.control_blocks[index].key_on(koi, cbd, index, &mut self.maps);
        }
        if let Some(mods) = mods {
            self.attach(mods);
        }

        for (index, bd) in data.dsp_blocks.iter().enumerate() {
            let block = self.dsp_blocks[index].insert(bd.create_instance(index));
            block.key_on(bd, koi, &self.maps);
        }

        self.sample_rate = koi.sample_rate;
        self.frequency = midi_note_to_freq(koi.note as f32);
        self.velocity = koi.velocity;
        self.gain = db_to_linear(data.gain_db);
        self.data = Some(data);
        self.state = LayerState::KeyOn;
    }

    fn attach(&mut self, mods: &KeyOnModifiers) {
        for (name, signal) in mods.generators() {
            if let Some(controller) = self.controller_mut(name) {
                controller.drive_from(signal);
            }
        }
        for (name, signal) in mods.subscribers() {
            if let Some(controller) = self.controller_mut(name) {
                controller.publish_to(signal);
            }
        }
    }

    fn controller_mut(&mut self, name: &str) -> Option<&mut ControllerInst> {
        let at = self.maps.by_name(name)?;
        self.control_blocks[at.block].controller_mut(at.slot)
    }

    /// Current value of the controller registered as `name`.
    pub fn control_value(&self, name: &str) -> Option<f32> {
        let at = self.maps.by_name(name)?;
        self.control_blocks[at.block]
            .controller(at.slot)
            .map(ControllerInst::value)
    }

    /// Start the release. Returns false when there was nothing to release.
    pub fn key_off(&mut self) -> bool {
        if !matches!(self.state, LayerState::KeyOn | LayerState::Sustain) {
            return false;
        }
        for block in self.control_blocks.iter_mut() {
            block.key_off();
        }
        self.state = LayerState::Releasing;
        true
    }

    /// Run controls then the enabled DSP chain for `num_frames`.
    ///
    /// Returns true when the buffer holds audio to mix.
    pub fn compute(&mut self, num_frames: usize, mask: BlockMask) -> bool {
        match self.state {
            LayerState::Idle | LayerState::Finished => return false,
            LayerState::KeyOn => self.state = LayerState::Sustain,
            LayerState::Sustain | LayerState::Releasing => {}
        }
        let Some(data) = self.data.as_deref() else {
            return false;
        };

        for block in self.control_blocks.iter_mut() {
            block.compute(num_frames);
        }

        self.buffer.prepare(num_frames);
        let ctx = BlockCtx {
            sample_rate: self.sample_rate,
            frequency: self.frequency,
            velocity: self.velocity as f32,
            controls: ControlView::new(&self.control_blocks),
        };
        for (index, slot) in self.dsp_blocks.iter_mut().enumerate() {
            if let Some(block) = slot {
                if mask.is_enabled(index) {
                    block.compute(&data.dsp_blocks[block.data_index()], &mut self.buffer, &ctx);
                }
            }
        }

        let peak = self
            .buffer
            .upper()
            .iter()
            .chain(self.buffer.lower())
            .fold(0.0f32, |acc, &s| acc.max(s.abs()));
        self.peak = peak * self.gain;

        if self.state == LayerState::Releasing
            && self.control_blocks.iter().all(ControlBlockInst::is_done)
        {
            self.state = LayerState::Finished;
        }
        true
    }

    /// Add the last computed buffer into a stereo bus.
    pub fn mix_into(&self, left: &mut [f32], right: &mut [f32]) {
        if self.buffer.is_stereo() {
            mix_into(left, self.buffer.upper(), self.gain);
            mix_into(right, self.buffer.lower(), self.gain);
        } else {
            mix_into(left, self.buffer.upper(), self.gain);
            mix_into(right, self.buffer.upper(), self.gain);
        }
    }

    /// Drop every instance and return to Idle.
    pub fn reclaim(&mut self) {
        for block in self.control_blocks.iter_mut() {
            block.clear();
        }
        for slot in self.dsp_blocks.iter_mut() {
            *slot = None;
        }
        self.maps.clear();
        self.data = None;
        self.state = LayerState::Idle;
        self.peak = 0.0;
    }

    pub fn state(&self) -> LayerState {
        self.state
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn data(&self) -> Option<&Arc<LayerData>> {
        self.data.as_ref()
    }

    pub fn control_block(&self, index: usize) -> &ControlBlockInst {
        &self.control_blocks[index]
    }

    pub fn dsp_block(&self, index: usize) -> Option<&DspBlock> {
        self.dsp_blocks.get(index).and_then(Option::as_ref)
    }

    pub fn maps(&self) -> &ControlMaps {
        &self.maps
    }

    pub fn buffer(&self) -> &DspBuffer {
        &self.buffer
    }

    /// Peak absolute level of the last computed buffer, after layer gain.
    pub fn peak(&self) -> f32 {
        self.peak
    }
}
