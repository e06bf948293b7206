use std::array;
use std::sync::Arc;

use crate::{
    control::{KeyOnInfo, KeyOnModifiers},
    patch::ProgramData,
    synth::layer::{BlockMask, LayerInst, LayerState},
    MAX_LAYERS_PER_PROGRAM,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Available for allocation
    Active,    // At least one layer keyed on and not yet released
    Releasing, // Key released, layers running their release tails
    Finished,  // Every layer finished, waiting to be reclaimed
}

/// One playing note of a program: a fixed set of layer slots.
pub struct Voice {
    layers: [LayerInst; MAX_LAYERS_PER_PROGRAM],
    program: Option<Arc<ProgramData>>,
    note: u8,
    velocity: u8,
    age: u64,
    generation: u32,
    held: bool,
}

impl Voice {
    pub fn new(max_block_size: usize) -> Self {
        Self {
            layers: array::from_fn(|index| LayerInst::new(index, max_block_size)),
            program: None,
            note: 0,
            velocity: 0,
            age: 0,
            generation: 0,
            held: false,
        }
    }

    /// Start every layer of `program` whose key and velocity ranges accept
    /// the note. Whatever the voice was playing before is dropped.
    ///
    /// `koi` carries the note; its `layer` field is filled in per layer.
    /// Returns false, leaving the voice free, when no layer accepts the note.
    pub fn key_on(
        &mut self,
        program: &Arc<ProgramData>,
        koi: KeyOnInfo,
        age: u64,
        mods: Option<&KeyOnModifiers>,
    ) -> bool {
        self.reclaim();
        self.generation = self.generation.wrapping_add(1);

        let mut started = false;
        for (index, data) in program.layers.iter().take(MAX_LAYERS_PER_PROGRAM).enumerate() {
            if !data.accepts(koi.note, koi.velocity) {
                continue;
            }
            let koi = KeyOnInfo { layer: index, ..koi };
            self.layers[index].key_on_with(Arc::clone(data), &koi, mods);
            started = true;
        }

        if started {
            self.program = Some(Arc::clone(program));
            self.note = koi.note;
            self.velocity = koi.velocity;
            self.age = age;
            self.held = true;
        }
        started
    }

    pub fn key_off(&mut self) -> bool {
        self.held = false;
        let mut released = false;
        for layer in self.layers.iter_mut() {
            released |= layer.key_off();
        }
        released
    }

    /// Compute every live layer and add it into the bus.
    pub fn compute(&mut self, num_frames: usize, mask: BlockMask, left: &mut [f32], right: &mut [f32]) {
        for layer in self.layers.iter_mut() {
            if layer.compute(num_frames, mask) {
                layer.mix_into(left, right);
            }
        }
    }

    pub fn state(&self) -> VoiceState {
        let mut finished = false;
        let mut releasing = false;
        for layer in &self.layers {
            match layer.state() {
                LayerState::KeyOn | LayerState::Sustain => return VoiceState::Active,
                LayerState::Releasing => releasing = true,
                LayerState::Finished => finished = true,
                LayerState::Idle => {}
            }
        }
        if releasing {
            VoiceState::Releasing
        } else if finished {
            VoiceState::Finished
        } else {
            VoiceState::Free
        }
    }

    pub fn reclaim(&mut self) {
        for layer in self.layers.iter_mut() {
            layer.reclaim();
        }
        self.program = None;
        self.held = false;
    }

    pub fn is_free(&self) -> bool {
        self.state() == VoiceState::Free
    }

    /// Held down: keyed on and not yet keyed off.
    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn program(&self) -> Option<&Arc<ProgramData>> {
        self.program.as_ref()
    }

    pub fn layer(&self, index: usize) -> &LayerInst {
        &self.layers[index]
    }

    /// A layer was keyed on and has not produced a buffer yet.
    pub fn is_starting(&self) -> bool {
        self.layers.iter().any(|layer| layer.state() == LayerState::KeyOn)
    }

    /// Value of the controller called `name` in the first live layer that
    /// registers it.
    pub fn control_value(&self, name: &str) -> Option<f32> {
        self.layers.iter().find_map(|layer| layer.control_value(name))
    }

    pub fn peak(&self) -> f32 {
        self.layers.iter().map(LayerInst::peak).fold(0.0, f32::max)
    }
}
