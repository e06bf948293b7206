//! Control-rate modulation: controllers, fixed-size control blocks and the
//! per-layer lookup maps that DSP blocks resolve their modulation through.
//!
//! A layer keys on every control block before it builds its DSP chain. Each
//! controller registers itself twice while keying on: by the position of its
//! data inside the layer (`ControllerKey`) and by name. DSP blocks resolve
//! their routes through those maps once at key-on and then read values with a
//! plain index on every buffer.

pub mod block;
pub mod controller;
pub mod modifiers;

use std::collections::HashMap;
use std::sync::Arc;

pub use block::{ControlBlockData, ControlBlockInst};
pub use controller::{ControllerData, ControllerInst, ControllerKind};
pub use modifiers::{ControlSignal, KeyOnModifiers};

use crate::{MAX_CTRL_BLOCKS_PER_LAYER, MAX_CTRL_PER_BLOCK};

/// Note context handed to control blocks and DSP blocks at key-on.
///
/// Consumed during key-on and never stored.
#[derive(Debug, Clone, Copy)]
pub struct KeyOnInfo {
    pub note: u8,
    pub velocity: u8,
    /// Index of the owning layer inside its voice.
    pub layer: usize,
    pub sample_rate: f32,
    /// Synth clock in frames when the note started.
    pub time: u64,
}

/// Where a controller instance lives inside a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CtrlRef {
    pub block: usize,
    pub slot: usize,
}

/// Identity of a controller's data inside its layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControllerKey(u16);

impl ControllerKey {
    pub fn new(block: usize, slot: usize) -> Self {
        assert!(block < MAX_CTRL_BLOCKS_PER_LAYER, "control block {block} out of range");
        assert!(slot < MAX_CTRL_PER_BLOCK, "controller slot {slot} out of range");
        Self((block * MAX_CTRL_PER_BLOCK + slot) as u16)
    }

    pub fn block(self) -> usize {
        self.0 as usize / MAX_CTRL_PER_BLOCK
    }

    pub fn slot(self) -> usize {
        self.0 as usize % MAX_CTRL_PER_BLOCK
    }
}

const MAX_CTRL_PER_LAYER: usize = MAX_CTRL_BLOCKS_PER_LAYER * MAX_CTRL_PER_BLOCK;

/// The two layer-local registries filled while control blocks key on.
#[derive(Debug)]
pub struct ControlMaps {
    by_data: HashMap<ControllerKey, CtrlRef>,
    by_name: HashMap<Arc<str>, CtrlRef>,
}

impl Default for ControlMaps {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlMaps {
    /// Both maps are sized for a full layer so key-on never grows them.
    pub fn new() -> Self {
        Self {
            by_data: HashMap::with_capacity(MAX_CTRL_PER_LAYER),
            by_name: HashMap::with_capacity(MAX_CTRL_PER_LAYER),
        }
    }

    /// Name collisions are last-write-wins.
    pub fn register(&mut self, key: ControllerKey, name: &Arc<str>, at: CtrlRef) {
        self.by_data.insert(key, at);
        self.by_name.insert(Arc::clone(name), at);
    }

    pub fn by_data(&self, key: ControllerKey) -> Option<CtrlRef> {
        self.by_data.get(&key).copied()
    }

    pub fn by_name(&self, name: &str) -> Option<CtrlRef> {
        self.by_name.get(name).copied()
    }

    pub fn clear(&mut self) {
        self.by_data.clear();
        self.by_name.clear();
    }

    pub fn len(&self) -> usize {
        self.by_data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_data.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(|name| name.as_ref())
    }
}

/// Read-only view of a layer's control blocks handed to DSP blocks.
#[derive(Clone, Copy)]
pub struct ControlView<'a> {
    blocks: &'a [ControlBlockInst],
}

impl<'a> ControlView<'a> {
    pub fn new(blocks: &'a [ControlBlockInst]) -> Self {
        Self { blocks }
    }

    fn controller(&self, at: CtrlRef) -> Option<&'a ControllerInst> {
        self.blocks.get(at.block).and_then(|block| block.controller(at.slot))
    }

    /// Value produced by the controller during the current buffer.
    pub fn value(&self, at: CtrlRef) -> f32 {
        self.controller(at).map_or(0.0, ControllerInst::value)
    }

    /// Value the controller held at the end of the previous buffer.
    pub fn prev_value(&self, at: CtrlRef) -> f32 {
        self.controller(at).map_or(0.0, ControllerInst::prev_value)
    }
}
