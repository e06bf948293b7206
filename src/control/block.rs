use std::array;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    control::{
        controller::{ControllerData, ControllerInst},
        ControlMaps, ControllerKey, CtrlRef, KeyOnInfo,
    },
    error::PatchError,
    MAX_CTRL_PER_BLOCK,
};

/*
Control Blocks
==============

A control block is a fixed row of MAX_CTRL_PER_BLOCK controller slots. Slots
are positional: a patch may fill slot 0 and slot 2 and leave slot 1 empty,
and modulation routes may refer to a controller by that position.

    ControlBlockData   [ env ][  -  ][ lfo ][  -  ]     immutable, shared
                          │            │
                     key_on│      key_on│
                          ▼            ▼
    ControlBlockInst   [ env ][  -  ][ lfo ][  -  ]     per voice-layer

After key_on an instance slot is filled exactly when its data slot is.

Slot order is evaluation order. `compute` walks slots 0..N every buffer, so a
controller that reads another may only read a lower slot.
*/

/// Immutable row of controller templates.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "ControlBlockRepr", into = "ControlBlockRepr")
)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlBlockData {
    cdata: [Option<ControllerData>; MAX_CTRL_PER_BLOCK],
}

impl ControlBlockData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, slot: usize, data: ControllerData) -> Self {
        self.set(slot, data);
        self
    }

    /// Panics if `slot >= MAX_CTRL_PER_BLOCK`.
    pub fn set(&mut self, slot: usize, data: ControllerData) {
        assert!(
            slot < MAX_CTRL_PER_BLOCK,
            "controller slot {slot} out of range (max {MAX_CTRL_PER_BLOCK})"
        );
        self.cdata[slot] = Some(data);
    }

    pub fn get(&self, slot: usize) -> Option<&ControllerData> {
        self.cdata.get(slot).and_then(Option::as_ref)
    }

    /// Populated slots in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ControllerData)> {
        self.cdata
            .iter()
            .enumerate()
            .filter_map(|(slot, data)| data.as_ref().map(|data| (slot, data)))
    }

    pub fn populated(&self) -> usize {
        self.cdata.iter().flatten().count()
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.iter()
            .filter(|(_, data)| data.name.as_ref() == name)
            .map(|(slot, _)| slot)
            .last()
    }

    pub fn validate(&self) -> Result<(), PatchError> {
        self.iter().try_for_each(|(_, data)| data.validate())
    }
}

/// Patch-file form: a list of populated slots.
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct ControlBlockRepr {
    #[serde(default)]
    controllers: Vec<SlotEntry>,
}

#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct SlotEntry {
    slot: usize,
    name: std::sync::Arc<str>,
    #[serde(flatten)]
    kind: crate::control::ControllerKind,
}

#[cfg(feature = "serde")]
impl TryFrom<ControlBlockRepr> for ControlBlockData {
    type Error = PatchError;

    fn try_from(repr: ControlBlockRepr) -> Result<Self, Self::Error> {
        let mut block = ControlBlockData::default();
        for entry in repr.controllers {
            if entry.slot >= MAX_CTRL_PER_BLOCK {
                return Err(PatchError::SlotOutOfRange {
                    slot: entry.slot,
                    max: MAX_CTRL_PER_BLOCK,
                });
            }
            if block.cdata[entry.slot].is_some() {
                return Err(PatchError::DuplicateSlot { slot: entry.slot });
            }
            block.cdata[entry.slot] = Some(ControllerData {
                name: entry.name,
                kind: entry.kind,
            });
        }
        Ok(block)
    }
}

#[cfg(feature = "serde")]
impl From<ControlBlockData> for ControlBlockRepr {
    fn from(block: ControlBlockData) -> Self {
        let controllers = block
            .cdata
            .into_iter()
            .enumerate()
            .filter_map(|(slot, data)| {
                data.map(|data| SlotEntry {
                    slot,
                    name: data.name,
                    kind: data.kind,
                })
            })
            .collect();
        Self { controllers }
    }
}

/// Per-layer row of live controllers, parallel to a [`ControlBlockData`].
#[derive(Debug, Clone)]
pub struct ControlBlockInst {
    cinst: [Option<ControllerInst>; MAX_CTRL_PER_BLOCK],
    keyed: bool,
    released: bool,
}

impl Default for ControlBlockInst {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlBlockInst {
    pub fn new() -> Self {
        Self {
            cinst: array::from_fn(|_| None),
            keyed: false,
            released: false,
        }
    }

    /// Instantiate, register and key on every populated slot of `cbd`.
    ///
    /// `block` is this control block's index in the layer and becomes part of
    /// each controller's registered identity. Keying on an already keyed block
    /// drops the previous instances first, so a re-trigger always starts from
    /// the same state.
    pub fn key_on(
        &mut self,
        koi: &KeyOnInfo,
        cbd: &ControlBlockData,
        block: usize,
        maps: &mut ControlMaps,
    ) {
        self.clear();

        for (slot, data) in cbd.iter() {
            let inst = self.cinst[slot].insert(data.instantiate(koi.layer));
            maps.register(ControllerKey::new(block, slot), &data.name, CtrlRef { block, slot });
            inst.key_on(koi);
        }
        self.keyed = true;
    }

    /// Forward key-off to every controller. Only the first call after a
    /// key-on has any effect; returns whether this call did anything.
    pub fn key_off(&mut self) -> bool {
        if !self.keyed || self.released {
            return false;
        }
        self.released = true;
        for inst in self.cinst.iter_mut().flatten() {
            inst.key_off();
        }
        true
    }

    /// Advance every controller by `num_frames`, in slot order.
    pub fn compute(&mut self, num_frames: usize) {
        for inst in self.cinst.iter_mut().flatten() {
            inst.compute(num_frames);
        }
    }

    pub fn is_done(&self) -> bool {
        self.cinst.iter().flatten().all(ControllerInst::is_done)
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Panics if `slot >= MAX_CTRL_PER_BLOCK`.
    pub fn controller(&self, slot: usize) -> Option<&ControllerInst> {
        assert!(slot < MAX_CTRL_PER_BLOCK, "controller slot {slot} out of range");
        self.cinst[slot].as_ref()
    }

    /// Panics if `slot >= MAX_CTRL_PER_BLOCK`.
    pub fn controller_mut(&mut self, slot: usize) -> Option<&mut ControllerInst> {
        assert!(slot < MAX_CTRL_PER_BLOCK, "controller slot {slot} out of range");
        self.cinst[slot].as_mut()
    }

    pub fn populated(&self) -> usize {
        self.cinst.iter().flatten().count()
    }

    pub fn clear(&mut self) {
        self.cinst.iter_mut().for_each(|slot| *slot = None);
        self.keyed = false;
        self.released = false;
    }
}
