#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Layer Work Buffer
=================

Every layer owns one DspBuffer for its whole life. Blocks in the chain read
and write it in place; nothing is allocated once the voice pool exists.

    upper  ──┐   the main signal path ("A"). Oscillators write here by
             │   default, filters/amps/shapers process it.
    lower  ──┘   a side path ("B"). A second oscillator can write here to
                 feed RINGMOD, and PANNER uses it as the right channel.

    stereo = false   upper is the mono layer output
    stereo = true    upper = left, lower = right

`len` is the frame count of the current buffer and is always <= capacity.
*/

/// Which plane of the layer buffer a block writes to.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Channel {
    #[default]
    Upper,
    Lower,
}

/// How a generator combines with what is already in its target plane.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combine {
    #[default]
    Overwrite,
    Add,
}

#[derive(Debug, Clone)]
pub struct DspBuffer {
    upper: Box<[f32]>,
    lower: Box<[f32]>,
    len: usize,
    stereo: bool,
}

impl DspBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            upper: vec![0.0; capacity].into_boxed_slice(),
            lower: vec![0.0; capacity].into_boxed_slice(),
            len: 0,
            stereo: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.upper.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Start a new buffer of `frames`: both planes zeroed, mono.
    pub fn prepare(&mut self, frames: usize) {
        assert!(
            frames <= self.capacity(),
            "buffer of {frames} frames exceeds capacity {}",
            self.capacity()
        );
        self.len = frames;
        self.clear();
    }

    pub fn clear(&mut self) {
        self.upper[..self.len].fill(0.0);
        self.lower[..self.len].fill(0.0);
        self.stereo = false;
    }

    pub fn upper(&self) -> &[f32] {
        &self.upper[..self.len]
    }

    pub fn lower(&self) -> &[f32] {
        &self.lower[..self.len]
    }

    pub fn upper_mut(&mut self) -> &mut [f32] {
        &mut self.upper[..self.len]
    }

    pub fn lower_mut(&mut self) -> &mut [f32] {
        &mut self.lower[..self.len]
    }

    /// Both planes at once: `(upper, lower)`.
    pub fn planes_mut(&mut self) -> (&mut [f32], &mut [f32]) {
        (&mut self.upper[..self.len], &mut self.lower[..self.len])
    }

    pub fn channel_mut(&mut self, channel: Channel) -> &mut [f32] {
        match channel {
            Channel::Upper => self.upper_mut(),
            Channel::Lower => self.lower_mut(),
        }
    }

    pub fn is_stereo(&self) -> bool {
        self.stereo
    }

    pub fn set_stereo(&mut self, stereo: bool) {
        self.stereo = stereo;
    }
}
