//! Low Frequency Oscillator (LFO) running at control rate.

/*
Low Frequency Oscillators
=========================

An LFO is an oscillator running at sub-audio frequencies (~0.01 Hz to
~20 Hz). The waveform math is the phase accumulator in `oscillator.rs`; what
differs is how the output is consumed.

  audio-rate      one output per sample, heard directly
  control-rate    one output per buffer, read by other blocks as a parameter

Controllers in a layer are computed once per buffer, so an LFO here reports
the waveform at the start of the buffer and then skips its phase ahead by the
buffer length:

    value  = waveform(phase)
    phase += frames * rate / sample_rate

At 5 Hz and 128-frame buffers at 48 kHz that is 75 updates per cycle, which
is plenty for vibrato, tremolo and filter sweeps. Blocks that multiply audio
by the value ramp between consecutive updates to hide the steps.


Sync and Phase
--------------

SYNCED:       note_on resets the phase, so every note gets the same shape.
FREE-RUNNING: the LFO behaves as if it had been running since the synth's
              first frame. note_on jumps to the phase that clock has reached:

    phase = fract(time * rate / sample_rate)

Each voice owns its own controller instances, so two free-running notes
started at different times start at different points of the cycle, and two
notes started on the same frame line up.


Bipolar to Unipolar Conversion
------------------------------

    unipolar = (bipolar + 1.0) * 0.5

    bipolar   unipolar
    -1.0      0.0
     0.0      0.5
    +1.0      1.0

Vibrato wants bipolar (sharp AND flat). Tremolo and filter opening usually
want unipolar (0 at rest).
*/

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::oscillator::{OscillatorBlock, OscillatorWaveform};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Polarity {
    #[default]
    Bipolar,
    Unipolar,
}

#[derive(Debug, Clone)]
pub struct Lfo {
    osc: OscillatorBlock,
    rate_hz: f32,
    polarity: Polarity,
    sync: bool,
}

impl Lfo {
    pub fn new(waveform: OscillatorWaveform, rate_hz: f32, polarity: Polarity, sync: bool) -> Self {
        Self {
            osc: OscillatorBlock::new(waveform),
            rate_hz: rate_hz.max(0.0),
            polarity,
            sync,
        }
    }

    /// `time` is the synth clock in frames at key-on.
    pub fn note_on(&mut self, time: u64, sample_rate: f32) {
        self.osc.reset();
        if !self.sync && sample_rate > 0.0 {
            let cycles = time as f64 * self.rate_hz as f64 / sample_rate as f64;
            self.osc.set_phase(cycles.fract() as f32);
        }
    }

    /// Value at the current phase, then skip `frames` samples ahead.
    pub fn advance(&mut self, frames: usize, sample_rate: f32) -> f32 {
        let value = self.value();
        self.osc.skip(frames, self.rate_hz, sample_rate);
        value
    }

    pub fn value(&self) -> f32 {
        let raw = self.osc.current();
        match self.polarity {
            Polarity::Bipolar => raw,
            Polarity::Unipolar => bipolar_to_unipolar(raw),
        }
    }
}

/// Convert bipolar signal (-1.0 to +1.0) to unipolar (0.0 to 1.0).
#[inline]
pub fn bipolar_to_unipolar(bipolar: f32) -> f32 {
    (bipolar + 1.0) * 0.5
}

/// Convert unipolar signal (0.0 to 1.0) to bipolar (-1.0 to +1.0).
#[inline]
pub fn unipolar_to_bipolar(unipolar: f32) -> f32 {
    (unipolar * 2.0) - 1.0
}

/// Calculate LFO period in seconds from frequency.
///
/// # Example
/// ```
/// use singularity::dsp::lfo::period_from_frequency;
/// let period = period_from_frequency(5.0);
/// assert!((period - 0.2).abs() < 1e-6); // 5 Hz = 200ms period
/// ```
#[inline]
pub fn period_from_frequency(frequency_hz: f32) -> f32 {
    1.0 / frequency_hz
}

/// Calculate samples per LFO period.
///
/// # Example
/// ```
/// use singularity::dsp::lfo::samples_per_period;
/// let samples = samples_per_period(5.0, 48000.0);
/// assert_eq!(samples, 9600.0); // 5 Hz at 48kHz = 9600 samples
/// ```
#[inline]
pub fn samples_per_period(frequency_hz: f32, sample_rate: f32) -> f32 {
    sample_rate / frequency_hz
}
