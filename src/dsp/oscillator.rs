#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use std::f32::consts::TAU;

use crate::dsp::RenderCtx;

/*
Phase-Accumulator Oscillator
============================

Every periodic waveform here is a function of a single number: the phase,
a position inside one cycle normalised to [0.0, 1.0).

    phase_increment = frequency / sample_rate

Each sample we read the waveform at the current phase, then advance:

    phase += phase_increment
    if phase >= 1.0 { phase -= 1.0 }

At 440 Hz and 48 kHz the increment is 0.00917, so one cycle takes ~109
samples. Keeping phase normalised (instead of accumulating radians) keeps
float precision constant no matter how long a voice has been sounding.


Waveform Lookup
---------------

  Sine      sin(TAU * phase)
  Saw       2 * phase - 1                       rising ramp, -1 → +1
  Square    +1 for phase < 0.5, -1 otherwise
  Triangle  1 - 4 * |phase - 0.5|               -1 at 0, +1 at 0.5
  Noise     xorshift32 scaled to [-1, 1]        ignores phase

These are the naive (non band-limited) shapes. Saw and square alias at high
pitches; the filters downstream are expected to tame the top end.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OscillatorWaveform {
    #[default]
    Sine,
    Saw,
    Square,
    Triangle,
    Noise,
}

#[derive(Debug, Clone)]
pub struct OscillatorBlock {
    waveform: OscillatorWaveform,
    phase: f32,
    noise_state: u32,
}

const NOISE_SEED: u32 = 0x9E37_79B9;

impl OscillatorBlock {
    pub fn new(waveform: OscillatorWaveform) -> Self {
        Self {
            waveform,
            phase: 0.0,
            noise_state: NOISE_SEED,
        }
    }

    pub fn sine() -> Self {
        Self::new(OscillatorWaveform::Sine)
    }

    pub fn sawtooth() -> Self {
        Self::new(OscillatorWaveform::Saw)
    }

    pub fn square() -> Self {
        Self::new(OscillatorWaveform::Square)
    }

    pub fn triangle() -> Self {
        Self::new(OscillatorWaveform::Triangle)
    }

    pub fn noise() -> Self {
        Self::new(OscillatorWaveform::Noise)
    }

    pub fn waveform(&self) -> OscillatorWaveform {
        self.waveform
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Restart the cycle. Noise is reseeded so retriggers are repeatable.
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.noise_state = NOISE_SEED;
    }

    /// Jump to a phase in [0, 1).
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = phase.rem_euclid(1.0);
    }

    /// Read the waveform at the current phase without advancing.
    #[inline]
    pub fn current(&self) -> f32 {
        match self.waveform {
            OscillatorWaveform::Sine => (TAU * self.phase).sin(),
            OscillatorWaveform::Saw => 2.0 * self.phase - 1.0,
            OscillatorWaveform::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            OscillatorWaveform::Triangle => 1.0 - 4.0 * (self.phase - 0.5).abs(),
            OscillatorWaveform::Noise => {
                self.noise_state as f32 / u32::MAX as f32 * 2.0 - 1.0
            }
        }
    }

    /// Produce one sample at `frequency` and advance the phase.
    #[inline]
    pub fn next_sample(&mut self, frequency: f32, sample_rate: f32) -> f32 {
        if self.waveform == OscillatorWaveform::Noise {
            self.step_noise();
        }
        let sample = self.current();

        self.phase += frequency / sample_rate;
        if self.phase >= 1.0 || self.phase < 0.0 {
            self.phase = self.phase.rem_euclid(1.0);
        }

        sample
    }

    /// Advance the phase by `frames` samples without producing output.
    pub fn skip(&mut self, frames: usize, frequency: f32, sample_rate: f32) {
        self.phase = (self.phase + frames as f32 * frequency / sample_rate).rem_euclid(1.0);
        if self.waveform == OscillatorWaveform::Noise {
            for _ in 0..frames {
                self.step_noise();
            }
        }
    }

    /// Fill `out` with the waveform at `ctx.frequency` (overwrites).
    pub fn render(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        for sample in out.iter_mut() {
            *sample = self.next_sample(ctx.frequency, ctx.sample_rate);
        }
    }

    /// Add the waveform, scaled by `level`, onto `out`.
    pub fn render_add(&mut self, out: &mut [f32], ctx: &RenderCtx, level: f32) {
        for sample in out.iter_mut() {
            *sample += self.next_sample(ctx.frequency, ctx.sample_rate) * level;
        }
    }

    #[inline]
    fn step_noise(&mut self) {
        let mut x = self.noise_state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.noise_state = x;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_sine() {
        let sample_rate = 48_000.0;
        let ctx = RenderCtx::from_note(sample_rate, 69, 100.0);
        let mut osc = OscillatorBlock::sine();

        let mut buffer = vec![0.0f32; 128];
        osc.render(&mut buffer, &ctx);

        // sample n should be sin(2pi f n / sr), where f = 440Hz (MIDI 69)
        let sample_index = 12;
        let expected = (TAU * ctx.frequency * sample_index as f32 / sample_rate).sin();
        let actual = buffer[sample_index];
        assert!(
            (actual - expected).abs() < 1e-4,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn every_waveform_stays_in_range() {
        let ctx = RenderCtx::from_freq(48_000.0, 1_234.0, 100.0);
        for waveform in [
            OscillatorWaveform::Sine,
            OscillatorWaveform::Saw,
            OscillatorWaveform::Square,
            OscillatorWaveform::Triangle,
            OscillatorWaveform::Noise,
        ] {
            let mut osc = OscillatorBlock::new(waveform);
            let mut buffer = vec![0.0f32; 1024];
            osc.render(&mut buffer, &ctx);
            assert!(
                buffer.iter().all(|s| (-1.0..=1.0).contains(s)),
                "{waveform:?} left [-1, 1]"
            );
        }
    }

    #[test]
    fn render_add_accumulates() {
        let ctx = RenderCtx::from_freq(48_000.0, 100.0, 100.0);
        let mut osc = OscillatorBlock::square();
        let mut buffer = vec![0.25f32; 8];
        osc.render_add(&mut buffer, &ctx, 0.5);
        // square starts high: 0.25 + 0.5
        assert!((buffer[0] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn skip_matches_rendering() {
        let ctx = RenderCtx::from_freq(48_000.0, 330.0, 100.0);
        let mut rendered = OscillatorBlock::sawtooth();
        let mut skipped = OscillatorBlock::sawtooth();

        let mut scratch = vec![0.0; 100];
        rendered.render(&mut scratch, &ctx);
        skipped.skip(100, ctx.frequency, ctx.sample_rate);

        assert!((rendered.phase() - skipped.phase()).abs() < 1e-4);
    }

    #[test]
    fn noise_is_repeatable_after_reset() {
        let ctx = RenderCtx::from_freq(48_000.0, 0.0, 100.0);
        let mut osc = OscillatorBlock::noise();
        let mut first = vec![0.0; 16];
        osc.render(&mut first, &ctx);
        osc.reset();
        let mut second = vec![0.0; 16];
        osc.render(&mut second, &ctx);
        assert_eq!(first, second);
    }
}
