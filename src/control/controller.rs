//! Modulation sources.
//!
//! `ControllerData` is the immutable template stored in a patch;
//! `ControllerData::instantiate` is the factory that binds a fresh
//! `ControllerInst` to a layer. Instances produce one value per buffer.

use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    control::{ControlSignal, KeyOnInfo},
    dsp::{
        envelope::Envelope,
        lfo::{Lfo, Polarity},
        oscillator::OscillatorWaveform,
    },
    error::PatchError,
    MIN_TIME,
};

/// Linear ADSR with velocity-scaled attack and key-scaled release.
///
/// `attack_vel_track` in [0, 1]: at 1 a full-velocity note has an instant
/// attack. `release_key_track` is in octaves-per-doubling: each octave above
/// C4 divides the release time by `2^release_key_track`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeData {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
    pub attack_vel_track: f32,
    pub release_key_track: f32,
}

impl Default for EnvelopeData {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.3,
            attack_vel_track: 0.0,
            release_key_track: 0.0,
        }
    }
}

impl EnvelopeData {
    pub fn adsr(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
            ..Self::default()
        }
    }

    fn build(&self, note: u8, velocity: u8) -> Envelope {
        let vel = velocity as f32 / 127.0;
        let attack = self.attack * (1.0 - self.attack_vel_track * vel).max(0.0);
        let octaves = (note as f32 - 60.0) / 12.0;
        let release = self.release * 2.0_f32.powf(-self.release_key_track * octaves);
        Envelope::adsr(attack.max(MIN_TIME), self.decay, self.sustain, release)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LfoData {
    pub waveform: OscillatorWaveform,
    pub rate_hz: f32,
    pub polarity: Polarity,
    /// Restart the cycle on every key-on. Otherwise the phase follows the
    /// synth clock, so notes started at different times are out of phase.
    pub sync: bool,
}

impl Default for LfoData {
    fn default() -> Self {
        Self {
            waveform: OscillatorWaveform::Sine,
            rate_hz: 5.0,
            polarity: Polarity::Bipolar,
            sync: true,
        }
    }
}

/// `(note - center) / 12 * amount`: `amount` per octave away from `center`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyTrackData {
    pub center: u8,
    pub amount: f32,
}

impl Default for KeyTrackData {
    fn default() -> Self {
        Self {
            center: 60,
            amount: 1.0,
        }
    }
}

/// `(velocity / 127) ^ curve`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityData {
    pub curve: f32,
}

impl Default for VelocityData {
    fn default() -> Self {
        Self { curve: 1.0 }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConstantData {
    pub value: f32,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerKind {
    Envelope(EnvelopeData),
    Lfo(LfoData),
    KeyTrack(KeyTrackData),
    Velocity(VelocityData),
    Constant(ConstantData),
}

impl ControllerKind {
    pub fn name(&self) -> &'static str {
        match self {
            ControllerKind::Envelope(_) => "envelope",
            ControllerKind::Lfo(_) => "lfo",
            ControllerKind::KeyTrack(_) => "key_track",
            ControllerKind::Velocity(_) => "velocity",
            ControllerKind::Constant(_) => "constant",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerData {
    pub name: Arc<str>,
    pub kind: ControllerKind,
}

impl ControllerData {
    pub fn new(name: &str, kind: ControllerKind) -> Self {
        Self {
            name: Arc::from(name),
            kind,
        }
    }

    pub fn envelope(name: &str, data: EnvelopeData) -> Self {
        Self::new(name, ControllerKind::Envelope(data))
    }

    pub fn lfo(name: &str, data: LfoData) -> Self {
        Self::new(name, ControllerKind::Lfo(data))
    }

    pub fn key_track(name: &str, center: u8, amount: f32) -> Self {
        Self::new(name, ControllerKind::KeyTrack(KeyTrackData { center, amount }))
    }

    pub fn velocity(name: &str, curve: f32) -> Self {
        Self::new(name, ControllerKind::Velocity(VelocityData { curve }))
    }

    pub fn constant(name: &str, value: f32) -> Self {
        Self::new(name, ControllerKind::Constant(ConstantData { value }))
    }

    /// Factory: a fresh, not yet keyed-on instance bound to `layer`.
    pub fn instantiate(&self, layer: usize) -> ControllerInst {
        let runtime = match self.kind {
            ControllerKind::Envelope(ref env) => Runtime::Envelope(env.build(60, 0)),
            ControllerKind::Lfo(ref lfo) => {
                Runtime::Lfo(Lfo::new(lfo.waveform, lfo.rate_hz, lfo.polarity, lfo.sync))
            }
            ControllerKind::KeyTrack(_) | ControllerKind::Velocity(_) | ControllerKind::Constant(_) => {
                Runtime::Static
            }
        };

        ControllerInst {
            layer,
            kind: self.kind,
            runtime,
            value: 0.0,
            prev_value: 0.0,
            released: false,
            sample_rate: 0.0,
            generator: None,
            subscriber: None,
        }
    }

    pub fn validate(&self) -> Result<(), PatchError> {
        let owner = || format!("controller '{}'", self.name);
        let non_negative = |param: &'static str, v: f32| {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(PatchError::invalid(owner(), param, format!("{v} must be >= 0")))
            }
        };

        match self.kind {
            ControllerKind::Envelope(env) => {
                non_negative("attack", env.attack)?;
                non_negative("decay", env.decay)?;
                non_negative("release", env.release)?;
                if !(0.0..=1.0).contains(&env.sustain) {
                    return Err(PatchError::invalid(owner(), "sustain", "must be in [0, 1]"));
                }
                if !(0.0..=1.0).contains(&env.attack_vel_track) {
                    return Err(PatchError::invalid(
                        owner(),
                        "attack_vel_track",
                        "must be in [0, 1]",
                    ));
                }
                if !env.release_key_track.is_finite() {
                    return Err(PatchError::invalid(owner(), "release_key_track", "not finite"));
                }
            }
            ControllerKind::Lfo(lfo) => non_negative("rate_hz", lfo.rate_hz)?,
            ControllerKind::KeyTrack(kt) => {
                if kt.center > 127 || !kt.amount.is_finite() {
                    return Err(PatchError::invalid(owner(), "center", "must be a MIDI note"));
                }
            }
            ControllerKind::Velocity(vel) => {
                if !(vel.curve.is_finite() && vel.curve > 0.0) {
                    return Err(PatchError::invalid(owner(), "curve", "must be > 0"));
                }
            }
            ControllerKind::Constant(c) => {
                if !c.value.is_finite() {
                    return Err(PatchError::invalid(owner(), "value", "not finite"));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Runtime {
    Envelope(Envelope),
    Lfo(Lfo),
    /// Value fixed at key-on.
    Static,
}

/// A keyed-on modulation source owned by one layer of one voice.
#[derive(Debug, Clone)]
pub struct ControllerInst {
    layer: usize,
    kind: ControllerKind,
    runtime: Runtime,
    value: f32,
    prev_value: f32,
    released: bool,
    sample_rate: f32,
    /// Replaces the runtime's output when set.
    generator: Option<Arc<ControlSignal>>,
    subscriber: Option<Arc<ControlSignal>>,
}

impl ControllerInst {
    pub fn key_on(&mut self, koi: &KeyOnInfo) {
        debug_assert_eq!(koi.layer, self.layer);
        self.sample_rate = koi.sample_rate;
        self.released = false;

        self.value = match (&self.kind, &mut self.runtime) {
            (ControllerKind::Envelope(data), Runtime::Envelope(env)) => {
                *env = data.build(koi.note, koi.velocity);
                env.note_on();
                env.level()
            }
            (ControllerKind::Lfo(_), Runtime::Lfo(lfo)) => {
                lfo.note_on(koi.time, koi.sample_rate);
                lfo.value()
            }
            (ControllerKind::KeyTrack(kt), Runtime::Static) => {
                (koi.note as f32 - kt.center as f32) / 12.0 * kt.amount
            }
            (ControllerKind::Velocity(vel), Runtime::Static) => {
                (koi.velocity as f32 / 127.0).powf(vel.curve)
            }
            (ControllerKind::Constant(c), Runtime::Static) => c.value,
            (kind, _) => unreachable!("controller runtime does not match {}", kind.name()),
        };
        self.prev_value = self.value;
    }

    /// Begin the release tail. Returns false if already released.
    pub fn key_off(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        if let Runtime::Envelope(env) = &mut self.runtime {
            env.note_off(self.sample_rate);
        }
        true
    }

    /// Advance by one buffer of `num_frames`.
    ///
    /// The runtime keeps advancing under a generator, so an overridden
    /// envelope still decides when the layer is done.
    pub fn compute(&mut self, num_frames: usize) {
        self.prev_value = self.value;
        match &mut self.runtime {
            Runtime::Envelope(env) => self.value = env.advance(num_frames, self.sample_rate),
            Runtime::Lfo(lfo) => self.value = lfo.advance(num_frames, self.sample_rate),
            Runtime::Static => {}
        }
        if let Some(generator) = &self.generator {
            self.value = generator.get();
        }
        if let Some(subscriber) = &self.subscriber {
            subscriber.set(self.value);
        }
    }

    /// Take values from `signal` until the instance is cleared.
    pub fn drive_from(&mut self, signal: &Arc<ControlSignal>) {
        self.value = signal.get();
        self.prev_value = self.value;
        self.generator = Some(Arc::clone(signal));
    }

    /// Publish the value into `signal` now and after every buffer.
    pub fn publish_to(&mut self, signal: &Arc<ControlSignal>) {
        signal.set(self.value);
        self.subscriber = Some(Arc::clone(signal));
    }

    /// Envelopes are done once their release reaches zero; every other kind
    /// is done as soon as it is released.
    pub fn is_done(&self) -> bool {
        match &self.runtime {
            Runtime::Envelope(env) => !env.is_active(),
            _ => self.released,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn prev_value(&self) -> f32 {
        self.prev_value
    }

    pub fn layer(&self) -> usize {
        self.layer
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn kind(&self) -> &ControllerKind {
        &self.kind
    }
}
