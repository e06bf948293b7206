//! Per-note hooks into a layer's named controllers.
//!
//! A [`KeyOnModifiers`] table is built off the audio thread and handed to
//! [`Synth::key_on_with`]. At key-on every name is looked up in the layer's
//! name map:
//!
//! - a generator replaces the controller's own output with a value another
//!   thread writes into a [`ControlSignal`];
//! - a subscriber receives the controller's output after every buffer.
//!
//! Names no layer registers are ignored. Attaching only clones `Arc`s, so the
//! key-on path stays allocation free.
//!
//! [`Synth::key_on_with`]: crate::synth::Synth::key_on_with

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// An `f32` shared between a control thread and the audio thread.
#[derive(Debug, Default)]
pub struct ControlSignal(AtomicU32);

impl ControlSignal {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    pub fn set(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Default)]
pub struct KeyOnModifiers {
    generators: Vec<(Arc<str>, Arc<ControlSignal>)>,
    subscribers: Vec<(Arc<str>, Arc<ControlSignal>)>,
}

impl KeyOnModifiers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive the controller called `name` from `signal`.
    pub fn generate(mut self, name: &str, signal: &Arc<ControlSignal>) -> Self {
        self.generators.push((Arc::from(name), Arc::clone(signal)));
        self
    }

    /// Publish the value of the controller called `name` into `signal`.
    pub fn subscribe(mut self, name: &str, signal: &Arc<ControlSignal>) -> Self {
        self.subscribers.push((Arc::from(name), Arc::clone(signal)));
        self
    }

    pub fn generators(&self) -> impl Iterator<Item = (&str, &Arc<ControlSignal>)> {
        self.generators.iter().map(|(name, signal)| (name.as_ref(), signal))
    }

    pub fn subscribers(&self) -> impl Iterator<Item = (&str, &Arc<ControlSignal>)> {
        self.subscribers.iter().map(|(name, signal)| (name.as_ref(), signal))
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty() && self.subscribers.is_empty()
    }
}
