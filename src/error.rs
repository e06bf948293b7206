//! Error types for patch loading, configuration and event hand-off.
//!
//! Nothing in here is produced by the compute thread: patches and configs are
//! validated before they reach a [`Synth`](crate::Synth), so the realtime path
//! only carries debug assertions.

use std::path::PathBuf;

use thiserror::Error;

use crate::{patch::ProgramId, synth::SynthMessage};

/// Errors raised while building or loading patch data.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("failed to read bank '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "serde")]
    #[error("failed to parse bank: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("program '{program}' has {count} layers (max {max})")]
    TooManyLayers {
        program: String,
        count: usize,
        max: usize,
    },

    #[error("layer '{layer}' has {count} control blocks (max {max})")]
    TooManyControlBlocks {
        layer: String,
        count: usize,
        max: usize,
    },

    #[error("layer '{layer}' has {count} dsp blocks (max {max})")]
    TooManyDspBlocks {
        layer: String,
        count: usize,
        max: usize,
    },

    #[error("controller slot {slot} out of range (max {max})")]
    SlotOutOfRange { slot: usize, max: usize },

    #[error("controller slot {slot} assigned twice")]
    DuplicateSlot { slot: usize },

    #[error("layer '{layer}' routes modulation from unknown controller {route}")]
    UnknownController { layer: String, route: String },

    #[error("invalid parameter '{param}' on {owner}: {reason}")]
    InvalidParameter {
        owner: String,
        param: &'static str,
        reason: String,
    },

    #[error("program id {0} already present in bank")]
    DuplicateProgram(ProgramId),
}

impl PatchError {
    pub(crate) fn invalid(owner: impl Into<String>, param: &'static str, reason: impl Into<String>) -> Self {
        PatchError::InvalidParameter {
            owner: owner.into(),
            param,
            reason: reason.into(),
        }
    }
}

/// Errors raised while loading or validating a [`SynthConfig`](crate::SynthConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "serde")]
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config field '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// The event queue between a producer thread and the compute thread is full.
///
/// Carries the message back so the caller can retry on its next tick.
#[derive(Debug, Error)]
#[error("synth event queue full, dropped {0:?}")]
pub struct QueueFull(pub SynthMessage);
