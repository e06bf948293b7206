//! Engine configuration.
//!
//! Everything here sizes the voice pool or the event queue, so it is read
//! once when a [`Synth`](crate::Synth) is built and never changes afterwards.

#[cfg(feature = "serde")]
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, synth::allocator::StealPolicy, MAX_BLOCK_SIZE};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct SynthConfig {
    pub sample_rate: f32,
    /// Size of the voice pool. Every voice is allocated up front.
    pub max_voices: usize,
    /// Largest chunk computed in one pass; longer output buffers are split.
    pub max_block_size: usize,
    /// Capacity of the producer → compute event queue.
    pub event_capacity: usize,
    pub steal_policy: StealPolicy,
    pub master_gain_db: f32,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            max_voices: 16,
            max_block_size: 512,
            event_capacity: 256,
            steal_policy: StealPolicy::default(),
            master_gain_db: -6.0,
        }
    }
}

impl SynthConfig {
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_max_voices(mut self, max_voices: usize) -> Self {
        self.max_voices = max_voices;
        self
    }

    pub fn with_steal_policy(mut self, policy: StealPolicy) -> Self {
        self.steal_policy = policy;
        self
    }

    pub fn with_master_gain_db(mut self, db: f32) -> Self {
        self.master_gain_db = db;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_rate.is_finite() && (8_000.0..=384_000.0).contains(&self.sample_rate)) {
            return Err(ConfigError::Invalid {
                field: "sample_rate",
                reason: format!("{} Hz is outside 8 kHz..=384 kHz", self.sample_rate),
            });
        }
        if self.max_voices == 0 || self.max_voices > u16::MAX as usize {
            return Err(ConfigError::Invalid {
                field: "max_voices",
                reason: format!("{} voices (need 1..={})", self.max_voices, u16::MAX),
            });
        }
        if self.max_block_size == 0 || self.max_block_size > MAX_BLOCK_SIZE {
            return Err(ConfigError::Invalid {
                field: "max_block_size",
                reason: format!("{} frames (need 1..={MAX_BLOCK_SIZE})", self.max_block_size),
            });
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "event_capacity",
                reason: "queue needs at least one slot".into(),
            });
        }
        if !self.master_gain_db.is_finite() {
            return Err(ConfigError::Invalid {
                field: "master_gain_db",
                reason: "not finite".into(),
            });
        }
        Ok(())
    }

    #[cfg(feature = "serde")]
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: SynthConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "serde")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), ?config, "loaded synth config");
        Ok(config)
    }
}
