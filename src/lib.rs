pub mod block; // DSP block templates, instances and the layer work buffer
pub mod config;
pub mod control; // Controllers and fixed-capacity control blocks
pub mod dsp;
pub mod error;
pub mod patch; // Immutable program/layer data and banks
pub mod programs; // Factory programs
pub mod synth; // Layers, voices, allocation and the compute loop

pub use config::SynthConfig;
pub use control::{ControlSignal, KeyOnModifiers};
pub use error::{ConfigError, PatchError, QueueFull};
pub use patch::{LayerData, ProgramBank, ProgramData, ProgramId, ProgramSource, SynthData};
pub use synth::{Synth, SynthMessage, VoiceHandle};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;

/// Controller slots per control block.
pub const MAX_CTRL_PER_BLOCK: usize = 4;
/// Control blocks per layer.
pub const MAX_CTRL_BLOCKS_PER_LAYER: usize = 4;
/// DSP chain positions per layer.
pub const MAX_DSP_BLOCKS_PER_LAYER: usize = 8;
/// Layers a single program may stack.
pub const MAX_LAYERS_PER_PROGRAM: usize = 4;
