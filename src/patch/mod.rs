//! Immutable patch data.
//!
//! Programs are validated when they enter a [`ProgramBank`] and are shared
//! by `Arc` from then on, so any thread may read them without locking.

pub mod bank;
pub mod program;
pub mod synth_data;

pub use bank::{ProgramBank, ProgramId};
pub use program::{KeyRange, LayerData, ProgramData};
pub use synth_data::{ProgramSource, SynthData};
