//! Real-world scenario benchmarks.
//!
//! These run the factory programs through the same layer and voice-pool
//! code the engine uses at runtime.

mod layers;
mod synth;

pub use layers::bench_layers;
pub use synth::bench_synth;
