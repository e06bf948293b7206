//! The DSP block framework.
//!
//! A layer's chain is a list of [`DspBlockData`] templates. At key-on each
//! template builds a [`DspBlock`] instance with its own state; every buffer
//! the instances run in chain order over the layer's [`DspBuffer`].

pub mod buffer;
pub mod data;
pub mod inst;

pub use buffer::{Channel, Combine, DspBuffer};
pub use data::{
    AmpData, DspBlockData, FilterData, ModRoute, ModSource, OscillatorData, PannerData, ShaperData,
};
pub use inst::{BlockCtx, BlockState, DspBlock};
