//! Low-level DSP primitives used by the DSP blocks and controllers.
//!
//! These components are allocation-free and realtime-safe, making them safe to
//! embed directly inside per-voice instance state. They stay focused on the
//! signal-processing math; the `block` and `control` modules layer key-on
//! handling and modulation routing on top.

/// Signal multiplication, gain and ring-modulation combine rules.
pub mod amplify;
/// Per-render timing and pitch context.
pub mod context;
/// Waveshaping transfer functions.
pub mod distortion;
/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// State-variable filter implementation with multiple responses.
pub mod filter;
/// Control-rate oscillator and polarity helpers.
pub mod lfo;
/// Oscillator waveforms and noise sources.
pub mod oscillator;

pub use context::{midi_note_to_freq, RenderCtx};
pub use envelope::EnvelopeState;
