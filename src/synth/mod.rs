// Purpose: Layer and voice lifecycle, voice allocation, event intake
// This layer sits above the block/control instances and drives one buffer at a time

pub mod allocator;
pub mod engine;
pub mod layer;
pub mod message;
pub mod voice;

pub use allocator::StealPolicy;
pub use engine::{Synth, VoiceHandle};
pub use layer::{BlockMask, LayerInst, LayerState};
#[cfg(feature = "rtrb")]
pub use message::SynthHandle;
pub use message::{MessageReceiver, SynthMessage};
pub use voice::{Voice, VoiceState};
