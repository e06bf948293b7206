//! Voice allocation and stealing.
//!
//! A new note always gets a voice. Free voices are used first, then voices
//! that finished but have not been reclaimed yet. Past that a sounding voice
//! is stolen according to the [`StealPolicy`]. Every rule breaks ties by the
//! lowest pool index, so the same event stream always steals the same voices.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::synth::voice::{Voice, VoiceState};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StealPolicy {
    /// Oldest releasing voice, falling back to the oldest held one.
    #[default]
    ReleasedFirst,
    /// Oldest voice regardless of state.
    Oldest,
    /// Voice with the lowest peak in its last buffer. Voices that have not
    /// rendered a buffer yet are skipped; if every voice is that new, the
    /// oldest one goes.
    Quietest,
}

/// Pool index for the next note. `None` only for an empty pool.
pub fn pick_voice(voices: &[Voice], policy: StealPolicy) -> Option<usize> {
    let first_in = |state: VoiceState| voices.iter().position(|v| v.state() == state);
    if let Some(index) = first_in(VoiceState::Free).or_else(|| first_in(VoiceState::Finished)) {
        return Some(index);
    }

    let oldest = |filter: &dyn Fn(&Voice) -> bool| {
        voices
            .iter()
            .enumerate()
            .filter(|(_, v)| filter(*v))
            .min_by_key(|(_, v)| v.age())
            .map(|(index, _)| index)
    };

    match policy {
        StealPolicy::ReleasedFirst => {
            oldest(&|v: &Voice| v.state() == VoiceState::Releasing).or_else(|| oldest(&|_: &Voice| true))
        }
        StealPolicy::Oldest => oldest(&|_: &Voice| true),
        StealPolicy::Quietest => voices
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_starting())
            .min_by(|(_, a), (_, b)| a.peak().total_cmp(&b.peak()))
            .map(|(index, _)| index)
            .or_else(|| oldest(&|_: &Voice| true)),
    }
}
