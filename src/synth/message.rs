#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer, PushError};

#[cfg(feature = "rtrb")]
use crate::error::QueueFull;
use crate::patch::ProgramId;

/// Events handed from producer threads to the compute thread. Applied at the
/// start of the next buffer, in the order they were sent.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SynthMessage {
    /// Start a note with the current program.
    NoteOn { note: u8, velocity: u8 },
    /// Release every held voice playing `note`.
    NoteOff { note: u8 },
    ProgramChange { program: ProgramId },
    AllNotesOff,
    /// Toggle one DSP chain position for every layer.
    SetBlockEnabled { index: u8, enabled: bool },
    MasterGain { db: f32 },
}

/// Compute-thread side of an event queue. Must never block.
pub trait MessageReceiver {
    fn pop(&mut self) -> Option<SynthMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<SynthMessage> {
    fn pop(&mut self) -> Option<SynthMessage> {
        Consumer::pop(self).ok()
    }
}

/// Producer side of the event queue, held by a MIDI, sequencer or UI thread.
#[cfg(feature = "rtrb")]
pub struct SynthHandle {
    tx: Producer<SynthMessage>,
}

#[cfg(feature = "rtrb")]
impl SynthHandle {
    pub fn new(tx: Producer<SynthMessage>) -> Self {
        Self { tx }
    }

    /// Never blocks. A full queue hands the message back.
    pub fn send(&mut self, msg: SynthMessage) -> Result<(), QueueFull> {
        self.tx.push(msg).map_err(|err| match err {
            PushError::Full(msg) => QueueFull(msg),
        })
    }

    pub fn note_on(&mut self, note: u8, velocity: u8) -> Result<(), QueueFull> {
        self.send(SynthMessage::NoteOn { note, velocity })
    }

    pub fn note_off(&mut self, note: u8) -> Result<(), QueueFull> {
        self.send(SynthMessage::NoteOff { note })
    }

    pub fn program_change(&mut self, program: ProgramId) -> Result<(), QueueFull> {
        self.send(SynthMessage::ProgramChange { program })
    }

    pub fn all_notes_off(&mut self) -> Result<(), QueueFull> {
        self.send(SynthMessage::AllNotesOff)
    }

    /// Free slots left in the queue.
    pub fn slots(&self) -> usize {
        self.tx.slots()
    }
}
