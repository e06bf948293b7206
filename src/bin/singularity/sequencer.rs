//! Sequencer - wall-clock pattern playback
//!
//! Runs on its own thread. Step start times come from
//! [`SynthData::seq_time`], so each step is scheduled against an absolute
//! cursor instead of accumulating sleep error.

use std::thread;
use std::time::{Duration, Instant};

use singularity::{synth::SynthHandle, SynthData, SynthMessage};

/// One pattern step. `notes` empty means a rest.
#[derive(Debug, Clone)]
pub struct Step {
    notes: Vec<u8>,
    velocity: u8,
    /// Length in beats.
    beats: f64,
}

impl Step {
    pub fn note(note: u8, velocity: u8, beats: f64) -> Self {
        Self::chord(&[note], velocity, beats)
    }

    pub fn chord(notes: &[u8], velocity: u8, beats: f64) -> Self {
        Self {
            notes: notes.to_vec(),
            velocity,
            beats,
        }
    }

    pub fn rest(beats: f64) -> Self {
        Self::chord(&[], 0, beats)
    }
}

pub struct Sequencer {
    data: SynthData,
    bpm: f64,
    steps: Vec<Step>,
    /// 0 loops forever.
    repeats: u32,
    /// Fraction of a step the notes are held.
    gate: f64,
}

impl Sequencer {
    pub fn new(data: SynthData, bpm: f64, steps: Vec<Step>, repeats: u32) -> Self {
        Self {
            data,
            bpm,
            steps,
            repeats,
            gate: 0.8,
        }
    }

    fn seconds_per_beat(&self) -> f64 {
        60.0 / self.bpm
    }

    pub fn run(mut self, mut handle: SynthHandle) {
        let start = Instant::now();
        let beat = self.seconds_per_beat();
        let mut pass = 0;

        tracing::info!(bank = self.data.bank_name(), steps = self.steps.len(), "sequencer started");

        while self.repeats == 0 || pass < self.repeats {
            for step in &self.steps {
                let length = step.beats * beat;
                let at = self.data.seq_time(length);

                wait_until(start, at);
                for &note in &step.notes {
                    send(&mut handle, SynthMessage::NoteOn { note, velocity: step.velocity });
                }

                wait_until(start, at + length * self.gate);
                for &note in &step.notes {
                    send(&mut handle, SynthMessage::NoteOff { note });
                }
            }
            pass += 1;
        }

        // let the last release tails ring out
        wait_until(start, self.data.seq_cursor() + 2.0);
        send(&mut handle, SynthMessage::AllNotesOff);
    }
}

fn wait_until(start: Instant, seconds: f64) {
    let target = start + Duration::from_secs_f64(seconds.max(0.0));
    let now = Instant::now();
    if target > now {
        thread::sleep(target - now);
    }
}

fn send(handle: &mut SynthHandle, msg: SynthMessage) {
    if let Err(full) = handle.send(msg) {
        tracing::warn!(dropped = ?full.0, "event queue full");
    }
}
