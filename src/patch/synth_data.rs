use std::sync::Arc;

use crate::patch::{bank::ProgramId, program::ProgramData};

/// Anything that can hand out programs to the synth.
///
/// Implementations must be cheap and non-blocking: the compute thread calls
/// `program` when it handles a program change.
pub trait ProgramSource: Send + Sync {
    fn program(&self, id: ProgramId) -> Option<Arc<ProgramData>>;
    fn program_by_name(&self, name: &str) -> Option<Arc<ProgramData>>;
}

/// Session-wide synth data: sample rate, program source and the sequencing
/// cursor used to place events in time.
#[derive(Clone)]
pub struct SynthData {
    sample_rate: f32,
    seq_cursor: f64,
    bank_name: String,
    programs: Arc<dyn ProgramSource>,
}

impl std::fmt::Debug for SynthData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthData")
            .field("sample_rate", &self.sample_rate)
            .field("seq_cursor", &self.seq_cursor)
            .field("bank_name", &self.bank_name)
            .finish_non_exhaustive()
    }
}

impl SynthData {
    pub fn new(sample_rate: f32, programs: Arc<dyn ProgramSource>) -> Self {
        Self {
            sample_rate,
            seq_cursor: 0.0,
            bank_name: String::new(),
            programs,
        }
    }

    pub fn with_bank_name(mut self, name: impl Into<String>) -> Self {
        self.bank_name = name.into();
        self
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn bank_name(&self) -> &str {
        &self.bank_name
    }

    pub fn programs(&self) -> Arc<dyn ProgramSource> {
        Arc::clone(&self.programs)
    }

    /// `None` when no program has this id.
    pub fn program(&self, id: ProgramId) -> Option<Arc<ProgramData>> {
        self.programs.program(id)
    }

    /// `None` when no program has this name.
    pub fn program_by_name(&self, name: &str) -> Option<Arc<ProgramData>> {
        self.programs.program_by_name(name)
    }

    /// Reserve `duration` seconds on the sequencing timeline.
    ///
    /// Returns the time at which the reserved span starts, then moves the
    /// cursor past it. Successive calls lay events end to end.
    pub fn seq_time(&mut self, duration: f64) -> f64 {
        let start = self.seq_cursor;
        self.seq_cursor += duration.max(0.0);
        start
    }

    pub fn seq_cursor(&self) -> f64 {
        self.seq_cursor
    }

    pub fn rewind(&mut self) {
        self.seq_cursor = 0.0;
    }

    pub fn seconds_to_frames(&self, seconds: f64) -> u64 {
        (seconds.max(0.0) * self.sample_rate as f64).round() as u64
    }
}
