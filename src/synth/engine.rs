use std::sync::Arc;

#[cfg(feature = "rtrb")]
use rtrb::RingBuffer;

#[cfg(feature = "rtrb")]
use crate::synth::message::SynthHandle;
use crate::{
    config::SynthConfig,
    control::{KeyOnInfo, KeyOnModifiers},
    dsp::amplify::{apply_gain, db_to_linear},
    error::ConfigError,
    patch::{ProgramData, ProgramId, ProgramSource},
    synth::{
        allocator::pick_voice,
        layer::BlockMask,
        message::{MessageReceiver, SynthMessage},
        voice::{Voice, VoiceState},
    },
    MAX_LAYERS_PER_PROGRAM,
};

/// Identifies one note started with [`Synth::key_on`].
///
/// A handle goes stale once its voice is stolen; stale handles are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceHandle {
    index: usize,
    generation: u32,
}

impl VoiceHandle {
    pub fn index(&self) -> usize {
        self.index
    }
}

/// The voice pool and the per-buffer compute loop.
///
/// Owned by the audio thread. Nothing reachable from [`Synth::compute`]
/// allocates, locks or logs.
pub struct Synth {
    config: SynthConfig,
    programs: Arc<dyn ProgramSource>,
    current: Option<Arc<ProgramData>>,
    voices: Box<[Voice]>,
    receiver: Option<Box<dyn MessageReceiver + Send>>,
    block_mask: BlockMask,
    master_gain: f32,
    note_counter: u64,
    frames_rendered: u64,
}

impl Synth {
    pub fn new(config: SynthConfig, programs: Arc<dyn ProgramSource>) -> Result<Self, ConfigError> {
        config.validate()?;

        let voices = (0..config.max_voices)
            .map(|_| Voice::new(config.max_block_size))
            .collect();

        tracing::info!(
            sample_rate = config.sample_rate,
            voices = config.max_voices,
            block = config.max_block_size,
            steal_policy = ?config.steal_policy,
            "synth ready"
        );

        Ok(Self {
            master_gain: db_to_linear(config.master_gain_db),
            config,
            programs,
            current: None,
            voices,
            receiver: None,
            block_mask: BlockMask::ALL,
            note_counter: 0,
            frames_rendered: 0,
        })
    }

    /// A synth wired to a fresh event queue, plus the producer end.
    #[cfg(feature = "rtrb")]
    pub fn channel(
        config: SynthConfig,
        programs: Arc<dyn ProgramSource>,
    ) -> Result<(Self, SynthHandle), ConfigError> {
        let (tx, rx) = RingBuffer::<SynthMessage>::new(config.event_capacity);
        let mut synth = Self::new(config, programs)?;
        synth.attach_receiver(Box::new(rx));
        Ok((synth, SynthHandle::new(tx)))
    }

    pub fn attach_receiver(&mut self, receiver: Box<dyn MessageReceiver + Send>) {
        self.receiver = Some(receiver);
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f32 {
        self.config.sample_rate
    }

    /// Start `note` on a voice, stealing one if the pool is full.
    ///
    /// Returns `None` when no layer of `program` accepts the note.
    ///
    /// # Panics
    ///
    /// If `program` fails [`ProgramData::validate`]. Banks validate on
    /// insert; programs built by hand must be valid too.
    pub fn key_on(
        &mut self,
        note: u8,
        velocity: u8,
        program: &Arc<ProgramData>,
    ) -> Option<VoiceHandle> {
        self.key_on_with(note, velocity, program, None)
    }

    /// [`key_on`](Self::key_on) with generators and subscribers attached to
    /// the new voice's named controllers.
    pub fn key_on_with(
        &mut self,
        note: u8,
        velocity: u8,
        program: &Arc<ProgramData>,
        mods: Option<&KeyOnModifiers>,
    ) -> Option<VoiceHandle> {
        if let Err(err) = program.validate() {
            panic!("key-on with an invalid program: {err}");
        }
        let accepted = program
            .layers
            .iter()
            .take(MAX_LAYERS_PER_PROGRAM)
            .any(|layer| layer.accepts(note, velocity));
        if !accepted {
            return None;
        }
        let index = pick_voice(&self.voices, self.config.steal_policy)?;

        self.note_counter += 1;
        let koi = KeyOnInfo {
            note,
            velocity,
            layer: 0,
            sample_rate: self.config.sample_rate,
            time: self.frames_rendered,
        };
        let voice = &mut self.voices[index];
        voice.key_on(program, koi, self.note_counter, mods);
        Some(VoiceHandle {
            index,
            generation: voice.generation(),
        })
    }

    /// Current value of the controller called `name` on the voice behind
    /// `handle`. `None` for a stale handle or an unknown name.
    pub fn control_value(&self, handle: VoiceHandle, name: &str) -> Option<f32> {
        self.voices
            .get(handle.index)
            .filter(|voice| voice.generation() == handle.generation)
            .and_then(|voice| voice.control_value(name))
    }

    /// Release the note behind `handle`. Returns false for a stale handle or
    /// a note that was already released.
    pub fn key_off(&mut self, handle: VoiceHandle) -> bool {
        match self.voices.get_mut(handle.index) {
            Some(voice) if voice.generation() == handle.generation => voice.key_off(),
            _ => false,
        }
    }

    /// Release every held voice playing `note`.
    pub fn note_off(&mut self, note: u8) {
        for voice in self.voices.iter_mut() {
            if voice.is_held() && voice.note() == note {
                voice.key_off();
            }
        }
    }

    pub fn all_notes_off(&mut self) {
        for voice in self.voices.iter_mut() {
            voice.key_off();
        }
    }

    /// Make `id` the program used by [`SynthMessage::NoteOn`]. Unknown ids
    /// leave the current program in place and return false.
    pub fn select_program(&mut self, id: ProgramId) -> bool {
        match self.programs.program(id) {
            Some(program) => {
                self.current = Some(program);
                true
            }
            None => false,
        }
    }

    pub fn current_program(&self) -> Option<&Arc<ProgramData>> {
        self.current.as_ref()
    }

    pub fn set_block_enabled(&mut self, index: usize, enabled: bool) {
        self.block_mask.set(index, enabled);
    }

    pub fn block_mask(&self) -> BlockMask {
        self.block_mask
    }

    pub fn set_master_gain_db(&mut self, db: f32) {
        self.master_gain = db_to_linear(db);
    }

    pub fn handle_message(&mut self, msg: SynthMessage) {
        match msg {
            SynthMessage::NoteOn { note, velocity } => {
                if let Some(program) = self.current.clone() {
                    self.key_on(note, velocity, &program);
                }
            }
            SynthMessage::NoteOff { note } => self.note_off(note),
            SynthMessage::ProgramChange { program } => {
                self.select_program(program);
            }
            SynthMessage::AllNotesOff => self.all_notes_off(),
            SynthMessage::SetBlockEnabled { index, enabled } => {
                self.set_block_enabled(index as usize, enabled)
            }
            SynthMessage::MasterGain { db } => self.set_master_gain_db(db),
        }
    }

    fn drain_events(&mut self) {
        let Some(mut receiver) = self.receiver.take() else {
            return;
        };
        while let Some(msg) = receiver.pop() {
            self.handle_message(msg);
        }
        self.receiver = Some(receiver);
    }

    /// Render one output buffer.
    ///
    /// Finished voices are reclaimed and queued events applied before any
    /// audio is produced. Output longer than `max_block_size` is computed in
    /// chunks.
    pub fn compute(&mut self, left: &mut [f32], right: &mut [f32]) {
        assert_eq!(left.len(), right.len(), "channel buffers differ in length");

        for voice in self.voices.iter_mut() {
            if voice.state() == VoiceState::Finished {
                voice.reclaim();
            }
        }
        self.drain_events();

        left.fill(0.0);
        right.fill(0.0);

        let chunk = self.config.max_block_size;
        for (l, r) in left.chunks_mut(chunk).zip(right.chunks_mut(chunk)) {
            let frames = l.len();
            for voice in self.voices.iter_mut() {
                if voice.state() != VoiceState::Free {
                    voice.compute(frames, self.block_mask, l, r);
                }
            }
            apply_gain(l, self.master_gain);
            apply_gain(r, self.master_gain);
        }

        self.frames_rendered += left.len() as u64;
    }

    /// Voices that are not free.
    pub fn active_voice_count(&self) -> usize {
        self.voices
            .iter()
            .filter(|voice| voice.state() != VoiceState::Free)
            .count()
    }

    pub fn voice(&self, index: usize) -> Option<&Voice> {
        self.voices.get(index)
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }
}
