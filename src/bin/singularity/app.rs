//! Audio output and thread wiring.
//!
//! The cpal callback owns the [`Synth`]. The sequencer thread only talks to
//! it through the event queue, so nothing on the audio thread locks.

use std::sync::Arc;
use std::thread;

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use singularity::{ProgramBank, ProgramId, Synth, SynthConfig, SynthData, MAX_BLOCK_SIZE};

use super::sequencer::{Sequencer, Step};

pub struct Player {
    bank: Arc<ProgramBank>,
    config: SynthConfig,
    program: ProgramId,
    bpm: f64,
    repeats: u32,
}

impl Player {
    pub fn new(bank: ProgramBank, config: SynthConfig) -> Self {
        Self {
            bank: Arc::new(bank),
            config,
            program: ProgramId(0),
            bpm: 120.0,
            repeats: 4,
        }
    }

    pub fn program(mut self, program: ProgramId) -> Self {
        self.program = program;
        self
    }

    pub fn bpm(mut self, bpm: f64) -> Self {
        self.bpm = bpm;
        self
    }

    pub fn repeats(mut self, repeats: u32) -> Self {
        self.repeats = repeats;
        self
    }

    /// Play until the pattern is done (or forever when looping).
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let stream_config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = stream_config.sample_rate().0 as f32;
        let channels = stream_config.channels() as usize;
        let config = self.config.with_sample_rate(sample_rate);

        tracing::info!(
            device = %device.name().unwrap_or_else(|_| "unknown".into()),
            sample_rate,
            channels,
            bpm = self.bpm,
            "opening output"
        );

        let (mut synth, mut handle) = Synth::channel(config, self.bank.clone())?;
        handle.program_change(self.program)?;

        let mut left = vec![0.0f32; MAX_BLOCK_SIZE];
        let mut right = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = device.build_output_stream(
            &stream_config.into(),
            move |data: &mut [f32], _| {
                for frame_block in data.chunks_mut(MAX_BLOCK_SIZE * channels) {
                    let frames = frame_block.len() / channels;
                    let (l, r) = (&mut left[..frames], &mut right[..frames]);
                    synth.compute(l, r);

                    for (i, frame) in frame_block.chunks_mut(channels).enumerate() {
                        match frame {
                            [mono] => *mono = 0.5 * (l[i] + r[i]),
                            [fl, fr, rest @ ..] => {
                                *fl = l[i];
                                *fr = r[i];
                                rest.fill(0.0);
                            }
                            [] => {}
                        }
                    }
                }
            },
            |err| tracing::error!(%err, "audio stream error"),
            None,
        )?;
        stream.play()?;

        let data = SynthData::new(sample_rate, self.bank.clone()).with_bank_name(self.bank.name());
        let sequencer = Sequencer::new(data, self.bpm, demo_pattern(), self.repeats);
        let worker = thread::Builder::new()
            .name("sequencer".into())
            .spawn(move || sequencer.run(handle))
            .wrap_err("failed to spawn sequencer thread")?;

        worker
            .join()
            .map_err(|_| eyre!("sequencer thread panicked"))?;

        tracing::info!("pattern finished");
        Ok(())
    }
}

/// C minor arpeggio with a held chord at the end, in beats.
fn demo_pattern() -> Vec<Step> {
    vec![
        Step::note(60, 100, 0.5),
        Step::note(63, 90, 0.5),
        Step::note(67, 110, 0.5),
        Step::note(72, 80, 0.5),
        Step::note(70, 100, 0.5),
        Step::note(67, 70, 0.5),
        Step::rest(0.5),
        Step::chord(&[48, 60, 63, 67], 120, 2.5),
    ]
}
