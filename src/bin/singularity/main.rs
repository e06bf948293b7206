//! singularity - play a program from a patch bank through the default output
//!
//! Run with: cargo run -- --program bell --bpm 96

mod app;
mod sequencer;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{ensure, eyre, Result as EyreResult, WrapErr};
use tracing_subscriber::EnvFilter;

use app::Player;
use singularity::{ProgramBank, SynthConfig};

#[derive(Parser, Debug)]
#[command(name = "singularity")]
#[command(author, version, about = "Polyphonic layered synth voice engine", long_about = None)]
struct Args {
    /// Patch bank (TOML). The factory bank is used when omitted.
    #[arg(short, long)]
    bank: Option<PathBuf>,

    /// Engine settings (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Program to play, by name
    #[arg(short, long, default_value = "lead")]
    program: String,

    /// Tempo in beats per minute (1 to 1000)
    #[arg(long, default_value_t = 120.0)]
    bpm: f64,

    /// Pattern repeats before stopping (0 loops forever)
    #[arg(long, default_value_t = 4)]
    repeats: u32,

    /// List the bank's programs and exit
    #[arg(long)]
    list: bool,
}

const BPM_RANGE: std::ops::RangeInclusive<f64> = 1.0..=1000.0;

fn check_bpm(bpm: f64) -> EyreResult<f64> {
    ensure!(
        BPM_RANGE.contains(&bpm),
        "--bpm must be between {} and {}, got {bpm}",
        BPM_RANGE.start(),
        BPM_RANGE.end()
    );
    Ok(bpm)
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let bpm = check_bpm(args.bpm)?;

    let bank = match &args.bank {
        Some(path) => ProgramBank::load(path)
            .wrap_err_with(|| format!("failed to load bank {}", path.display()))?,
        None => ProgramBank::factory().wrap_err("factory bank is invalid")?,
    };

    if args.list {
        for (id, program) in bank.iter() {
            println!("{id:>4}  {:<16} {}", program.name, program.role.as_deref().unwrap_or("-"));
        }
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => SynthConfig::load(path)
            .wrap_err_with(|| format!("failed to load config {}", path.display()))?,
        None => SynthConfig::default(),
    };

    let program = bank
        .id_of(&args.program)
        .ok_or_else(|| eyre!("bank '{}' has no program named '{}'", bank.name(), args.program))?;

    Player::new(bank, config)
        .program(program)
        .bpm(bpm)
        .repeats(args.repeats)
        .run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bpm_must_be_playable() {
        assert_eq!(check_bpm(120.0).unwrap(), 120.0);
        assert!(check_bpm(0.0).is_err());
        assert!(check_bpm(-60.0).is_err());
        assert!(check_bpm(f64::NAN).is_err());
        assert!(check_bpm(f64::INFINITY).is_err());
    }
}
