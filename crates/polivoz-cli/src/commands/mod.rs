//! Command implementations.

pub mod devices;
pub mod play;
pub mod render;

use clap::ValueEnum;
use polivoz_core::FilterType;
use polivoz_synth::{StealMode, Waveform};

/// Voice count for CLI engines.
pub const VOICES: usize = 16;

/// Waveform names for CLI arguments.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum CliWaveform {
    Sine,
    Square,
    #[default]
    Saw,
    Triangle,
    Noise,
}

impl From<CliWaveform> for Waveform {
    fn from(w: CliWaveform) -> Self {
        match w {
            CliWaveform::Sine => Waveform::Sine,
            CliWaveform::Square => Waveform::Square,
            CliWaveform::Saw => Waveform::Sawtooth,
            CliWaveform::Triangle => Waveform::Triangle,
            CliWaveform::Noise => Waveform::Noise,
        }
    }
}

/// Filter topology names for CLI arguments.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CliFilter {
    None,
    Lowpass,
    Highpass,
    Bandpass,
    Notch,
    Ladder,
}

impl From<CliFilter> for FilterType {
    fn from(f: CliFilter) -> Self {
        match f {
            CliFilter::None => FilterType::None,
            CliFilter::Lowpass => FilterType::LowPass,
            CliFilter::Highpass => FilterType::HighPass,
            CliFilter::Bandpass => FilterType::BandPass,
            CliFilter::Notch => FilterType::Notch,
            CliFilter::Ladder => FilterType::MoogLadder,
        }
    }
}

/// Voice stealing policy names for CLI arguments.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum CliSteal {
    None,
    #[default]
    Oldest,
    Quietest,
    Lowest,
    Highest,
    SameNote,
}

impl From<CliSteal> for StealMode {
    fn from(s: CliSteal) -> Self {
        match s {
            CliSteal::None => StealMode::None,
            CliSteal::Oldest => StealMode::Oldest,
            CliSteal::Quietest => StealMode::Quietest,
            CliSteal::Lowest => StealMode::Lowest,
            CliSteal::Highest => StealMode::Highest,
            CliSteal::SameNote => StealMode::SameNote,
        }
    }
}

/// Parse a comma-separated MIDI note list (e.g., "60,64,67" for C major).
///
/// Invalid tokens are skipped; an entirely invalid list is an error.
pub fn parse_notes(spec: &str) -> anyhow::Result<Vec<u8>> {
    let notes: Vec<u8> = spec
        .split(',')
        .filter_map(|s| s.trim().parse::<u8>().ok())
        .collect();

    if notes.is_empty() {
        anyhow::bail!(
            "No valid MIDI notes in '{}'. Use format: --notes \"60,64,67\"",
            spec
        );
    }

    Ok(notes)
}
