//! Offline render command.

use crate::commands::{CliFilter, CliSteal, CliWaveform, VOICES, parse_notes};
use crate::patch::Patch;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use polivoz_core::Lfo;
use polivoz_io::{WavSpec, write_wav};
use polivoz_synth::SynthEngine;
use std::path::PathBuf;

/// Frames rendered per block; also the modulation update interval.
const BLOCK_FRAMES: usize = 256;

#[derive(Args)]
pub struct RenderArgs {
    /// Output WAV file
    #[arg(short, long)]
    output: PathBuf,

    /// MIDI notes (comma-separated, e.g., "60,64,67" for C major)
    #[arg(long)]
    notes: String,

    /// Patch file (TOML)
    #[arg(short, long)]
    patch: Option<PathBuf>,

    /// Gate duration in seconds (notes held before release)
    #[arg(long, default_value = "2.0")]
    duration: f32,

    /// Extra time after release in seconds (captures the release envelope)
    #[arg(long, default_value = "1.0")]
    release_tail: f32,

    /// Stagger note starts by this many seconds (arpeggio)
    #[arg(long)]
    arp_interval: Option<f32>,

    /// Sample rate
    #[arg(long, default_value = "48000")]
    sample_rate: u32,

    /// Note velocity (0-127)
    #[arg(long, default_value = "100")]
    velocity: u8,

    /// Oscillator waveform
    #[arg(long, value_enum, default_value = "saw")]
    waveform: CliWaveform,

    /// Filter topology (overrides the patch)
    #[arg(long, value_enum)]
    filter: Option<CliFilter>,

    /// Normalized filter cutoff, 0-1 (overrides the patch)
    #[arg(long)]
    cutoff: Option<f32>,

    /// Voice stealing policy
    #[arg(long, value_enum, default_value = "oldest")]
    steal: CliSteal,

    /// Vibrato LFO rate in Hz
    #[arg(long, default_value = "5.0")]
    vibrato_rate: f32,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let notes = parse_notes(&args.notes)?;
    let sample_rate = args.sample_rate as f32;

    let engine: SynthEngine<VOICES> = SynthEngine::new(sample_rate);
    engine.set_waveform(0, args.waveform.into());
    engine.set_steal_mode(args.steal.into());

    if let Some(path) = &args.patch {
        let patch = Patch::load(path)?;
        println!("Loading patch: {}", patch.name);
        if let Some(desc) = &patch.description {
            println!("  {}", desc);
        }
        tracing::info!(
            patch = %patch.name,
            parameters = patch.parameters.len(),
            "applying patch"
        );
        patch.apply(&engine);
    }

    // Explicit flags win over the patch
    if let Some(filter) = args.filter {
        engine.set_filter_type(filter.into());
    }
    if let Some(cutoff) = args.cutoff {
        engine.set_parameter("cutoff", cutoff);
    }

    let gate_frames = (args.duration * sample_rate) as usize;

    // Note start frames: all at zero, or staggered for an arpeggio.
    // Starts past the gate would never be released, so they are dropped.
    let note_starts: Vec<(usize, u8)> = notes
        .iter()
        .enumerate()
        .map(|(i, &note)| {
            let start = args
                .arp_interval
                .map_or(0, |interval| (interval * i as f32 * sample_rate) as usize);
            (start, note)
        })
        .filter(|&(start, _)| start < gate_frames)
        .collect();
    let total_frames = gate_frames + (args.release_tail * sample_rate) as usize;

    tracing::info!(
        notes = ?notes,
        gate_seconds = args.duration,
        tail_seconds = args.release_tail,
        sample_rate = args.sample_rate,
        "starting offline render"
    );

    println!("Rendering {} notes: {:?}", notes.len(), notes);
    println!(
        "  {:.2}s gate + {:.2}s tail at {} Hz",
        args.duration, args.release_tail, args.sample_rate
    );

    // The vibrato LFO runs at block rate, one sample per rendered block
    let mut lfo = Lfo::new(sample_rate / BLOCK_FRAMES as f32, args.vibrato_rate);

    let pb = ProgressBar::new(total_frames as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap()
            .progress_chars("##-"),
    );

    let mut samples = vec![0.0_f32; total_frames * 2];
    let mut released = false;
    let mut frame = 0;

    while frame < total_frames {
        let block = BLOCK_FRAMES.min(total_frames - frame);

        // Note events quantized to block boundaries
        for &(start, note) in &note_starts {
            if start >= frame && start < frame + block {
                engine.note_on(note, args.velocity);
            }
        }
        if !released && frame + block >= gate_frames {
            engine.all_notes_off();
            released = true;
        }

        engine.set_modulation(lfo.next(), 0.0);
        engine.render(&mut samples, frame * 2, block);

        frame += block;
        pb.set_position(frame as u64);
    }
    pb.finish();

    let spec = WavSpec {
        channels: 2,
        sample_rate: args.sample_rate,
        bits_per_sample: 32,
    };
    write_wav(&args.output, &samples, spec)?;
    println!(
        "Wrote {} frames to {}",
        total_frames,
        args.output.display()
    );

    Ok(())
}
