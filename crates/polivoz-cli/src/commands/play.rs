//! Real-time playback command.

use crate::commands::{CliFilter, CliSteal, CliWaveform, VOICES, parse_notes};
use crate::patch::Patch;
use clap::Args;
use polivoz_core::Lfo;
use polivoz_io::{AudioStream, StreamConfig, find_output_device};
use polivoz_synth::SynthEngine;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Args)]
pub struct PlayArgs {
    /// MIDI notes (comma-separated, e.g., "60,64,67" for C major)
    #[arg(long)]
    notes: String,

    /// Patch file (TOML)
    #[arg(short, long)]
    patch: Option<PathBuf>,

    /// Hold the notes for this many seconds, then stop (default: until Ctrl+C)
    #[arg(long)]
    duration: Option<f32>,

    /// Time to let the release envelope ring out after stopping, in seconds
    #[arg(long, default_value = "1.0")]
    release_tail: f32,

    /// Output device name or index (uses default if omitted)
    #[arg(long)]
    output_device: Option<String>,

    /// Buffer size in frames
    #[arg(long, default_value = "256")]
    buffer_size: u32,

    /// Note velocity (0-127)
    #[arg(long, default_value = "100")]
    velocity: u8,

    /// Oscillator waveform
    #[arg(long, value_enum, default_value = "saw")]
    waveform: CliWaveform,

    /// Filter topology (overrides the patch)
    #[arg(long, value_enum)]
    filter: Option<CliFilter>,

    /// Voice stealing policy
    #[arg(long, value_enum, default_value = "oldest")]
    steal: CliSteal,

    /// Vibrato LFO rate in Hz
    #[arg(long, default_value = "5.0")]
    vibrato_rate: f32,
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let notes = parse_notes(&args.notes)?;

    // Resolve --output-device up front so a bad name or index fails with
    // the lookup error instead of a stream setup error
    let output_device = match &args.output_device {
        Some(spec) => {
            let device = find_output_device(spec)?;
            println!("Using output device: {}", device.name);
            Some(device.name)
        }
        None => None,
    };

    let config = StreamConfig {
        buffer_size: args.buffer_size,
        output_device,
        ..StreamConfig::default()
    };
    let mut stream = AudioStream::new(config)?;

    // The engine must run at the device rate, not the requested one
    let sample_rate = stream.device_sample_rate() as f32;
    let channels = stream.output_channels() as usize;

    let engine: Arc<SynthEngine<VOICES>> = Arc::new(SynthEngine::new(sample_rate));
    engine.set_waveform(0, args.waveform.into());
    engine.set_steal_mode(args.steal.into());

    if let Some(path) = &args.patch {
        let patch = Patch::load(path)?;
        println!("Loading patch: {}", patch.name);
        tracing::info!(
            patch = %patch.name,
            parameters = patch.parameters.len(),
            "applying patch"
        );
        patch.apply(&engine);
    }
    if let Some(filter) = args.filter {
        engine.set_filter_type(filter.into());
    }

    for &note in &notes {
        engine.note_on(note, args.velocity);
    }

    tracing::info!(
        notes = ?notes,
        sample_rate,
        channels,
        buffer_size = args.buffer_size,
        "starting realtime playback"
    );

    println!("Playing notes {:?} at {} Hz", notes, sample_rate);
    match args.duration {
        Some(d) => println!("  Holding for {:.2}s...", d),
        None => println!("  Press Ctrl+C to stop..."),
    }

    // Ctrl+C releases the notes; the callback counts the tail down and
    // then flips the run flag off
    let stopping = Arc::new(AtomicBool::new(false));
    {
        let engine = Arc::clone(&engine);
        let stopping = Arc::clone(&stopping);
        ctrlc::set_handler(move || {
            println!("\nReleasing...");
            engine.all_notes_off();
            stopping.store(true, Ordering::SeqCst);
        })?;
    }

    // Timed playback releases on a watchdog thread instead
    if let Some(duration) = args.duration {
        let engine = Arc::clone(&engine);
        let stopping = Arc::clone(&stopping);
        std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_secs_f32(duration));
            engine.all_notes_off();
            stopping.store(true, Ordering::SeqCst);
        });
    }

    let run_flag = stream.stop_handle();
    let callback_engine = Arc::clone(&engine);

    // One LFO sample per callback, so the LFO runs at callback rate
    let mut lfo = Lfo::new(sample_rate / args.buffer_size as f32, args.vibrato_rate);
    let mut tail_frames = (args.release_tail * sample_rate) as usize;
    let mut scratch: Vec<f32> = Vec::new();

    stream.run_output(move |data| {
        let frames = data.len() / channels.max(1);

        callback_engine.set_modulation(lfo.next(), 0.0);

        if channels == 2 {
            callback_engine.render(data, 0, frames);
        } else {
            // Render stereo, then fold into the device layout
            scratch.resize(frames * 2, 0.0);
            callback_engine.render(&mut scratch, 0, frames);
            for (i, chunk) in data.chunks_mut(channels).enumerate() {
                let left = scratch[i * 2];
                let right = scratch[i * 2 + 1];
                if channels == 1 {
                    chunk[0] = (left + right) * 0.5;
                } else {
                    chunk[0] = left;
                    chunk[1] = right;
                    for extra in chunk.iter_mut().skip(2) {
                        *extra = 0.0;
                    }
                }
            }
        }

        if stopping.load(Ordering::SeqCst) {
            if tail_frames <= frames {
                run_flag.store(false, Ordering::SeqCst);
            } else {
                tail_frames -= frames;
            }
        }
    })?;

    println!("Done!");
    Ok(())
}
