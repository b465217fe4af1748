//! Polivoz Synth - polyphonic synthesis core for the polivoz engine
//!
//! This crate turns note events and parameter edits into interleaved
//! floating-point audio. It provides the four pieces every synthesizer in
//! the engine is built from: the DAHDSR envelope state machine, per-voice
//! oscillator generation, voice state, and the voice pool with its
//! polyphony and stealing policy.
//!
//! # Core Components
//!
//! ## Envelopes
//!
//! - [`DahdsrEnvelope`] - Delay-Attack-Hold-Decay-Sustain-Release
//!   generator with per-ramp [`CurveType`] shapes
//! - [`EnvelopeStage`] - stage tracking
//!
//! ```rust
//! use polivoz_synth::{DahdsrEnvelope, EnvelopeStage};
//!
//! let mut env = DahdsrEnvelope::new();
//! env.set_attack(0.01);
//! env.set_sustain(0.7);
//!
//! env.trigger(127);
//! let level = env.process(1.0 / 48000.0);
//! assert!((0.0..=1.0).contains(&level));
//! ```
//!
//! ## Oscillators
//!
//! Stateless waveform math over phase accumulators owned by each voice:
//!
//! - [`Waveform`] - Sine, Square, Sawtooth, Triangle, Noise
//! - [`OscillatorConfig`] - per-slot level, detune, transpose, pulse
//!   width, start phase
//! - [`SyncMode`] - hard/soft master-slave sync
//! - [`Xorshift32`] - per-voice noise source
//!
//! ## Voices
//!
//! - [`Voice`] - one note's live state: phase lanes per unison sub-voice,
//!   stereo filter banks, amplitude and filter envelopes
//! - [`RenderParams`] - the per-block parameter snapshot voices consume
//!
//! ## Voice Pool / Engine
//!
//! - [`VoicePool`] - fixed voice array, note map, [`StealMode`] policy,
//!   block render and mix
//! - [`SynthEngine`] - mutex-wrapped pool with the public
//!   note-on/note-off/set-parameter/render surface (requires `std`)
//!
//! # no_std Support
//!
//! The pool and everything below it are `no_std` compatible. Disable the
//! default `std` feature:
//!
//! ```toml
//! [dependencies]
//! polivoz-synth = { version = "0.1", default-features = false }
//! ```
//!
//! # Example: rendering a chord
//!
//! ```rust
//! use polivoz_synth::{StealMode, SynthEngine, Waveform};
//!
//! let engine: SynthEngine<16> = SynthEngine::new(48000.0);
//! engine.set_steal_mode(StealMode::Oldest);
//! engine.set_waveform(0, Waveform::Sawtooth);
//! engine.set_parameter("cutoff", 0.7);
//!
//! engine.note_on(60, 100); // C4
//! engine.note_on(64, 100); // E4
//! engine.note_on(67, 100); // G4
//!
//! // Interleaved stereo output
//! let mut buffer = vec![0.0_f32; 2048];
//! let frames = engine.render(&mut buffer, 0, 1024);
//! assert_eq!(frames, 1024);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod engine;
pub mod envelope;
pub mod oscillator;
pub mod voice;

// Re-export main types at crate root
#[cfg(feature = "std")]
pub use engine::SynthEngine;
pub use engine::{StealMode, VoicePool};
pub use envelope::{CurveType, DahdsrEnvelope, EnvelopeStage, MIN_RAMP_SECONDS};
pub use oscillator::{
    NUM_OSCILLATORS, OscillatorConfig, SyncMode, Waveform, Xorshift32, advance_phase,
    phase_increment,
};
pub use voice::{MAX_UNISON, RenderParams, Voice, cents_to_ratio, midi_to_freq};

// Re-export commonly used types from polivoz-core
pub use polivoz_core::{FilterBank, FilterType, Lfo, LfoWaveform};
