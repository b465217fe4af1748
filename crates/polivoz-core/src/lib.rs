//! Polivoz Core - DSP primitives for the polivoz synthesis engine
//!
//! This crate provides the per-voice filter bank and supporting DSP building
//! blocks, designed for real-time audio with zero allocation in the audio path.
//!
//! # Filter Bank
//!
//! Every synthesizer voice owns one [`FilterBank`] per output channel and
//! selects a topology per render call via [`FilterType`]:
//!
//! - [`OnePoleLowPass`] / [`OnePoleHighPass`] - 6 dB/oct RC filters
//! - [`Biquad`] - Direct Form I second-order section with RBJ bandpass/notch
//!   coefficient functions
//! - [`MoogLadder`] - 4-pole nonlinear ladder lowpass
//!
//! Cutoff is a normalized `[0, 1]` control mapped logarithmically over
//! 20 Hz - 20 kHz by [`cutoff_to_hz`], with a Nyquist guard at 45% of the
//! sample rate.
//!
//! # Modulation
//!
//! - [`Lfo`] - low-frequency oscillator used by hosts to derive the per-block
//!   modulation scalars the synthesis engine consumes
//!
//! # Utilities
//!
//! - Math helpers: [`soft_clip`], [`lerp`], [`db_to_linear`],
//!   [`flush_denormal`], etc.
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible for embedded targets. Disable the
//! default `std` feature:
//!
//! ```toml
//! [dependencies]
//! polivoz-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use polivoz_core::{FilterBank, FilterType};
//!
//! let mut filter = FilterBank::new(48000.0);
//! let out = filter.process(0.5, FilterType::LowPass, 0.6, 0.2);
//! assert!(out.is_finite());
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: no allocations in processing paths
//! - **No dependencies on std**: pure `no_std` with `libm` for math
//! - **Closed dispatch**: filter and waveform selection are fixed enums
//!   matched in pure functions, never trait objects

#![cfg_attr(not(feature = "std"), no_std)]

pub mod biquad;
pub mod filter;
pub mod ladder;
pub mod lfo;
pub mod math;
pub mod one_pole;

// Re-export main types at crate root
pub use biquad::{Biquad, bandpass_coefficients, notch_coefficients};
pub use filter::{FilterBank, FilterType, cutoff_to_hz};
pub use ladder::MoogLadder;
pub use lfo::{Lfo, LfoWaveform};
pub use math::{db_to_linear, flush_denormal, lerp, linear_to_db, soft_clip};
pub use one_pole::{OnePoleHighPass, OnePoleLowPass};
