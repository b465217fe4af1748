//! Per-voice filter bank.
//!
//! Bundles every filter topology a synthesizer voice can select into one
//! struct with one state set per topology, dispatched per sample on a
//! closed [`FilterType`] enum. Keeping all states resident lets the host
//! switch topologies between render calls without reallocating or
//! re-priming, at the cost of a few idle registers.
//!
//! Cutoff arrives as a normalized `[0, 1]` control and is mapped to Hz on a
//! log scale spanning 20 Hz - 20 kHz:
//!
//! ```text
//! freq = 20 * 1000^cutoff
//! ```
//!
//! then clamped to 45% of the sample rate so coefficient math stays away
//! from the Nyquist singularity at any supported rate.

use crate::biquad::{Biquad, bandpass_coefficients, notch_coefficients};
use crate::ladder::MoogLadder;
use crate::one_pole::{OnePoleHighPass, OnePoleLowPass};
use libm::powf;

/// Filter topology selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilterType {
    /// Pass-through, no filtering
    #[default]
    None,
    /// One-pole 6 dB/oct lowpass
    LowPass,
    /// One-pole 6 dB/oct highpass
    HighPass,
    /// Two-pole RBJ bandpass (constant skirt)
    BandPass,
    /// Two-pole RBJ notch
    Notch,
    /// 4-pole nonlinear ladder lowpass
    MoogLadder,
}

impl FilterType {
    /// Map a parameter value to a topology. Out-of-range values saturate.
    pub fn from_index(index: u32) -> Self {
        match index {
            0 => Self::None,
            1 => Self::LowPass,
            2 => Self::HighPass,
            3 => Self::BandPass,
            4 => Self::Notch,
            _ => Self::MoogLadder,
        }
    }
}

/// Map a normalized cutoff control to Hz.
///
/// Input is clamped to `[0, 1]`, the log mapping spans 20 Hz - 20 kHz, and
/// the result is limited to `0.45 * sample_rate`.
#[inline]
pub fn cutoff_to_hz(cutoff: f32, sample_rate: f32) -> f32 {
    let freq = 20.0 * powf(1000.0, cutoff.clamp(0.0, 1.0));
    freq.min(0.45 * sample_rate)
}

/// All filter topologies for one audio channel of one voice.
///
/// Coefficients are recomputed every `process` call from the incoming
/// normalized cutoff, because the cutoff is envelope- and LFO-modulated
/// per sample upstream.
#[derive(Debug, Clone)]
pub struct FilterBank {
    sample_rate: f32,
    low: OnePoleLowPass,
    high: OnePoleHighPass,
    biquad: Biquad,
    ladder: MoogLadder,
}

impl FilterBank {
    /// Create a filter bank for the given sample rate.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            low: OnePoleLowPass::new(sample_rate, 1000.0),
            high: OnePoleHighPass::new(sample_rate, 1000.0),
            biquad: Biquad::new(),
            ladder: MoogLadder::new(sample_rate),
        }
    }

    /// Process one sample through the selected topology.
    ///
    /// # Arguments
    ///
    /// * `input` - Input sample
    /// * `filter_type` - Topology for this call
    /// * `cutoff` - Normalized cutoff in `[0, 1]` (clamped internally)
    /// * `resonance` - Normalized resonance in `[0, 1]`
    #[inline]
    pub fn process(
        &mut self,
        input: f32,
        filter_type: FilterType,
        cutoff: f32,
        resonance: f32,
    ) -> f32 {
        match filter_type {
            FilterType::None => input,
            FilterType::LowPass => {
                self.low.set_frequency(cutoff_to_hz(cutoff, self.sample_rate));
                self.low.process(input)
            }
            FilterType::HighPass => {
                self.high.set_frequency(cutoff_to_hz(cutoff, self.sample_rate));
                self.high.process(input)
            }
            FilterType::BandPass => {
                let freq = cutoff_to_hz(cutoff, self.sample_rate);
                let (b0, b1, b2, a0, a1, a2) =
                    bandpass_coefficients(freq, resonance, self.sample_rate);
                self.biquad.set_coefficients(b0, b1, b2, a0, a1, a2);
                self.biquad.process(input)
            }
            FilterType::Notch => {
                let freq = cutoff_to_hz(cutoff, self.sample_rate);
                let (b0, b1, b2, a0, a1, a2) =
                    notch_coefficients(freq, resonance, self.sample_rate);
                self.biquad.set_coefficients(b0, b1, b2, a0, a1, a2);
                self.biquad.process(input)
            }
            FilterType::MoogLadder => {
                self.ladder.set_frequency(cutoff_to_hz(cutoff, self.sample_rate));
                self.ladder.set_resonance(resonance);
                self.ladder.process(input)
            }
        }
    }

    /// Clear every topology's state.
    pub fn reset(&mut self) {
        self.low.reset();
        self.high.reset();
        self.biquad.clear();
        self.ladder.reset();
    }

    /// Update sample rate across all topologies.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.low.set_sample_rate(sample_rate);
        self.high.set_sample_rate(sample_rate);
        self.ladder.set_sample_rate(sample_rate);
    }
}
