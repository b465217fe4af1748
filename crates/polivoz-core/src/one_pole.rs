//! One-pole lowpass and highpass filters.
//!
//! Single-pole IIR filters derived from the analog RC network. Both share
//! the coefficient:
//!
//! ```text
//! rc = 1 / (2π * freq)
//! a  = dt / (rc + dt)        where dt = 1 / sample_rate
//! ```
//!
//! Lowpass difference equation:
//!
//! ```text
//! y[n] = y[n-1] + a * (x[n] - y[n-1])
//! ```
//!
//! Highpass difference equation:
//!
//! ```text
//! y[n] = a * (y[n-1] + x[n] - x[n-1])
//! ```
//!
//! These are the cheapest topologies in the filter bank — 6 dB/octave,
//! one multiply per sample, unconditionally stable since `a` is in (0, 1).
//!
//! # Usage
//!
//! ```rust
//! use polivoz_core::OnePoleLowPass;
//!
//! let mut lp = OnePoleLowPass::new(48000.0, 4000.0);
//! let filtered = lp.process(1.0);
//! assert!(filtered < 1.0); // attenuated above cutoff
//! ```

use crate::flush_denormal;
use core::f32::consts::TAU;

/// Minimum cutoff in Hz. Keeps `rc` finite when a host hands in zero.
const MIN_FREQ_HZ: f32 = 20.0;

fn rc_coefficient(freq_hz: f32, sample_rate: f32) -> f32 {
    let rc = 1.0 / (TAU * freq_hz.max(MIN_FREQ_HZ));
    let dt = 1.0 / sample_rate;
    dt / (rc + dt)
}

/// One-pole (6 dB/oct) lowpass filter.
///
/// # Invariants
///
/// - `coeff` is always in (0, 1) for stable operation
/// - `state` is flushed to zero when below 1e-20 (denormal protection)
#[derive(Debug, Clone)]
pub struct OnePoleLowPass {
    state: f32,
    coeff: f32,
    sample_rate: f32,
    freq: f32,
}

impl OnePoleLowPass {
    /// Create a new one-pole lowpass filter.
    ///
    /// # Arguments
    ///
    /// * `sample_rate` - Sample rate in Hz
    /// * `freq_hz` - Cutoff frequency in Hz (20.0 to sample_rate/2)
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        let mut filter = Self {
            state: 0.0,
            coeff: 0.0,
            sample_rate,
            freq: freq_hz,
        };
        filter.recalculate_coeff();
        filter
    }

    /// Set the cutoff frequency and recalculate the coefficient.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.freq = freq_hz;
        self.recalculate_coeff();
    }

    /// Process one sample through the lowpass filter.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        // y[n] = y[n-1] + a * (x[n] - y[n-1])
        self.state = flush_denormal(self.state + self.coeff * (input - self.state));
        self.state
    }

    /// Reset filter state to zero.
    pub fn reset(&mut self) {
        self.state = 0.0;
    }

    /// Update sample rate and recalculate the coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    fn recalculate_coeff(&mut self) {
        self.coeff = rc_coefficient(self.freq, self.sample_rate);
    }
}

/// One-pole (6 dB/oct) highpass filter.
///
/// Shares the RC coefficient with [`OnePoleLowPass`] and additionally keeps
/// the previous input sample for its differentiating term.
#[derive(Debug, Clone)]
pub struct OnePoleHighPass {
    state: f32,
    prev_input: f32,
    coeff: f32,
    sample_rate: f32,
    freq: f32,
}

impl OnePoleHighPass {
    /// Create a new one-pole highpass filter.
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        let mut filter = Self {
            state: 0.0,
            prev_input: 0.0,
            coeff: 0.0,
            sample_rate,
            freq: freq_hz,
        };
        filter.recalculate_coeff();
        filter
    }

    /// Set the cutoff frequency and recalculate the coefficient.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.freq = freq_hz;
        self.recalculate_coeff();
    }

    /// Process one sample through the highpass filter.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        // y[n] = a * (y[n-1] + x[n] - x[n-1])
        self.state = flush_denormal(self.coeff * (self.state + input - self.prev_input));
        self.prev_input = input;
        self.state
    }

    /// Reset filter state to zero.
    pub fn reset(&mut self) {
        self.state = 0.0;
        self.prev_input = 0.0;
    }

    /// Update sample rate and recalculate the coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    fn recalculate_coeff(&mut self) {
        self.coeff = rc_coefficient(self.freq, self.sample_rate);
    }
}
