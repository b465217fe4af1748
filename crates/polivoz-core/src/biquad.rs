//! Biquad (bi-quadratic) filter section.
//!
//! A generic second-order IIR filter used by the voice filter bank for its
//! bandpass and notch topologies. Coefficient calculation follows the RBJ
//! Audio EQ Cookbook, driven by a normalized resonance control instead of a
//! raw Q factor:
//!
//! ```text
//! w0    = 2π * freq / sample_rate
//! alpha = sin(w0) / (2 * (1 - resonance * 0.9 + 0.1))
//! ```
//!
//! The resonance mapping is inherited from the engine's original tuning and
//! is part of its sound; it is deliberately not the textbook `1/(2Q)` form.

use core::f32::consts::PI;
use libm::{cosf, sinf};

/// Generic biquad filter coefficients and state.
///
/// Implements the Direct Form I structure:
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
///                - a1*y[n-1] - a2*y[n-2]
/// ```
#[derive(Debug, Clone)]
pub struct Biquad {
    /// Feedforward coefficients
    b0: f32,
    b1: f32,
    b2: f32,

    /// Feedback coefficients (normalized by a0)
    a1: f32,
    a2: f32,

    /// Input delay line: x[n-1], x[n-2]
    x1: f32,
    x2: f32,

    /// Output delay line: y[n-1], y[n-2]
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Creates a new biquad with passthrough coefficients.
    ///
    /// Initial state: `y[n] = x[n]` (no filtering)
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Sets the biquad coefficients.
    ///
    /// # Arguments
    ///
    /// * `b0, b1, b2` - Feedforward coefficients
    /// * `a0, a1, a2` - Feedback coefficients
    ///
    /// Note: This function normalizes by a0 internally.
    pub fn set_coefficients(&mut self, b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) {
        // Normalize by a0
        let a0_inv = 1.0 / a0;
        self.b0 = b0 * a0_inv;
        self.b1 = b1 * a0_inv;
        self.b2 = b2 * a0_inv;
        self.a1 = a1 * a0_inv;
        self.a2 = a2 * a0_inv;
    }

    /// Processes a single sample through the biquad filter.
    ///
    /// Uses Direct Form I structure for numerical stability.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        // Update delay lines
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    /// Clears the filter state (delay lines).
    ///
    /// Useful for resetting the filter without changing coefficients.
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

fn resonance_alpha(sin_omega: f32, resonance: f32) -> f32 {
    sin_omega / (2.0 * (1.0 - resonance * 0.9 + 0.1))
}

/// Calculates band-pass filter coefficients (RBJ, constant skirt gain).
///
/// Peak gain tracks the effective Q; the skirt stays put as resonance moves.
///
/// # Arguments
///
/// * `frequency` - Center frequency in Hz
/// * `resonance` - Normalized resonance in \[0.0, 1.0\]
/// * `sample_rate` - Sample rate in Hz
///
/// # Returns
///
/// (b0, b1, b2, a0, a1, a2) coefficients
pub fn bandpass_coefficients(
    frequency: f32,
    resonance: f32,
    sample_rate: f32,
) -> (f32, f32, f32, f32, f32, f32) {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let sin_omega = sinf(omega);
    let alpha = resonance_alpha(sin_omega, resonance);

    let b0 = sin_omega / 2.0;
    let b1 = 0.0;
    let b2 = -sin_omega / 2.0;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha;

    (b0, b1, b2, a0, a1, a2)
}

/// Calculates notch (band-reject) filter coefficients (RBJ).
///
/// # Arguments
///
/// * `frequency` - Notch frequency in Hz
/// * `resonance` - Normalized resonance in \[0.0, 1.0\]
/// * `sample_rate` - Sample rate in Hz
///
/// # Returns
///
/// (b0, b1, b2, a0, a1, a2) coefficients
pub fn notch_coefficients(
    frequency: f32,
    resonance: f32,
    sample_rate: f32,
) -> (f32, f32, f32, f32, f32, f32) {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let sin_omega = sinf(omega);
    let alpha = resonance_alpha(sin_omega, resonance);

    let b0 = 1.0;
    let b1 = -2.0 * cos_omega;
    let b2 = 1.0;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha;

    (b0, b1, b2, a0, a1, a2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_biquad_passthrough() {
        let mut biquad = Biquad::new();

        // Default coefficients should pass signal through
        for i in 0..10 {
            let input = i as f32 * 0.1;
            let output = biquad.process(input);
            assert!((output - input).abs() < 0.0001);
        }
    }

    #[test]
    fn test_biquad_clear() {
        let mut biquad = Biquad::new();

        // Process some samples to fill state
        for _ in 0..10 {
            biquad.process(1.0);
        }

        biquad.clear();

        assert_eq!(biquad.x1, 0.0);
        assert_eq!(biquad.x2, 0.0);
        assert_eq!(biquad.y1, 0.0);
        assert_eq!(biquad.y2, 0.0);
    }

    #[test]
    fn test_bandpass_coefficients_finite() {
        for resonance in [0.0, 0.5, 1.0] {
            let (b0, b1, b2, a0, a1, a2) = bandpass_coefficients(1000.0, resonance, 44100.0);
            for c in [b0, b1, b2, a0, a1, a2] {
                assert!(c.is_finite(), "non-finite coefficient at res={resonance}");
            }
            assert!(a0 > 0.0);
        }
    }

    #[test]
    fn test_notch_coefficients_finite() {
        for resonance in [0.0, 0.5, 1.0] {
            let (b0, b1, b2, a0, a1, a2) = notch_coefficients(1000.0, resonance, 44100.0);
            for c in [b0, b1, b2, a0, a1, a2] {
                assert!(c.is_finite(), "non-finite coefficient at res={resonance}");
            }
            assert!(a0 > 0.0);
        }
    }

    #[test]
    fn test_bandpass_rejects_dc() {
        let mut biquad = Biquad::new();
        let (b0, b1, b2, a0, a1, a2) = bandpass_coefficients(1000.0, 0.5, 44100.0);
        biquad.set_coefficients(b0, b1, b2, a0, a1, a2);

        let mut output = 1.0;
        for _ in 0..2000 {
            output = biquad.process(1.0);
        }

        // Bandpass has a zero at DC
        assert!(output.abs() < 0.01, "DC should be rejected, got {output}");
    }

    #[test]
    fn test_notch_passes_dc() {
        let mut biquad = Biquad::new();
        let (b0, b1, b2, a0, a1, a2) = notch_coefficients(1000.0, 0.5, 44100.0);
        biquad.set_coefficients(b0, b1, b2, a0, a1, a2);

        let mut output = 0.0;
        for _ in 0..2000 {
            output = biquad.process(1.0);
        }

        // DC sits far below the notch and passes at unity
        assert!((output - 1.0).abs() < 0.05, "DC should pass, got {output}");
    }

    #[test]
    fn test_notch_kills_center_frequency() {
        let sample_rate = 44100.0;
        let freq = 1000.0;
        let mut biquad = Biquad::new();
        let (b0, b1, b2, a0, a1, a2) = notch_coefficients(freq, 0.5, sample_rate);
        biquad.set_coefficients(b0, b1, b2, a0, a1, a2);

        // Drive with a sine at the notch frequency, measure settled amplitude
        let mut peak = 0.0f32;
        for n in 0..44100 {
            let x = libm::sinf(2.0 * PI * freq * n as f32 / sample_rate);
            let y = biquad.process(x);
            if n > 22050 {
                peak = peak.max(y.abs());
            }
        }
        assert!(peak < 0.05, "notch center should be suppressed, peak {peak}");
    }
}
