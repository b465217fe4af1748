//! Moog-style 4-pole ladder lowpass filter.
//!
//! A nonlinear approximation of the classic transistor ladder, in the
//! Stilson/Smith formulation: four chained one-pole stages with a global
//! resonance feedback tap from the last stage back to the input.
//!
//! ```text
//! f  = 1.16 * cutoff / sample_rate
//! fb = resonance * 4 * (1 - 0.15 * f²)
//!
//! in   = x - fb * stage4
//! in  *= 0.35013 * f⁴
//! out1 = in   + 0.3 * in1 + (1 - f) * out1;   in1 = in
//! out2 = out1 + 0.3 * in2 + (1 - f) * out2;   in2 = out1
//! out3 = out2 + 0.3 * in3 + (1 - f) * out3;   in3 = out2
//! out4 = out3 + 0.3 * in4 + (1 - f) * out4;   in4 = out3
//! ```
//!
//! Output is the fourth stage (24 dB/octave). At high resonance the loop
//! self-oscillates, which is the expected analog-style behavior, and the
//! `0.15 f²` term keeps the feedback gain tame near Nyquist.
//!
//! # Reference
//!
//! Stilson & Smith, "Analyzing the Moog VCF with Considerations for
//! Digital Implementation", CCRMA.

use crate::flush_denormal;

/// 4-stage nonlinear ladder lowpass.
///
/// Each stage keeps its previous input alongside its output, so the full
/// state is eight registers plus the derived `f`/`fb` coefficients.
#[derive(Debug, Clone)]
pub struct MoogLadder {
    sample_rate: f32,
    cutoff_hz: f32,
    resonance: f32,
    /// Normalized, pre-warped frequency coefficient
    f: f32,
    /// Resonance feedback gain
    fb: f32,
    /// Stage outputs out1..out4
    stages: [f32; 4],
    /// Stage input memories in1..in4
    inputs: [f32; 4],
}

impl MoogLadder {
    /// Create a new ladder filter.
    ///
    /// # Arguments
    ///
    /// * `sample_rate` - Sample rate in Hz
    pub fn new(sample_rate: f32) -> Self {
        let mut filter = Self {
            sample_rate,
            cutoff_hz: 1000.0,
            resonance: 0.0,
            f: 0.0,
            fb: 0.0,
            stages: [0.0; 4],
            inputs: [0.0; 4],
        };
        filter.recalculate();
        filter
    }

    /// Set the cutoff frequency in Hz.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.cutoff_hz = freq_hz.max(0.0);
        self.recalculate();
    }

    /// Set resonance in [0.0, 1.0]. Values near 1.0 self-oscillate.
    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance = resonance.clamp(0.0, 1.0);
        self.recalculate();
    }

    /// Update sample rate and recalculate coefficients.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate();
    }

    /// Process one sample. Output is the fourth ladder stage.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let scale = 0.35013 * self.f * self.f * self.f * self.f;
        let one_minus_f = 1.0 - self.f;

        let mut stage_in = (input - self.fb * self.stages[3]) * scale;
        for i in 0..4 {
            let out = stage_in + 0.3 * self.inputs[i] + one_minus_f * self.stages[i];
            self.inputs[i] = stage_in;
            self.stages[i] = flush_denormal(out);
            stage_in = out;
        }

        self.stages[3]
    }

    /// Reset all stage registers to zero.
    pub fn reset(&mut self) {
        self.stages = [0.0; 4];
        self.inputs = [0.0; 4];
    }

    fn recalculate(&mut self) {
        let fc = self.cutoff_hz / self.sample_rate;
        self.f = 1.16 * fc;
        self.fb = self.resonance * 4.0 * (1.0 - 0.15 * self.f * self.f);
    }
}
