//! Audio-rate waveform generation.
//!
//! Provides the waveform math, per-slot oscillator configuration, and
//! noise source for the synthesis voices. Oscillators here are stateless
//! functions of phase: the phase accumulators themselves live in each
//! [`Voice`](crate::Voice), one per oscillator slot per unison sub-voice,
//! so a voice can run several detuned copies of the same configuration.

use core::f32::consts::{PI, TAU};
use libm::{powf, sinf};

/// Number of oscillator slots per voice.
///
/// Slot 0 is the sync master, slot 1 the sync slave.
pub const NUM_OSCILLATORS: usize = 2;

/// Oscillator waveform types
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Waveform {
    /// Sine waveform — pure fundamental tone.
    #[default]
    Sine,
    /// Square/pulse waveform — odd harmonics, duty set by pulse width.
    Square,
    /// Sawtooth waveform — all harmonics, bright timbre.
    Sawtooth,
    /// Triangle waveform — odd harmonics, softer than saw.
    Triangle,
    /// White noise from the voice-owned PRNG.
    Noise,
}

impl Waveform {
    /// Evaluate the waveform at `phase` radians in `[0, 2π)`.
    ///
    /// `pulse_width` sets the square duty cycle and is ignored by the
    /// other shapes. `noise` is the caller's PRNG state, advanced only by
    /// the noise arm so pitched waveforms stay deterministic.
    #[inline]
    pub fn sample(self, phase: f32, pulse_width: f32, noise: &mut Xorshift32) -> f32 {
        match self {
            Self::Sine => sinf(phase),

            Self::Square => {
                if pulse_width * TAU > phase {
                    1.0
                } else {
                    -1.0
                }
            }

            Self::Sawtooth => phase / PI - 1.0,

            Self::Triangle => {
                if phase < PI {
                    -1.0 + 2.0 * phase / PI
                } else {
                    3.0 - 2.0 * phase / PI
                }
            }

            Self::Noise => noise.next_bipolar(),
        }
    }
}

/// Oscillator hard/soft sync selection.
///
/// Sync couples slot 1 (slave) to slot 0 (master) inside each unison
/// sub-voice: hard sync restarts the slave's phase every master cycle,
/// soft sync bends the slave's phase rate with the master's phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncMode {
    /// Slots run free.
    #[default]
    Off,
    /// Slave phase resets to 0 when the master phase wraps.
    Hard,
    /// Slave phase increment is scaled by `1 + 0.5 * sin(master_phase)`.
    Soft,
}

/// Shared per-slot oscillator configuration.
///
/// The engine owns one of these per slot; voices read them every sample
/// and never mutate them. Pitch offsets compose multiplicatively through
/// [`frequency`](Self::frequency).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OscillatorConfig {
    /// Waveform for this slot.
    pub waveform: Waveform,
    /// Mix level (0.0 to 1.0) applied before slot normalization.
    pub level: f32,
    /// Fine detune in cents (-100 to 100).
    pub detune_cents: f32,
    /// Octave transpose (-2 to 2).
    pub octave_offset: i32,
    /// Semitone transpose (-12 to 12).
    pub semitone_offset: i32,
    /// Square duty cycle, exclusive (0, 1).
    pub pulse_width: f32,
    /// Phase in turns `[0, 1]` each trigger starts from.
    pub initial_phase: f32,
    /// Whether this slot contributes to the voice output.
    pub enabled: bool,
}

impl Default for OscillatorConfig {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            level: 1.0,
            detune_cents: 0.0,
            octave_offset: 0,
            semitone_offset: 0,
            pulse_width: 0.5,
            initial_phase: 0.0,
            enabled: true,
        }
    }
}

impl OscillatorConfig {
    /// Slot frequency in Hz for a voice at `base_frequency`.
    ///
    /// Applies octave, semitone, and cent offsets plus the per-block pitch
    /// LFO amount in semitones:
    ///
    /// ```text
    /// f = base * 2^octave * 2^(semitone/12) * 2^(cents/1200) * 2^(lfo/12)
    /// ```
    #[inline]
    pub fn frequency(&self, base_frequency: f32, pitch_lfo_semitones: f32) -> f32 {
        let exponent = self.octave_offset as f32
            + (self.semitone_offset as f32 + pitch_lfo_semitones) / 12.0
            + self.detune_cents / 1200.0;
        base_frequency * powf(2.0, exponent)
    }
}

/// Xorshift32 pseudo-random noise source.
///
/// Small, fast, and dependency-free; each voice owns one per oscillator
/// slot so noise generation never touches shared state on the audio
/// thread and test runs are reproducible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Xorshift32 {
    state: u32,
}

impl Xorshift32 {
    /// Create a generator from `seed`. A zero seed (the xorshift fixed
    /// point) is replaced with a default.
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0x12345678 } else { seed },
        }
    }

    /// Next sample in `[-1, 1]`.
    #[inline]
    pub fn next_bipolar(&mut self) -> f32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;

        (x as i32 as f32) / (i32::MAX as f32)
    }
}

/// Phase advance per sample for `frequency` at `sample_rate`, in radians.
#[inline]
pub fn phase_increment(frequency: f32, sample_rate: f32) -> f32 {
    TAU * frequency / sample_rate
}

/// Advance a radian phase accumulator, wrapping at 2π.
///
/// The wrap is a single subtraction rather than a remainder so identical
/// input sequences produce bit-identical phase trajectories.
#[inline]
pub fn advance_phase(phase: f32, increment: f32) -> f32 {
    let next = phase + increment;
    if next >= TAU { next - TAU } else { next }
}
