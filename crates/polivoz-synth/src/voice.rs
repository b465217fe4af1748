//! Voice state for polyphonic synthesis.
//!
//! A [`Voice`] is one note's live state: per-slot, per-unison-sub-voice
//! phase accumulators, an amplitude and a filter envelope, independent
//! left/right filter banks, and the note/velocity/trigger-order metadata
//! the voice pool uses for stealing. Voices are created once at pool
//! construction and only ever reset or retriggered.
//!
//! Everything a voice needs per render block arrives in a
//! [`RenderParams`] snapshot, so the pool takes one modulation sample per
//! block and every voice sees the same values for the whole block.

use core::f32::consts::{FRAC_PI_4, PI, TAU};
use libm::{powf, sincosf, sinf, sqrtf};

use crate::envelope::DahdsrEnvelope;
use crate::oscillator::{
    NUM_OSCILLATORS, OscillatorConfig, SyncMode, Xorshift32, advance_phase, phase_increment,
};
use polivoz_core::{FilterBank, FilterType};

/// Maximum number of unison sub-voices per oscillator slot.
pub const MAX_UNISON: usize = 8;

/// Base seed for the per-slot noise generators.
const NOISE_SEED: u32 = 0x12345678;

/// Per-block parameter snapshot consumed by [`Voice::process_stereo`].
///
/// The pool builds one of these per render call from its parameter block
/// and the externally supplied modulation scalars, then hands the same
/// snapshot to every voice. Modulation therefore changes at block rate,
/// never mid-block.
#[derive(Clone, Copy, Debug)]
pub struct RenderParams {
    /// Shared oscillator slot configurations.
    pub oscillators: [OscillatorConfig; NUM_OSCILLATORS],
    /// Master/slave sync coupling between slot 0 and slot 1.
    pub sync_mode: SyncMode,
    /// Number of unison sub-voices (1 to [`MAX_UNISON`]).
    pub unison_count: usize,
    /// Unison detune spread in cents.
    pub unison_spread: f32,
    /// Stereo width of the unison pan fan (0.0 mono to 1.0 full).
    pub stereo_width: f32,
    /// Filter topology for this block.
    pub filter_type: FilterType,
    /// Normalized base cutoff in `[0, 1]`.
    pub cutoff: f32,
    /// Normalized resonance in `[0, 1]`.
    pub resonance: f32,
    /// Filter envelope depth on the normalized cutoff (-1 to 1).
    pub filter_env_amount: f32,
    /// Pitch LFO amount for this block, in semitones.
    pub pitch_lfo_semitones: f32,
    /// Filter LFO offset on the normalized cutoff for this block.
    pub filter_lfo_offset: f32,
    /// Output gain applied after the envelope and velocity scaling.
    pub master_volume: f32,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            oscillators: [OscillatorConfig::default(); NUM_OSCILLATORS],
            sync_mode: SyncMode::Off,
            unison_count: 1,
            unison_spread: 0.0,
            stereo_width: 1.0,
            filter_type: FilterType::None,
            cutoff: 1.0,
            resonance: 0.0,
            filter_env_amount: 0.0,
            pitch_lfo_semitones: 0.0,
            filter_lfo_offset: 0.0,
            master_volume: 1.0,
        }
    }
}

/// A single synthesizer voice.
///
/// Owns the mutable state for one sounding note. The waveform math is
/// stateless; all audio memory lives here as phase accumulators (one per
/// oscillator slot per unison sub-voice), filter registers (independent
/// per channel), and the two envelopes.
///
/// # Example
///
/// ```rust
/// use polivoz_synth::{RenderParams, Voice};
///
/// let mut voice = Voice::new(48000.0);
/// let params = RenderParams::default();
///
/// voice.trigger(60, 100, 1, &params.oscillators);
/// for _ in 0..1000 {
///     let (left, right) = voice.process_stereo(&params);
///     assert!(left.is_finite() && right.is_finite());
/// }
/// voice.release();
/// ```
#[derive(Debug, Clone)]
pub struct Voice {
    /// Phase accumulators in radians, `[slot][unison lane]`
    phases: [[f32; MAX_UNISON]; NUM_OSCILLATORS],
    /// Noise state per oscillator slot
    noise: [Xorshift32; NUM_OSCILLATORS],
    /// Left channel filter state
    filter_left: FilterBank,
    /// Right channel filter state
    filter_right: FilterBank,
    /// Amplitude envelope
    pub amp_env: DahdsrEnvelope,
    /// Filter envelope
    pub filter_env: DahdsrEnvelope,

    /// Current MIDI note number
    note: u8,
    /// Current velocity (0-127)
    velocity: u8,
    /// Note frequency in Hz before per-slot offsets
    base_frequency: f32,
    /// Monotonic trigger stamp assigned by the pool (for stealing)
    trigger_time: u64,
    /// Whether this voice is currently in use
    active: bool,
    /// Sample rate
    sample_rate: f32,
}

impl Default for Voice {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl Voice {
    /// Create a new voice at the given sample rate.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            phases: [[0.0; MAX_UNISON]; NUM_OSCILLATORS],
            noise: core::array::from_fn(|slot| Xorshift32::new(NOISE_SEED ^ ((slot as u32) << 16))),
            filter_left: FilterBank::new(sample_rate),
            filter_right: FilterBank::new(sample_rate),
            amp_env: DahdsrEnvelope::new(),
            filter_env: DahdsrEnvelope::new(),
            note: 0,
            velocity: 0,
            base_frequency: 440.0,
            trigger_time: 0,
            active: false,
            sample_rate,
        }
    }

    /// Set sample rate for the filter banks.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.filter_left.set_sample_rate(sample_rate);
        self.filter_right.set_sample_rate(sample_rate);
    }

    /// Start (or restart) this voice on a note.
    ///
    /// Every phase lane is re-seeded from its slot's configured start
    /// phase, and both envelopes are triggered. Envelopes ramp from their
    /// current value, so retriggering or stealing a sounding voice stays
    /// click-free; filter state is likewise carried over rather than
    /// cleared. `order` is the pool's monotonic trigger stamp.
    pub fn trigger(
        &mut self,
        note: u8,
        velocity: u8,
        order: u64,
        oscillators: &[OscillatorConfig; NUM_OSCILLATORS],
    ) {
        self.note = note.min(127);
        self.velocity = velocity.min(127);
        self.base_frequency = midi_to_freq(self.note);
        self.trigger_time = order;
        self.active = true;

        for (slot, config) in oscillators.iter().enumerate() {
            let mut phase = config.initial_phase.clamp(0.0, 1.0) * TAU;
            if phase >= TAU {
                phase = 0.0;
            }
            self.phases[slot] = [phase; MAX_UNISON];
        }

        self.amp_env.trigger(self.velocity);
        self.filter_env.trigger(self.velocity);
    }

    /// Release this voice (note off).
    ///
    /// The voice remains active and audible through its release stage.
    pub fn release(&mut self) {
        self.amp_env.release();
        self.filter_env.release();
    }

    /// Force the voice silent immediately.
    pub fn kill(&mut self) {
        self.active = false;
        self.amp_env.reset();
        self.filter_env.reset();
    }

    /// Reset the voice to its initial state.
    pub fn reset(&mut self) {
        self.kill();
        self.note = 0;
        self.velocity = 0;
        self.trigger_time = 0;
        self.phases = [[0.0; MAX_UNISON]; NUM_OSCILLATORS];
        self.noise =
            core::array::from_fn(|slot| Xorshift32::new(NOISE_SEED ^ ((slot as u32) << 16)));
        self.filter_left.reset();
        self.filter_right.reset();
    }

    /// Check if the voice is currently producing sound.
    pub fn is_active(&self) -> bool {
        self.active && self.amp_env.is_active()
    }

    /// Get the current note number.
    pub fn note(&self) -> u8 {
        self.note
    }

    /// Get the current velocity.
    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    /// Get the note frequency in Hz.
    pub fn base_frequency(&self) -> f32 {
        self.base_frequency
    }

    /// Get the pool's trigger stamp for this voice.
    pub fn trigger_time(&self) -> u64 {
        self.trigger_time
    }

    /// Instantaneous loudness estimate used by quietest-voice stealing.
    pub fn loudness(&self) -> f32 {
        self.amp_env.value() * f32::from(self.velocity) / 127.0
    }

    /// Read access to the phase accumulators, `[slot][unison lane]`.
    pub fn phases(&self) -> &[[f32; MAX_UNISON]; NUM_OSCILLATORS] {
        &self.phases
    }

    /// Process one stereo sample pair.
    ///
    /// Returns `(left, right)`. Unison sub-voices are detuned and panned
    /// symmetrically around the note pitch, summed with constant-power
    /// gains, and normalized by `1/sqrt(count)`. Slot outputs are weighted
    /// by their configured levels and normalized by the total enabled
    /// level, so enabling a second slot does not double the amplitude.
    ///
    /// When the amplitude envelope completes its release the voice
    /// deactivates itself and returns silence.
    #[inline]
    pub fn process_stereo(&mut self, params: &RenderParams) -> (f32, f32) {
        if !self.is_active() {
            return (0.0, 0.0);
        }

        let dt = 1.0 / self.sample_rate;
        let amp = self.amp_env.process(dt);
        if !self.amp_env.is_active() {
            self.active = false;
            return (0.0, 0.0);
        }
        let filter_env = self.filter_env.process(dt);

        let master = &params.oscillators[0];
        let slave = &params.oscillators[1];
        let master_freq = master.frequency(self.base_frequency, params.pitch_lfo_semitones);
        let slave_freq = slave.frequency(self.base_frequency, params.pitch_lfo_semitones);

        let unison = params.unison_count.clamp(1, MAX_UNISON);
        let center = (unison - 1) as f32 * 0.5;
        let divisor = if unison > 1 { (unison - 1) as f32 } else { 1.0 };

        let mut left = 0.0_f32;
        let mut right = 0.0_f32;

        for lane in 0..unison {
            let t = (lane as f32 - center) / divisor;
            let lane_ratio = cents_to_ratio(t * params.unison_spread);

            let mut mix = 0.0_f32;
            let mut total_level = 0.0_f32;

            // Master slot
            let master_phase = self.phases[0][lane];
            let mut master_wrapped = false;
            if master.enabled {
                mix += master.waveform.sample(
                    master_phase,
                    master.pulse_width,
                    &mut self.noise[0],
                ) * master.level;
                total_level += master.level;

                let inc = phase_increment(master_freq * lane_ratio, self.sample_rate);
                let next = advance_phase(master_phase, inc);
                self.phases[0][lane] = next;
                master_wrapped = master_phase > PI && next < PI;
            }

            // Slave slot, coupled to the master by the sync mode
            if slave.enabled {
                let mut slave_phase = self.phases[1][lane];
                if params.sync_mode == SyncMode::Hard && master_wrapped {
                    slave_phase = 0.0;
                }
                mix += slave.waveform.sample(slave_phase, slave.pulse_width, &mut self.noise[1])
                    * slave.level;
                total_level += slave.level;

                let mut inc = phase_increment(slave_freq * lane_ratio, self.sample_rate);
                if params.sync_mode == SyncMode::Soft {
                    inc *= 1.0 + 0.5 * sinf(master_phase);
                }
                self.phases[1][lane] = advance_phase(slave_phase, inc);
            }

            if total_level > 0.0 {
                mix /= total_level;
            }

            // Constant-power pan: left = cos(angle), right = sin(angle)
            // where angle = (pan + 1) * pi/4 maps [-1, 1] to [0, pi/2]
            let pan = 2.0 * t * params.stereo_width;
            let (sin_a, cos_a) = sincosf((pan + 1.0) * FRAC_PI_4);
            left += mix * cos_a;
            right += mix * sin_a;
        }

        let gain_norm = 1.0 / sqrtf(unison as f32);
        left *= gain_norm;
        right *= gain_norm;

        // Filter, with envelope and LFO modulation added on the normalized
        // cutoff before the Hz mapping
        let cutoff = (params.cutoff
            + filter_env * params.filter_env_amount
            + params.filter_lfo_offset)
            .clamp(0.0, 1.0);
        left = self
            .filter_left
            .process(left, params.filter_type, cutoff, params.resonance);
        right = self
            .filter_right
            .process(right, params.filter_type, cutoff, params.resonance);

        let gain = amp * (f32::from(self.velocity) / 127.0) * params.master_volume;
        (left * gain, right * gain)
    }
}

/// Convert MIDI note number to frequency in Hz.
///
/// Uses standard tuning: A4 (note 69) = 440 Hz.
#[inline]
pub fn midi_to_freq(note: u8) -> f32 {
    440.0 * powf(2.0, (f32::from(note) - 69.0) / 12.0)
}

/// Convert cents to frequency ratio.
///
/// 100 cents = 1 semitone.
#[inline]
pub fn cents_to_ratio(cents: f32) -> f32 {
    powf(2.0, cents / 1200.0)
}
