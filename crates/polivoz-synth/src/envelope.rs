//! DAHDSR envelope generator for synthesis.
//!
//! Provides delay-attack-hold-decay-sustain-release envelopes with
//! selectable curve shapes for amplitude and filter modulation.

use core::f32::consts::PI;
use libm::{cosf, sqrtf};

/// Minimum ramp duration in seconds for attack, decay, and release.
///
/// Zero-length ramps would divide by zero; 1 ms is short enough to read
/// as instant.
pub const MIN_RAMP_SECONDS: f32 = 0.001;

/// Value below which a release ramp is considered finished.
const RELEASE_FLOOR: f32 = 1e-4;

/// DAHDSR envelope stages
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeStage {
    /// Envelope is inactive — output is zero.
    #[default]
    Idle,
    /// Delay phase — output holds at its start value before the attack.
    Delay,
    /// Attack phase — output ramps toward the velocity-scaled peak.
    Attack,
    /// Hold phase — output holds at the peak before decaying.
    Hold,
    /// Decay phase — output falls from peak toward sustain level.
    Decay,
    /// Sustain phase — output holds at sustain level while the gate is held.
    Sustain,
    /// Release phase — output decays to zero after gate release.
    Release,
}

/// Curve shape applied to a single envelope ramp.
///
/// Each ramp (attack, decay, release) has its own selector. The
/// exponential and logarithmic shapes mirror around the direction of
/// travel so a falling ramp has the same perceived contour as a rising
/// one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CurveType {
    /// Straight line from start to end.
    #[default]
    Linear,
    /// Fast start, slow approach to the target.
    Exponential,
    /// Slow start, fast approach to the target.
    Logarithmic,
    /// Half-cosine ease-in/ease-out.
    SCurve,
}

impl CurveType {
    /// Interpolate between `start` and `end` at normalized ramp position
    /// `t` in `[0, 1]`.
    #[inline]
    pub fn apply(self, t: f32, start: f32, end: f32) -> f32 {
        let falling = end < start;
        let shaped = match self {
            Self::Linear => t,
            Self::Exponential => {
                if falling {
                    let inv = 1.0 - t;
                    1.0 - inv * inv * inv
                } else {
                    sqrtf(t)
                }
            }
            Self::Logarithmic => {
                if falling {
                    t * t * t
                } else {
                    1.0 - sqrtf(1.0 - t)
                }
            }
            Self::SCurve => (1.0 - cosf(t * PI)) * 0.5,
        };
        start + (end - start) * shaped
    }
}

/// DAHDSR envelope generator.
///
/// Generates delay-attack-hold-decay-sustain-release envelopes for
/// controlling amplitude, filter cutoff, or other parameters. Time
/// advances through [`process`](Self::process) in caller-supplied `dt`
/// steps, so one implementation serves any sample rate.
///
/// # Features
///
/// - Per-ramp curve shapes (linear, exponential, logarithmic, s-curve)
/// - Velocity-sensitive peak level
/// - Click-free retriggering: a new trigger ramps from the current value
/// - Delay and hold segments for percussive and pad-style contours
///
/// # Example
///
/// ```rust
/// use polivoz_synth::{DahdsrEnvelope, EnvelopeStage};
///
/// let mut env = DahdsrEnvelope::new();
/// env.set_attack(0.01);
/// env.set_decay(0.1);
/// env.set_sustain(0.7);
/// env.set_release(0.2);
///
/// // Trigger at full velocity
/// env.trigger(127);
///
/// // Process samples at 48 kHz
/// let dt = 1.0 / 48000.0;
/// for _ in 0..1000 {
///     let level = env.process(dt);
///     assert!((0.0..=1.0).contains(&level));
/// }
///
/// // Release
/// env.release();
/// ```
#[derive(Debug, Clone)]
pub struct DahdsrEnvelope {
    /// Current stage
    stage: EnvelopeStage,
    /// Current output value
    value: f32,
    /// Seconds elapsed in the current stage
    stage_time: f32,
    /// Value at the moment the current attack began (retrigger support)
    stage_start_value: f32,
    /// Value captured when the release began
    release_start_value: f32,
    /// Velocity-scaled attack target
    peak_level: f32,

    // Stage durations in seconds
    delay: f32,
    attack: f32,
    hold: f32,
    decay: f32,
    release: f32,
    /// Sustain level (0.0 to 1.0)
    sustain: f32,
    /// How strongly velocity scales the peak (0 = ignore velocity)
    velocity_sensitivity: f32,

    // Per-ramp curve shapes
    attack_curve: CurveType,
    decay_curve: CurveType,
    release_curve: CurveType,
}

impl Default for DahdsrEnvelope {
    fn default() -> Self {
        Self::new()
    }
}

impl DahdsrEnvelope {
    /// Create a new envelope with default settings.
    ///
    /// Default values:
    /// - Delay: 0 s
    /// - Attack: 10 ms
    /// - Hold: 0 s
    /// - Decay: 100 ms
    /// - Sustain: 0.7
    /// - Release: 200 ms
    /// - Velocity sensitivity: 0.0
    pub fn new() -> Self {
        Self {
            stage: EnvelopeStage::Idle,
            value: 0.0,
            stage_time: 0.0,
            stage_start_value: 0.0,
            release_start_value: 0.0,
            peak_level: 1.0,
            delay: 0.0,
            attack: 0.01,
            hold: 0.0,
            decay: 0.1,
            release: 0.2,
            sustain: 0.7,
            velocity_sensitivity: 0.0,
            attack_curve: CurveType::Linear,
            decay_curve: CurveType::Exponential,
            release_curve: CurveType::Exponential,
        }
    }

    /// Set delay time in seconds (time before the attack starts).
    pub fn set_delay(&mut self, seconds: f32) {
        self.delay = seconds.max(0.0);
    }

    /// Get delay time in seconds.
    pub fn delay(&self) -> f32 {
        self.delay
    }

    /// Set attack time in seconds.
    pub fn set_attack(&mut self, seconds: f32) {
        self.attack = seconds.max(MIN_RAMP_SECONDS);
    }

    /// Get attack time in seconds.
    pub fn attack(&self) -> f32 {
        self.attack
    }

    /// Set hold time in seconds (time at peak before the decay starts).
    pub fn set_hold(&mut self, seconds: f32) {
        self.hold = seconds.max(0.0);
    }

    /// Get hold time in seconds.
    pub fn hold(&self) -> f32 {
        self.hold
    }

    /// Set decay time in seconds.
    pub fn set_decay(&mut self, seconds: f32) {
        self.decay = seconds.max(MIN_RAMP_SECONDS);
    }

    /// Get decay time in seconds.
    pub fn decay(&self) -> f32 {
        self.decay
    }

    /// Set sustain level (0.0 to 1.0).
    pub fn set_sustain(&mut self, level: f32) {
        self.sustain = level.clamp(0.0, 1.0);
    }

    /// Get sustain level.
    pub fn sustain(&self) -> f32 {
        self.sustain
    }

    /// Set release time in seconds.
    pub fn set_release(&mut self, seconds: f32) {
        self.release = seconds.max(MIN_RAMP_SECONDS);
    }

    /// Get release time in seconds.
    pub fn release_time(&self) -> f32 {
        self.release
    }

    /// Set velocity sensitivity (0.0 to 1.0).
    ///
    /// At 0.0 every trigger peaks at 1.0 regardless of velocity. At 1.0
    /// the peak scales linearly with velocity.
    pub fn set_velocity_sensitivity(&mut self, amount: f32) {
        self.velocity_sensitivity = amount.clamp(0.0, 1.0);
    }

    /// Get velocity sensitivity.
    pub fn velocity_sensitivity(&self) -> f32 {
        self.velocity_sensitivity
    }

    /// Set the attack ramp curve.
    pub fn set_attack_curve(&mut self, curve: CurveType) {
        self.attack_curve = curve;
    }

    /// Set the decay ramp curve.
    pub fn set_decay_curve(&mut self, curve: CurveType) {
        self.decay_curve = curve;
    }

    /// Set the release ramp curve.
    pub fn set_release_curve(&mut self, curve: CurveType) {
        self.release_curve = curve;
    }

    /// Trigger the envelope (note on).
    ///
    /// The attack ramps from the current output value, so retriggering a
    /// sounding envelope never jumps back to zero. Velocity (0-127) scales
    /// the attack peak according to the velocity sensitivity.
    pub fn trigger(&mut self, velocity: u8) {
        let normalized = f32::from(velocity.min(127)) / 127.0;
        self.peak_level = 1.0 - (1.0 - normalized) * self.velocity_sensitivity;
        self.stage_start_value = self.value;
        self.stage_time = 0.0;
        self.stage = if self.delay > 0.0 {
            EnvelopeStage::Delay
        } else {
            EnvelopeStage::Attack
        };
    }

    /// Release the envelope (note off).
    ///
    /// Captures the current value as the release ramp's start, so a
    /// release mid-attack fades from wherever the attack got to. No-op
    /// when idle.
    pub fn release(&mut self) {
        if self.stage != EnvelopeStage::Idle {
            self.release_start_value = self.value;
            self.stage_time = 0.0;
            self.stage = EnvelopeStage::Release;
        }
    }

    /// Force envelope to idle state.
    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.value = 0.0;
        self.stage_time = 0.0;
        self.stage_start_value = 0.0;
        self.release_start_value = 0.0;
    }

    /// Get current stage.
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Get current value without advancing.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Check if envelope is active (not idle).
    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }

    /// Advance the envelope by `dt` seconds and return the current value.
    ///
    /// Stage boundaries clamp: when `dt` overshoots the end of a stage the
    /// value snaps to the boundary and the next stage starts counting on
    /// the following call, so coarse `dt` stretches segment timing by up
    /// to one step rather than distorting the curve.
    #[inline]
    pub fn process(&mut self, dt: f32) -> f32 {
        self.stage_time += dt.max(0.0);

        match self.stage {
            EnvelopeStage::Idle => {
                self.value = 0.0;
            }

            EnvelopeStage::Delay => {
                self.value = self.stage_start_value;
                if self.stage_time >= self.delay {
                    self.begin(EnvelopeStage::Attack);
                }
            }

            EnvelopeStage::Attack => {
                let t = (self.stage_time / self.attack).min(1.0);
                self.value = self
                    .attack_curve
                    .apply(t, self.stage_start_value, self.peak_level);
                if t >= 1.0 {
                    self.value = self.peak_level;
                    if self.hold > 0.0 {
                        self.begin(EnvelopeStage::Hold);
                    } else {
                        self.begin(EnvelopeStage::Decay);
                    }
                }
            }

            EnvelopeStage::Hold => {
                self.value = self.peak_level;
                if self.stage_time >= self.hold {
                    self.begin(EnvelopeStage::Decay);
                }
            }

            EnvelopeStage::Decay => {
                let t = (self.stage_time / self.decay).min(1.0);
                self.value = self.decay_curve.apply(t, self.peak_level, self.sustain);
                if t >= 1.0 {
                    self.value = self.sustain;
                    self.begin(EnvelopeStage::Sustain);
                }
            }

            EnvelopeStage::Sustain => {
                self.value = self.sustain;
            }

            EnvelopeStage::Release => {
                let t = (self.stage_time / self.release).min(1.0);
                self.value = self
                    .release_curve
                    .apply(t, self.release_start_value, 0.0);
                if t >= 1.0 || self.value <= RELEASE_FLOOR {
                    self.value = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }

        self.value
    }

    /// Enter `stage` with a fresh time counter, keeping the current value.
    fn begin(&mut self, stage: EnvelopeStage) {
        self.stage = stage;
        self.stage_time = 0.0;
    }
}
