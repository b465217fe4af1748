//! Voice pool and polyphonic synthesizer engine.
//!
//! [`VoicePool`] owns a fixed array of voices, the note-to-voice map, and
//! the engine-wide parameter block; it implements allocation, stealing,
//! and the block render loop. [`SynthEngine`] wraps the pool in a mutex
//! and exposes the public note/parameter/render surface to a control
//! thread and an audio callback.
//!
//! The pool itself has no locking and no allocation, so it stays usable
//! on no_std targets; only the mutex wrapper is `std`-gated.

use crate::oscillator::{NUM_OSCILLATORS, OscillatorConfig, SyncMode, Waveform};
use crate::voice::{MAX_UNISON, RenderParams, Voice};
use polivoz_core::{FilterType, soft_clip};

/// Policy for reassigning a sounding voice when the pool is exhausted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StealMode {
    /// Drop the new note silently.
    None,
    /// Steal the least recently triggered voice. Ties keep the lowest
    /// index.
    #[default]
    Oldest,
    /// Steal the voice with the lowest current perceptual amplitude
    /// (envelope value scaled by velocity).
    Quietest,
    /// Steal the voice holding the lowest note number.
    Lowest,
    /// Steal the voice holding the highest note number.
    Highest,
    /// Steal an active voice already playing the same note number, else
    /// fall back to [`Oldest`](Self::Oldest).
    SameNote,
}

/// Fixed-size pool of [`Voice`]s with a note map and stealing policy.
///
/// Everything here is plain numeric state: the pool never allocates after
/// construction, and [`render`](Self::render) performs no I/O. Callers
/// that share a pool between threads wrap it in [`SynthEngine`].
///
/// # Example
///
/// ```rust
/// use polivoz_synth::{StealMode, VoicePool};
///
/// let mut pool: VoicePool<8> = VoicePool::new(48000.0);
/// pool.set_steal_mode(StealMode::Oldest);
///
/// pool.note_on(60, 100);
/// pool.note_on(64, 100);
/// assert_eq!(pool.active_voice_count(), 2);
///
/// let mut buffer = [0.0_f32; 512];
/// let frames = pool.render(&mut buffer, 0, 256);
/// assert_eq!(frames, 256);
/// ```
#[derive(Debug)]
pub struct VoicePool<const N: usize> {
    voices: [Voice; N],
    /// At most one voice index per MIDI note. Entries are removed on
    /// note-off, stealing, and when render observes the voice idle, so
    /// the map never points at a voice that has moved on to another note.
    note_map: [Option<usize>; 128],
    steal_mode: StealMode,
    /// Monotonic stamp handed to voices on trigger, for Oldest stealing.
    trigger_counter: u64,
    sample_rate: f32,
    /// Engine-wide block parameters. The per-block LFO fields are filled
    /// in by `render` from the modulation scalars below.
    params: RenderParams,
    /// Pitch LFO depth in semitones at full modulation.
    vibrato_depth: f32,
    /// Latest external pitch LFO sample, nominally `[-1, 1]`.
    pitch_scalar: f32,
    /// Latest external filter LFO offset on the normalized cutoff.
    filter_offset: f32,
}

impl<const N: usize> VoicePool<N> {
    /// Create a pool of `N` voices at the given sample rate.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            voices: core::array::from_fn(|_| Voice::new(sample_rate)),
            note_map: [None; 128],
            steal_mode: StealMode::default(),
            trigger_counter: 0,
            sample_rate,
            params: RenderParams::default(),
            vibrato_depth: 0.0,
            pitch_scalar: 0.0,
            filter_offset: 0.0,
        }
    }

    /// Update the sample rate for every voice.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        for voice in &mut self.voices {
            voice.set_sample_rate(sample_rate);
        }
    }

    /// Sample rate the pool renders at.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Set the voice stealing policy.
    pub fn set_steal_mode(&mut self, mode: StealMode) {
        self.steal_mode = mode;
    }

    /// Current stealing policy.
    pub fn steal_mode(&self) -> StealMode {
        self.steal_mode
    }

    /// Number of voices currently producing sound.
    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    /// Total polyphony.
    pub fn max_voices(&self) -> usize {
        N
    }

    /// Read access to the voices, for introspection and tests.
    pub fn voices(&self) -> &[Voice; N] {
        &self.voices
    }

    /// Voice index currently mapped to `note`, if any.
    pub fn voice_for_note(&self, note: u8) -> Option<usize> {
        self.note_map[usize::from(note.min(127))]
    }

    /// Current engine-wide render parameters.
    pub fn render_params(&self) -> &RenderParams {
        &self.params
    }

    /// Trigger a note.
    ///
    /// Out-of-range note and velocity values are clamped at this
    /// boundary; voice math assumes valid MIDI ranges. A note already
    /// mapped to an active voice retriggers that voice in place. With the
    /// pool exhausted and [`StealMode::None`] the note is dropped
    /// silently.
    pub fn note_on(&mut self, note: u8, velocity: u8) {
        let note = note.min(127);
        let velocity = velocity.min(127);

        // Same note still sounding: retrigger in place, no stealing.
        if let Some(idx) = self.note_map[usize::from(note)] {
            if self.voices[idx].is_active() {
                self.trigger_voice(idx, note, velocity);
                return;
            }
            self.note_map[usize::from(note)] = None;
        }

        let Some(idx) = self.allocate(note) else {
            return;
        };

        // A stolen voice loses its old mapping before the new one lands.
        if self.voices[idx].is_active() {
            let old = usize::from(self.voices[idx].note());
            if self.note_map[old] == Some(idx) {
                self.note_map[old] = None;
            }
        }

        self.trigger_voice(idx, note, velocity);
        self.note_map[usize::from(note)] = Some(idx);
    }

    /// Release a note.
    ///
    /// The voice stays audible through its release stage; only the
    /// mapping is cleared so a new note-on for the same number gets a
    /// fresh voice.
    pub fn note_off(&mut self, note: u8) {
        if let Some(idx) = self.note_map[usize::from(note.min(127))].take() {
            self.voices[idx].release();
        }
    }

    /// Release every voice and clear the note map. Idempotent.
    pub fn all_notes_off(&mut self) {
        for voice in &mut self.voices {
            voice.release();
        }
        self.note_map = [None; 128];
    }

    /// Silence every voice immediately and clear the map.
    pub fn reset(&mut self) {
        for voice in &mut self.voices {
            voice.reset();
        }
        self.note_map = [None; 128];
        self.trigger_counter = 0;
    }

    /// Store the per-block modulation scalars from external LFOs.
    ///
    /// `pitch_scalar` is scaled by the vibrato depth into semitones;
    /// `filter_offset` is added to the normalized cutoff as-is.
    pub fn set_modulation(&mut self, pitch_scalar: f32, filter_offset: f32) {
        self.pitch_scalar = pitch_scalar;
        self.filter_offset = filter_offset;
    }

    /// Render `frames` interleaved stereo frames into `buffer` at
    /// `offset`.
    ///
    /// Returns the number of frames written: always `frames`, or 0 when
    /// the slice cannot hold the request. The region is cleared, one
    /// modulation snapshot is taken for the whole block, every active
    /// voice is accumulated, and the mixed result is soft-clipped with
    /// `tanh`. A voice whose amplitude envelope completes mid-block stops
    /// contributing for the rest of the block and is unmapped.
    pub fn render(&mut self, buffer: &mut [f32], offset: usize, frames: usize) -> usize {
        let Some(end) = frames.checked_mul(2).and_then(|n| n.checked_add(offset)) else {
            return 0;
        };
        let Some(region) = buffer.get_mut(offset..end) else {
            return 0;
        };
        region.fill(0.0);

        let mut params = self.params;
        params.pitch_lfo_semitones = self.vibrato_depth * self.pitch_scalar;
        params.filter_lfo_offset = self.filter_offset;

        for idx in 0..N {
            if !self.voices[idx].is_active() {
                continue;
            }
            let voice = &mut self.voices[idx];
            for frame in 0..frames {
                let (left, right) = voice.process_stereo(&params);
                if !voice.is_active() {
                    break;
                }
                region[frame * 2] += left;
                region[frame * 2 + 1] += right;
            }
            if !self.voices[idx].is_active() {
                let note = usize::from(self.voices[idx].note());
                if self.note_map[note] == Some(idx) {
                    self.note_map[note] = None;
                }
            }
        }

        for sample in region.iter_mut() {
            *sample = soft_clip(*sample);
        }
        frames
    }

    /// Case-insensitive parameter dispatch.
    ///
    /// Unknown names are ignored rather than rejected, so generic UI
    /// binding code can call this speculatively. Values are clamped to
    /// each field's range.
    pub fn set_parameter(&mut self, name: &str, value: f32) {
        let mut buf = [0u8; 32];
        let Some(lowered) = buf.get_mut(..name.len()) else {
            return;
        };
        lowered.copy_from_slice(name.as_bytes());
        lowered.make_ascii_lowercase();
        let Ok(name) = core::str::from_utf8(lowered) else {
            return;
        };

        match name {
            "volume" => self.params.master_volume = value.clamp(0.0, 1.0),
            "cutoff" => self.params.cutoff = value.clamp(0.0, 1.0),
            "resonance" => self.params.resonance = value.clamp(0.0, 1.0),
            "filtertype" => {
                self.params.filter_type = FilterType::from_index(value.max(0.0) as u32);
            }
            "filterenvamount" => self.params.filter_env_amount = value.clamp(-1.0, 1.0),

            "delay" => self.for_each_amp_env(|env| env.set_delay(value)),
            "attack" => self.for_each_amp_env(|env| env.set_attack(value)),
            "hold" => self.for_each_amp_env(|env| env.set_hold(value)),
            "decay" => self.for_each_amp_env(|env| env.set_decay(value)),
            "sustain" => self.for_each_amp_env(|env| env.set_sustain(value)),
            "release" => self.for_each_amp_env(|env| env.set_release(value)),

            "filterdelay" => self.for_each_filter_env(|env| env.set_delay(value)),
            "filterattack" => self.for_each_filter_env(|env| env.set_attack(value)),
            "filterhold" => self.for_each_filter_env(|env| env.set_hold(value)),
            "filterdecay" => self.for_each_filter_env(|env| env.set_decay(value)),
            "filtersustain" => self.for_each_filter_env(|env| env.set_sustain(value)),
            "filterrelease" => self.for_each_filter_env(|env| env.set_release(value)),

            "velocitysensitivity" => {
                for voice in &mut self.voices {
                    voice.amp_env.set_velocity_sensitivity(value);
                    voice.filter_env.set_velocity_sensitivity(value);
                }
            }

            "detune" => self.params.unison_spread = value.clamp(0.0, 100.0),
            "unison" => self.params.unison_count = (value as usize).clamp(1, MAX_UNISON),
            "stereowidth" => self.params.stereo_width = value.clamp(0.0, 1.0),
            "pulsewidth" => {
                let width = value.clamp(0.01, 0.99);
                for config in &mut self.params.oscillators {
                    config.pulse_width = width;
                }
            }
            "vibrato" => self.vibrato_depth = value.clamp(0.0, 12.0),

            _ => {}
        }
    }

    // Typed setters for the enum-valued state the string table cannot
    // express losslessly.

    /// Select the filter topology for subsequent render calls.
    pub fn set_filter_type(&mut self, filter_type: FilterType) {
        self.params.filter_type = filter_type;
    }

    /// Select the master/slave oscillator sync coupling.
    pub fn set_sync_mode(&mut self, mode: SyncMode) {
        self.params.sync_mode = mode;
    }

    /// Set the waveform of one oscillator slot.
    pub fn set_waveform(&mut self, slot: usize, waveform: Waveform) {
        if let Some(config) = self.params.oscillators.get_mut(slot) {
            config.waveform = waveform;
        }
    }

    /// Replace one oscillator slot's configuration wholesale.
    pub fn set_oscillator_config(&mut self, slot: usize, config: OscillatorConfig) {
        if let Some(dst) = self.params.oscillators.get_mut(slot) {
            *dst = config;
        }
    }

    /// Set the unison sub-voice count (clamped to 1..=[`MAX_UNISON`]).
    pub fn set_unison(&mut self, count: usize) {
        self.params.unison_count = count.clamp(1, MAX_UNISON);
    }

    /// Set the unison detune spread in cents.
    pub fn set_unison_spread(&mut self, cents: f32) {
        self.params.unison_spread = cents.clamp(0.0, 100.0);
    }

    fn trigger_voice(&mut self, idx: usize, note: u8, velocity: u8) {
        let oscillators = self.params.oscillators;
        self.trigger_counter += 1;
        self.voices[idx].trigger(note, velocity, self.trigger_counter, &oscillators);
    }

    /// Pick a voice for a new note: any inactive voice, else apply the
    /// stealing policy. `None` means the note is dropped.
    fn allocate(&self, note: u8) -> Option<usize> {
        for (i, voice) in self.voices.iter().enumerate() {
            if !voice.is_active() {
                return Some(i);
            }
        }

        match self.steal_mode {
            StealMode::None => None,
            StealMode::Oldest => Some(self.oldest()),
            StealMode::Quietest => {
                let mut best = 0;
                let mut best_loudness = f32::INFINITY;
                for (i, voice) in self.voices.iter().enumerate() {
                    let loudness = voice.loudness();
                    if loudness < best_loudness {
                        best_loudness = loudness;
                        best = i;
                    }
                }
                Some(best)
            }
            StealMode::Lowest => {
                let mut best = 0;
                let mut best_note = u8::MAX;
                for (i, voice) in self.voices.iter().enumerate() {
                    if voice.note() < best_note {
                        best_note = voice.note();
                        best = i;
                    }
                }
                Some(best)
            }
            StealMode::Highest => {
                let mut best = 0;
                let mut best_note = 0;
                for (i, voice) in self.voices.iter().enumerate() {
                    if voice.note() > best_note {
                        best_note = voice.note();
                        best = i;
                    }
                }
                Some(best)
            }
            StealMode::SameNote => self
                .voices
                .iter()
                .position(|v| v.is_active() && v.note() == note)
                .or_else(|| Some(self.oldest())),
        }
    }

    /// Least recently triggered voice. Strict `<` keeps the lowest index
    /// on ties.
    fn oldest(&self) -> usize {
        let mut best = 0;
        let mut best_time = u64::MAX;
        for (i, voice) in self.voices.iter().enumerate() {
            if voice.trigger_time() < best_time {
                best_time = voice.trigger_time();
                best = i;
            }
        }
        best
    }

    fn for_each_amp_env(&mut self, mut f: impl FnMut(&mut crate::envelope::DahdsrEnvelope)) {
        for voice in &mut self.voices {
            f(&mut voice.amp_env);
        }
    }

    fn for_each_filter_env(&mut self, mut f: impl FnMut(&mut crate::envelope::DahdsrEnvelope)) {
        for voice in &mut self.voices {
            f(&mut voice.filter_env);
        }
    }
}

#[cfg(feature = "std")]
pub use self::locked::SynthEngine;

#[cfg(feature = "std")]
mod locked {
    use super::{StealMode, VoicePool};
    use crate::oscillator::{OscillatorConfig, SyncMode, Waveform};
    use polivoz_core::FilterType;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    /// Thread-safe polyphonic synthesizer engine.
    ///
    /// Wraps a [`VoicePool`] in a single mutex so a control thread (note
    /// events, parameter edits) and an audio callback (render) can share
    /// it through `&self`. Every public method holds the lock for its
    /// full bookkeeping duration, which makes the output equivalent to
    /// serializing control events strictly between render blocks.
    ///
    /// A poisoned lock is recovered rather than propagated: the pool is
    /// plain numeric state, and a panic must never cross the render
    /// boundary of an audio callback.
    ///
    /// # Example
    ///
    /// ```rust
    /// use polivoz_synth::SynthEngine;
    ///
    /// let engine: SynthEngine<16> = SynthEngine::new(48000.0);
    /// engine.note_on(60, 100);
    /// engine.set_parameter("cutoff", 0.8);
    ///
    /// let mut buffer = vec![0.0_f32; 1024];
    /// let frames = engine.render(&mut buffer, 0, 512);
    /// assert_eq!(frames, 512);
    /// ```
    #[derive(Debug)]
    pub struct SynthEngine<const N: usize> {
        pool: Mutex<VoicePool<N>>,
    }

    impl<const N: usize> SynthEngine<N> {
        /// Create an engine with `N` voices at the given sample rate.
        pub fn new(sample_rate: f32) -> Self {
            Self {
                pool: Mutex::new(VoicePool::new(sample_rate)),
            }
        }

        fn lock(&self) -> MutexGuard<'_, VoicePool<N>> {
            self.pool.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Trigger a note. See [`VoicePool::note_on`].
        pub fn note_on(&self, note: u8, velocity: u8) {
            self.lock().note_on(note, velocity);
        }

        /// Release a note. See [`VoicePool::note_off`].
        pub fn note_off(&self, note: u8) {
            self.lock().note_off(note);
        }

        /// Release every voice and clear the note map.
        pub fn all_notes_off(&self) {
            self.lock().all_notes_off();
        }

        /// Case-insensitive parameter dispatch; unknown names are
        /// ignored. See [`VoicePool::set_parameter`].
        pub fn set_parameter(&self, name: &str, value: f32) {
            self.lock().set_parameter(name, value);
        }

        /// Store the per-block modulation scalars from external LFOs.
        pub fn set_modulation(&self, pitch_scalar: f32, filter_offset: f32) {
            self.lock().set_modulation(pitch_scalar, filter_offset);
        }

        /// Set the voice stealing policy.
        pub fn set_steal_mode(&self, mode: StealMode) {
            self.lock().set_steal_mode(mode);
        }

        /// Select the filter topology.
        pub fn set_filter_type(&self, filter_type: FilterType) {
            self.lock().set_filter_type(filter_type);
        }

        /// Select the oscillator sync coupling.
        pub fn set_sync_mode(&self, mode: SyncMode) {
            self.lock().set_sync_mode(mode);
        }

        /// Set the waveform of one oscillator slot.
        pub fn set_waveform(&self, slot: usize, waveform: Waveform) {
            self.lock().set_waveform(slot, waveform);
        }

        /// Replace one oscillator slot's configuration.
        pub fn set_oscillator_config(&self, slot: usize, config: OscillatorConfig) {
            self.lock().set_oscillator_config(slot, config);
        }

        /// Set the unison sub-voice count.
        pub fn set_unison(&self, count: usize) {
            self.lock().set_unison(count);
        }

        /// Update the sample rate for every voice.
        pub fn set_sample_rate(&self, sample_rate: f32) {
            self.lock().set_sample_rate(sample_rate);
        }

        /// Render interleaved stereo frames. See [`VoicePool::render`].
        pub fn render(&self, buffer: &mut [f32], offset: usize, frames: usize) -> usize {
            self.lock().render(buffer, offset, frames)
        }

        /// Number of voices currently producing sound.
        pub fn active_voice_count(&self) -> usize {
            self.lock().active_voice_count()
        }

        /// Total polyphony.
        pub fn max_voices(&self) -> usize {
            N
        }
    }
}
