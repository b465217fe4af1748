//! Integration tests for polivoz-synth.
//!
//! Tests cover the envelope lifecycle, voice allocation and stealing,
//! unison normalization, oscillator sync, parameter dispatch, and the
//! thread-shared engine surface.

use std::sync::Arc;
use std::thread;

use polivoz_synth::{
    DahdsrEnvelope, EnvelopeStage, FilterType, StealMode, SynthEngine, SyncMode, VoicePool,
    Waveform, midi_to_freq,
};

const SR: f32 = 48000.0;
const DT: f32 = 1.0 / SR;

/// Render one block and return the interleaved buffer.
fn render<const N: usize>(pool: &mut VoicePool<N>, frames: usize) -> Vec<f32> {
    let mut buffer = vec![0.0; frames * 2];
    assert_eq!(pool.render(&mut buffer, 0, frames), frames);
    buffer
}

fn peak(buffer: &[f32]) -> f32 {
    buffer.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()))
}

// ---------------------------------------------------------------------------
// 1. Envelope lifecycle
// ---------------------------------------------------------------------------

#[test]
fn envelope_full_lifecycle_reaches_sustain_then_idle() {
    let mut env = DahdsrEnvelope::new();
    env.set_attack(0.02);
    env.set_hold(0.01);
    env.set_decay(0.05);
    env.set_sustain(0.6);
    env.set_release(0.1);

    env.trigger(127);

    // Past attack + hold + decay: settled at sustain
    let settle = ((0.02 + 0.01 + 0.05) * SR) as usize + 100;
    for _ in 0..settle {
        env.process(DT);
    }
    assert_eq!(env.stage(), EnvelopeStage::Sustain);
    assert!((env.value() - 0.6).abs() < 1e-3, "value {}", env.value());

    env.release();
    for _ in 0..((0.1 * SR) as usize + 100) {
        env.process(DT);
    }
    assert_eq!(env.stage(), EnvelopeStage::Idle);
    assert_eq!(env.value(), 0.0);
}

#[test]
fn envelope_retrigger_ramps_from_current_value() {
    let mut env = DahdsrEnvelope::new();
    env.set_attack(0.1);

    env.trigger(127);
    for _ in 0..2400 {
        env.process(DT);
    }
    let mid_attack = env.value();
    assert!(mid_attack > 0.1, "attack should be partway up");

    // Retrigger: the new attack starts at the current value, no dip to 0
    env.trigger(127);
    let after = env.process(DT);
    assert!(
        after >= mid_attack - 1e-3,
        "retrigger dipped from {mid_attack} to {after}"
    );
}

#[test]
fn envelope_coarse_dt_clamps_stage_boundaries() {
    // Known boundary characteristic: a dt that overshoots a stage end
    // clamps to the boundary value instead of carrying remainder time
    // into the next ramp, so each stage can stretch by up to one step.
    let mut env = DahdsrEnvelope::new();
    env.set_attack(0.01);
    env.set_decay(0.01);
    env.set_sustain(0.5);

    env.trigger(127);
    // One giant step lands exactly on the attack peak, not past it
    let v = env.process(0.5);
    assert_eq!(v, 1.0);
    assert_eq!(env.stage(), EnvelopeStage::Decay);

    // The decay then starts fresh on the next call
    let v = env.process(0.5);
    assert_eq!(v, 0.5);
    assert_eq!(env.stage(), EnvelopeStage::Sustain);
}

// ---------------------------------------------------------------------------
// 2. Frequency mapping
// ---------------------------------------------------------------------------

#[test]
fn midi_frequency_mapping_standard_tuning() {
    assert!((f64::from(midi_to_freq(69)) - 440.0).abs() < 1e-4);
    assert!((f64::from(midi_to_freq(81)) - 880.0).abs() < 1e-4);
    // Octave ratio is exact in the mapping
    let ratio = midi_to_freq(81) / midi_to_freq(69);
    assert!((ratio - 2.0).abs() < 1e-6);
}

// ---------------------------------------------------------------------------
// 3. Voice stealing
// ---------------------------------------------------------------------------

#[test]
fn stealing_oldest_reassigns_first_voice() {
    let mut pool: VoicePool<2> = VoicePool::new(SR);
    pool.set_steal_mode(StealMode::Oldest);

    pool.note_on(60, 100);
    pool.note_on(64, 100);
    let first = pool.voice_for_note(60).unwrap();

    pool.note_on(67, 100);

    assert_eq!(pool.voices()[first].note(), 67, "voice holding 60 reassigned");
    let second = pool.voice_for_note(64).expect("64 still mapped");
    assert_eq!(pool.voices()[second].note(), 64, "note 64 keeps playing");
}

#[test]
fn stealing_none_is_a_no_op() {
    let mut pool: VoicePool<3> = VoicePool::new(SR);
    pool.set_steal_mode(StealMode::None);

    pool.note_on(60, 100);
    pool.note_on(64, 100);
    pool.note_on(67, 100);
    let notes_before: Vec<u8> = pool.voices().iter().map(|v| v.note()).collect();
    let count_before = pool.active_voice_count();

    pool.note_on(72, 127);

    assert_eq!(pool.active_voice_count(), count_before);
    let notes_after: Vec<u8> = pool.voices().iter().map(|v| v.note()).collect();
    assert_eq!(notes_after, notes_before);
}

#[test]
fn stealing_keeps_note_map_consistent() {
    let mut pool: VoicePool<2> = VoicePool::new(SR);
    pool.set_steal_mode(StealMode::Oldest);

    // Churn through more notes than voices; the map must always point at
    // a voice that currently holds the mapped note
    for note in 40..80 {
        pool.note_on(note, 100);
        for n in 0..128 {
            if let Some(idx) = pool.voice_for_note(n) {
                assert_eq!(
                    pool.voices()[idx].note(),
                    n,
                    "map entry for {n} points at a voice holding {}",
                    pool.voices()[idx].note()
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// 4. Filter stability
// ---------------------------------------------------------------------------

#[test]
fn nyquist_guard_keeps_every_topology_finite() {
    for filter_type in [
        FilterType::LowPass,
        FilterType::HighPass,
        FilterType::BandPass,
        FilterType::Notch,
        FilterType::MoogLadder,
    ] {
        let mut pool: VoicePool<4> = VoicePool::new(44100.0);
        pool.set_filter_type(filter_type);
        pool.set_parameter("cutoff", 1.0);
        pool.set_parameter("resonance", 1.0);
        pool.set_waveform(0, Waveform::Sawtooth);
        pool.note_on(69, 127);

        let buffer = render(&mut pool, 1000);
        for &sample in &buffer {
            assert!(
                sample.is_finite(),
                "{filter_type:?} produced non-finite output at full cutoff"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// 5. Unison
// ---------------------------------------------------------------------------

#[test]
fn unison_normalization_suppresses_amplitude_growth() {
    // With detuned lanes (the supersaw case the normalization exists
    // for) the 1/sqrt(N) scaling keeps loudness roughly flat: each
    // N-lane peak must stay below the coherent ceiling of the normalized
    // constant-power fan. Dropping the 1/sqrt(N) factor pushes every
    // count past its ceiling by about sqrt(N), so a normalization
    // regression trips the bound immediately.
    let single = unison_peak(1);

    for n in 2..=8 {
        let p = unison_peak(n);
        let ratio = p / single;
        assert!(
            ratio < coherent_fan_ceiling(n) + 0.15,
            "unison {n}: peak ratio {ratio} exceeds the normalized fan ceiling {}",
            coherent_fan_ceiling(n)
        );
        assert!(
            ratio > 0.5,
            "unison {n}: peak ratio {ratio} collapsed below the mix level"
        );
    }

    // The output stage's tanh compresses large aligned peaks, so the
    // measured supersaw stays strictly below even the linear ceiling
    let wide = unison_peak(7);
    assert!(
        wide / single < coherent_fan_ceiling(7),
        "7-lane supersaw peak {wide} vs single {single}"
    );
}

/// Worst-case peak of `n` normalized unison lanes relative to a single
/// centered lane: every lane at full amplitude simultaneously, summed
/// through the constant-power pan fan (angles spread evenly across
/// `[0, pi/2]` at full stereo width), scaled by `1/sqrt(n)`, divided by
/// the lone lane's `cos(pi/4)` gain.
fn coherent_fan_ceiling(n: usize) -> f32 {
    use std::f32::consts::{FRAC_1_SQRT_2, FRAC_PI_4};

    let divisor = (n - 1).max(1) as f32;
    let gain_sum: f32 = (0..n)
        .map(|i| {
            let t = (i as f32 - (n - 1) as f32 * 0.5) / divisor;
            ((2.0 * t + 1.0) * FRAC_PI_4).cos()
        })
        .sum();
    gain_sum / ((n as f32).sqrt() * FRAC_1_SQRT_2)
}

fn unison_peak(count: usize) -> f32 {
    let mut pool: VoicePool<1> = VoicePool::new(SR);
    pool.set_waveform(0, Waveform::Sawtooth);
    pool.set_parameter("volume", 0.5);
    pool.set_parameter("attack", 0.001);
    pool.set_parameter("sustain", 1.0);
    pool.set_parameter("detune", 30.0);
    pool.set_unison(count);
    // Disable the second slot so only the unison stack is measured
    let mut slave = *pool.render_params().oscillators.last().unwrap();
    slave.enabled = false;
    pool.set_oscillator_config(1, slave);

    pool.note_on(45, 127);
    // Skip the attack, then measure
    render(&mut pool, 2000);
    peak(&render(&mut pool, 8000))
}

// ---------------------------------------------------------------------------
// 6. Oscillator sync through the pool
// ---------------------------------------------------------------------------

#[test]
fn hard_sync_changes_slave_spectrum() {
    let mut free: VoicePool<1> = VoicePool::new(SR);
    let mut synced: VoicePool<1> = VoicePool::new(SR);
    for pool in [&mut free, &mut synced] {
        pool.set_waveform(0, Waveform::Sine);
        pool.set_waveform(1, Waveform::Sawtooth);
        pool.set_parameter("attack", 0.001);
        let mut master = pool.render_params().oscillators[0];
        master.octave_offset = 1;
        pool.set_oscillator_config(0, master);
    }
    synced.set_sync_mode(SyncMode::Hard);

    free.note_on(57, 127);
    synced.note_on(57, 127);
    render(&mut free, 1000);
    render(&mut synced, 1000);

    let a = render(&mut free, 1000);
    let b = render(&mut synced, 1000);
    let diff: f32 = a.iter().zip(&b).map(|(x, y)| (x - y).abs()).sum();
    assert!(diff > 1.0, "hard sync output identical to free-running");
}

// ---------------------------------------------------------------------------
// 7. Engine surface and concurrency
// ---------------------------------------------------------------------------

#[test]
fn engine_introspection_counts() {
    let engine: SynthEngine<8> = SynthEngine::new(SR);
    assert_eq!(engine.max_voices(), 8);
    assert_eq!(engine.active_voice_count(), 0);

    engine.note_on(60, 100);
    engine.note_on(64, 100);
    assert_eq!(engine.active_voice_count(), 2);

    engine.all_notes_off();
    engine.set_parameter("release", 0.001);
    let mut buffer = vec![0.0; 8192];
    engine.render(&mut buffer, 0, 4096);
    assert_eq!(engine.active_voice_count(), 0);
}

#[test]
fn engine_render_survives_control_thread_churn() {
    let engine: Arc<SynthEngine<16>> = Arc::new(SynthEngine::new(SR));

    let control = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for i in 0..200_u32 {
                let note = 36 + (i % 48) as u8;
                engine.note_on(note, 100);
                engine.set_parameter("cutoff", (i % 100) as f32 / 100.0);
                engine.set_modulation(((i % 7) as f32 - 3.0) / 3.0, 0.0);
                if i % 3 == 0 {
                    engine.note_off(note);
                }
            }
            engine.all_notes_off();
        })
    };

    let mut buffer = vec![0.0_f32; 512];
    for _ in 0..400 {
        let frames = engine.render(&mut buffer, 0, 256);
        assert_eq!(frames, 256);
        assert!(buffer.iter().all(|s| s.is_finite() && s.abs() <= 1.0));
    }

    control.join().expect("control thread panicked");
}

#[test]
fn engine_parameter_dispatch_table() {
    let engine: SynthEngine<4> = SynthEngine::new(SR);

    // Every documented name is accepted (and unknown ones ignored)
    // without panicking, in any case mix
    for name in [
        "volume",
        "cutoff",
        "resonance",
        "filtertype",
        "filterenvamount",
        "delay",
        "attack",
        "hold",
        "decay",
        "sustain",
        "release",
        "filterdelay",
        "filterattack",
        "filterhold",
        "filterdecay",
        "filtersustain",
        "filterrelease",
        "velocitysensitivity",
        "detune",
        "unison",
        "stereowidth",
        "pulsewidth",
        "vibrato",
        "not-a-parameter",
    ] {
        engine.set_parameter(name, 0.5);
        engine.set_parameter(&name.to_uppercase(), 0.5);
    }

    engine.note_on(60, 100);
    let mut buffer = vec![0.0; 512];
    assert_eq!(engine.render(&mut buffer, 0, 256), 256);
    assert!(buffer.iter().all(|s| s.is_finite()));
}

// ---------------------------------------------------------------------------
// 8. Mixing
// ---------------------------------------------------------------------------

#[test]
fn chord_output_is_sum_of_voices_before_clip() {
    // At low levels tanh is effectively linear, so a two-note chord
    // matches the sample-wise sum of the notes rendered separately
    let mut chord: VoicePool<4> = VoicePool::new(SR);
    let mut only_60: VoicePool<4> = VoicePool::new(SR);
    let mut only_64: VoicePool<4> = VoicePool::new(SR);
    for pool in [&mut chord, &mut only_60, &mut only_64] {
        pool.set_parameter("volume", 0.1);
    }

    chord.note_on(60, 80);
    chord.note_on(64, 80);
    only_60.note_on(60, 80);
    only_64.note_on(64, 80);

    let mixed = render(&mut chord, 1024);
    let a = render(&mut only_60, 1024);
    let b = render(&mut only_64, 1024);

    for i in 0..mixed.len() {
        assert!(
            (mixed[i] - (a[i] + b[i])).abs() < 5e-3,
            "sample {i}: {} vs {}",
            mixed[i],
            a[i] + b[i]
        );
    }
}
