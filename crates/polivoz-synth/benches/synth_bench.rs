//! Criterion benchmarks for polivoz-synth components
//!
//! Run with: cargo bench -p polivoz-synth

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use polivoz_synth::{
    DahdsrEnvelope, RenderParams, Voice, VoicePool, Waveform, Xorshift32, advance_phase,
    phase_increment,
};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

// ============================================================================
// Waveform benchmarks
// ============================================================================

fn bench_waveforms(c: &mut Criterion) {
    let mut group = c.benchmark_group("Waveform");

    let waveforms = [
        ("Sine", Waveform::Sine),
        ("Square", Waveform::Square),
        ("Sawtooth", Waveform::Sawtooth),
        ("Triangle", Waveform::Triangle),
        ("Noise", Waveform::Noise),
    ];

    for (name, waveform) in &waveforms {
        let inc = phase_increment(440.0, SAMPLE_RATE);

        group.bench_function(*name, |b| {
            let mut noise = Xorshift32::new(1);
            let mut phase = 0.0_f32;
            b.iter(|| {
                let mut sum = 0.0f32;
                for _ in 0..256 {
                    sum += waveform.sample(phase, 0.5, &mut noise);
                    phase = advance_phase(phase, inc);
                }
                black_box(sum)
            })
        });
    }

    group.finish();
}

// ============================================================================
// Envelope benchmarks
// ============================================================================

fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("Envelope");
    let dt = 1.0 / SAMPLE_RATE;

    for &block_size in BLOCK_SIZES {
        let mut env = DahdsrEnvelope::new();
        env.set_attack(0.01);
        env.set_decay(0.1);
        env.set_sustain(0.7);
        env.set_release(0.2);
        env.trigger(100);

        group.bench_with_input(
            BenchmarkId::from_parameter(block_size),
            &block_size,
            |b, &size| {
                b.iter(|| {
                    let mut sum = 0.0f32;
                    for _ in 0..size {
                        sum += env.process(dt);
                    }
                    black_box(sum)
                })
            },
        );
    }

    group.finish();
}

// ============================================================================
// Voice benchmarks
// ============================================================================

fn bench_voice_unison(c: &mut Criterion) {
    let mut group = c.benchmark_group("Voice_Unison");

    for unison in [1usize, 2, 4, 8] {
        let mut params = RenderParams::default();
        params.oscillators[0].waveform = Waveform::Sawtooth;
        params.unison_count = unison;
        params.unison_spread = 25.0;

        let mut voice = Voice::new(SAMPLE_RATE);
        voice.trigger(57, 100, 1, &params.oscillators);

        group.bench_with_input(BenchmarkId::from_parameter(unison), &unison, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for _ in 0..256 {
                    let (l, r) = voice.process_stereo(&params);
                    sum += l + r;
                }
                black_box(sum)
            })
        });
    }

    group.finish();
}

// ============================================================================
// Pool render benchmarks
// ============================================================================

fn bench_pool_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("Pool_Render");

    for &block_size in BLOCK_SIZES {
        let mut pool: VoicePool<16> = VoicePool::new(SAMPLE_RATE);
        pool.set_waveform(0, Waveform::Sawtooth);
        pool.set_parameter("cutoff", 0.7);
        pool.set_parameter("filtertype", 5.0);
        for note in [48, 52, 55, 60, 64, 67, 72, 76] {
            pool.note_on(note, 100);
        }

        let mut buffer = vec![0.0_f32; block_size * 2];

        group.bench_with_input(
            BenchmarkId::new("8_voices", block_size),
            &block_size,
            |b, &size| {
                b.iter(|| {
                    let frames = pool.render(&mut buffer, 0, size);
                    black_box(frames)
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_waveforms,
    bench_envelope,
    bench_voice_unison,
    bench_pool_render
);
criterion_main!(benches);
