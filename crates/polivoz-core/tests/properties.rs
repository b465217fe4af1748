//! Property-based tests for filter stability.
//!
//! These verify numeric robustness across the whole parameter space rather
//! than at hand-picked points: no filter topology may ever emit NaN or Inf,
//! for any cutoff/resonance combination and any bounded input.

use polivoz_core::{FilterBank, FilterType, cutoff_to_hz};
use proptest::prelude::*;

fn any_filter_type() -> impl Strategy<Value = FilterType> {
    prop_oneof![
        Just(FilterType::None),
        Just(FilterType::LowPass),
        Just(FilterType::HighPass),
        Just(FilterType::BandPass),
        Just(FilterType::Notch),
        Just(FilterType::MoogLadder),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn filter_output_always_finite(
        filter_type in any_filter_type(),
        cutoff in 0.0f32..=1.0,
        resonance in 0.0f32..=1.0,
        sample_rate in prop_oneof![Just(44100.0f32), Just(48000.0), Just(96000.0)],
        input in prop::collection::vec(-1.0f32..=1.0, 256),
    ) {
        let mut bank = FilterBank::new(sample_rate);
        for &x in &input {
            let y = bank.process(x, filter_type, cutoff, resonance);
            prop_assert!(
                y.is_finite(),
                "{:?} produced {} at cutoff={} res={} sr={}",
                filter_type, y, cutoff, resonance, sample_rate
            );
        }
    }

    #[test]
    fn filter_survives_modulated_cutoff(
        filter_type in any_filter_type(),
        resonance in 0.0f32..=1.0,
        cutoffs in prop::collection::vec(-0.5f32..=1.5, 256),
    ) {
        // Cutoff sweeps (including out-of-range values the bank must clamp)
        // while processing must not destabilize any topology.
        let mut bank = FilterBank::new(44100.0);
        for (i, &cutoff) in cutoffs.iter().enumerate() {
            let x = if i % 3 == 0 { 1.0 } else { -0.7 };
            let y = bank.process(x, filter_type, cutoff, resonance);
            prop_assert!(y.is_finite());
        }
    }

    #[test]
    fn cutoff_mapping_monotone_and_guarded(
        a in 0.0f32..=1.0,
        b in 0.0f32..=1.0,
        sample_rate in 8000.0f32..=192000.0,
    ) {
        let fa = cutoff_to_hz(a, sample_rate);
        let fb = cutoff_to_hz(b, sample_rate);
        if a < b {
            prop_assert!(fa <= fb, "mapping not monotone: {} -> {}, {} -> {}", a, fa, b, fb);
        }
        prop_assert!(fa >= 20.0 * 0.999);
        prop_assert!(fa <= 0.45 * sample_rate + 0.001);
    }
}
