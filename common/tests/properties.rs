//! Property tests for the codec, smoothing, target bounds and valve anti-seek.

use proptest::prelude::*;
use trv_common::{
    codec::quantisation_error_c16, compress_temp_c16, compute_target_temperature,
    expand_temp_c16, smooth_stats_value, Mode, PersistedSettings, RadValve, TargetInputs,
    TrvConfig,
};

fn arb_mode() -> impl Strategy<Value = Mode> {
    prop_oneof![Just(Mode::Frost), Just(Mode::Warm)]
}

fn arb_target_inputs() -> impl Strategy<Value = TargetInputs> {
    (
        (arb_mode(), any::<bool>(), any::<u8>(), any::<u8>()),
        (any::<bool>(), any::<bool>(), any::<bool>(), any::<u16>()),
        (any::<bool>(), any::<bool>(), any::<bool>()),
    )
        .prop_map(
            |(
                (mode, in_bake, frost_target_c, warm_target_c),
                (likely_recently_occupied, likely_occupied, likely_unoccupied, vacancy_minutes),
                (room_lit, warm_predicted, schedule_warm_now),
            )| TargetInputs {
                mode,
                in_bake,
                frost_target_c,
                warm_target_c,
                likely_recently_occupied,
                likely_occupied,
                likely_unoccupied,
                vacancy_minutes,
                room_lit,
                warm_predicted,
                schedule_warm_now,
            },
        )
}

proptest! {
    #[test]
    fn codec_round_trip_within_band_error(t in 0i16..=1600) {
        let expanded = expand_temp_c16(compress_temp_c16(t));
        prop_assert!(expanded <= t);
        prop_assert!(t - expanded <= quantisation_error_c16(t));
    }

    #[test]
    fn codec_is_monotonic(a in 0i16..=1600, b in 0i16..=1600) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(compress_temp_c16(lo) <= compress_temp_c16(hi));
        prop_assert!(
            expand_temp_c16(compress_temp_c16(lo)) <= expand_temp_c16(compress_temp_c16(hi))
        );
    }

    #[test]
    fn codec_clamps_out_of_range(t in any::<i16>()) {
        if t < 0 {
            prop_assert_eq!(compress_temp_c16(t), compress_temp_c16(0));
        } else if t > 1600 {
            prop_assert_eq!(compress_temp_c16(t), compress_temp_c16(1600));
        }
    }

    #[test]
    fn smoothing_never_exceeds_inputs(old in any::<u8>(), new in any::<u8>(), seed in any::<u64>()) {
        let mut rng = fastrand::Rng::with_seed(seed);
        let smoothed = smooth_stats_value(old, new, &mut rng);
        prop_assert!(smoothed <= old.max(new));
        prop_assert!(smoothed >= old.min(new));
    }

    #[test]
    fn target_always_within_bounds(inputs in arb_target_inputs()) {
        let config = TrvConfig::default();
        let target = compute_target_temperature(&inputs, &config);
        prop_assert!((config.min_target_c..=config.max_target_c).contains(&target));
    }

    #[test]
    fn frost_mode_ignores_occupancy_and_prediction(inputs in arb_target_inputs()) {
        let config = TrvConfig::default();
        let frost = TargetInputs { mode: Mode::Frost, ..inputs };
        prop_assert_eq!(
            compute_target_temperature(&frost, &config),
            config.clamp_target(inputs.frost_target_c)
        );
    }

    /// Within the anti-seek windows the valve never reverses direction.
    #[test]
    fn valve_respects_antiseek_delays(
        temps in proptest::collection::vec(prop::option::weighted(0.9, 240i16..=400), 1..200),
        glacial in any::<bool>(),
    ) {
        let config = TrvConfig::default();
        let settings = PersistedSettings { glacial, ..PersistedSettings::default() };
        let mut valve = RadValve::new(&config, &settings);
        valve.set_target_temp_c(20);

        let reopen = u32::from(config.antiseek_valve_reopen_delay_m);
        let reclose = u32::from(config.antiseek_valve_reclose_delay_m);
        let mut last_close: Option<u32> = None;
        let mut last_open: Option<u32> = None;

        for (tick, temp) in temps.into_iter().enumerate() {
            let tick = tick as u32;
            let before = valve.percent_open();
            valve.compute_call_for_heat(temp);
            let after = valve.percent_open();

            if after > before {
                if let Some(closed_at) = last_close {
                    prop_assert!(tick - closed_at >= reopen, "reopened {} ticks after close", tick - closed_at);
                }
                last_open = Some(tick);
            } else if after < before {
                if let Some(opened_at) = last_open {
                    prop_assert!(tick - opened_at >= reclose, "closed {} ticks after open", tick - opened_at);
                }
                last_close = Some(tick);
            }

            let state = valve.state();
            prop_assert!(state.turndown_countdown_m == 0 || state.turnup_countdown_m == 0);
            prop_assert!(after <= valve.max_percent_open_allowed());
            prop_assert_eq!(valve.is_calling_for_heat(), after >= valve.min_percent_open());
            if temp.is_none() {
                prop_assert_eq!(after, before);
            }
        }
    }
}
