//! End-to-end control scenarios driven through `TrvEngine`.

use pretty_assertions::assert_eq;
use trv_common::{
    EngineAction, MemoryStatsStore, OccupancySignal, OccupancyTracker, RuntimeConfig,
    Statistics, StatsSet, StatsStore, TickInput, TrvConfig, TrvEngine,
};

fn engine() -> TrvEngine {
    TrvEngine::new(
        &RuntimeConfig::default(),
        Statistics::with_seed(MemoryStatsStore::new(), 42),
    )
    .unwrap()
}

fn at(temp_c16: i16, minute: u32) -> TickInput {
    TickInput {
        temp_c16: Some(temp_c16),
        ambient_light: Some(150),
        room_lit: true,
        hour: ((minute / 60) % 24) as u8,
        minute: (minute % 60) as u8,
    }
}

#[test]
fn warm_occupied_cold_room_opens_and_calls_for_heat() {
    let mut engine = engine();
    engine.set_warm_target_c(21).unwrap();
    engine.set_warm_mode(true);
    engine.mark_as_occupied();

    let actions = engine.tick(at(18 * 16, 600));

    assert!(engine.valve().percent_open() > 0);
    assert!(engine.is_calling_for_heat());
    assert!(engine.valve().percent_open() >= engine.min_valve_pc_really_open());
    assert!(engine.is_valve_moved());
    assert!(actions.contains(&EngineAction::CallForHeat(true)));
}

#[test]
fn frost_warm_room_closes_valve() {
    let mut engine = engine();
    engine.set_warm_target_c(21).unwrap();
    engine.set_warm_mode(true);
    engine.mark_as_occupied();
    for minute in 0..10 {
        engine.tick(at(18 * 16, minute));
    }
    assert!(engine.is_calling_for_heat());

    engine.set_warm_mode(false);
    assert_eq!(engine.target_temp_c(), 7);

    let mut last = engine.valve().percent_open();
    for minute in 10..40 {
        engine.tick(at(10 * 16, minute));
        let now = engine.valve().percent_open();
        assert!(now <= last);
        last = now;
    }
    assert_eq!(last, 0);
    assert!(!engine.is_calling_for_heat());
}

#[test]
fn bake_lasts_thirty_minutes() {
    let mut engine = engine();
    engine.set_warm_target_c(21).unwrap();
    engine.set_warm_mode(true);
    assert!(engine.start_bake());
    assert_eq!(engine.target_temp_c(), 26);

    for minute in 0..29 {
        engine.tick(at(20 * 16, minute));
        assert_eq!(engine.target_temp_c(), 26);
    }
    engine.tick(at(20 * 16, 29));
    assert!(!engine.in_bake_mode());
    assert!(engine.target_temp_c() <= 21);
}

#[test]
fn frost_ends_bake_early() {
    let mut engine = engine();
    engine.set_warm_mode(true);
    engine.start_bake();
    engine.tick(at(20 * 16, 0));

    engine.set_warm_mode(false);
    assert!(!engine.in_bake_mode());
    assert_eq!(engine.target_temp_c(), 7);

    engine.set_warm_mode(true);
    assert!(!engine.in_bake_mode());
}

#[test]
fn occupancy_decays_after_timeout() {
    let config = TrvConfig::default();
    let mut tracker = OccupancyTracker::new(&config);
    tracker.mark_as_occupied();
    for _ in 0..config.occupation_timeout_m() - 1 {
        tracker.tick_minute();
    }
    assert!(tracker.is_likely_occupied());
    tracker.tick_minute();
    assert!(!tracker.is_likely_occupied());
}

#[test]
fn vacant_room_sets_back_over_time() {
    let mut engine = engine();
    engine.set_warm_target_c(18).unwrap();
    engine.set_warm_mode(true);
    engine.mark_as_occupied();

    engine.tick(at(18 * 16, 0));
    assert_eq!(engine.target_temp_c(), 18);

    // Occupancy lapses after 50 minutes, full setback 50 minutes later.
    for minute in 1..60 {
        engine.tick(at(18 * 16, minute));
    }
    assert_eq!(engine.target_temp_c(), 16);
    for minute in 60..110 {
        engine.tick(at(18 * 16, minute));
    }
    assert_eq!(engine.target_temp_c(), 15);

    engine.mark_as_occupied();
    engine.tick(at(18 * 16, 110));
    assert_eq!(engine.target_temp_c(), 18);
}

#[test]
fn learned_warm_hour_suppresses_setback() {
    let mut store = MemoryStatsStore::new();
    for hour in 0..24u8 {
        let occupancy = if hour == 7 { 90 } else { 10 };
        store.put(StatsSet::OccupancyByHourSmoothed, hour, occupancy);
    }
    let mut engine =
        TrvEngine::new(&RuntimeConfig::default(), Statistics::with_seed(store, 1)).unwrap();
    engine.set_warm_mode(true);

    // Dark and unoccupied: set back outside the learned hour only.
    let mut dark = at(18 * 16, 6 * 60);
    dark.room_lit = false;
    engine.tick(dark);
    assert_eq!(engine.target_temp_c(), 16);

    dark.hour = 7;
    engine.tick(dark);
    assert_eq!(engine.target_temp_c(), 18);
}

#[test]
fn unknown_temperature_never_opens() {
    let mut engine = engine();
    engine.set_warm_target_c(21).unwrap();
    engine.set_warm_mode(true);
    engine.mark_as_occupied();

    for minute in 0..20 {
        let mut input = at(0, minute);
        input.temp_c16 = None;
        engine.tick(input);
        assert_eq!(engine.valve().percent_open(), 0);
    }
}
