use tracing::{debug, info};

use crate::{
    config::{Features, PersistedSettings, RuntimeConfig, TrvConfig},
    error::{ConfigError, SetpointError},
    mode::{bias, has_eco_bias, ModeControl},
    occupancy::{NoOccupancy, OccupancyEvents, OccupancySignal, OccupancyTracker},
    schedule::Schedule,
    sensor::Sensor,
    setpoints::{FixedTargets, SettableTargets, TargetSource},
    stats::{MemoryStatsStore, Statistics, StatsSample, StatsStore},
    target::{compute_target_temperature, TargetInputs},
    types::{EngineAction, TrvStatus},
    valve::RadValve,
};

/// Minutes past the hour at which statistics are sampled; the last is the full sample.
const SUB_SAMPLE_MINUTES: [u8; 3] = [14, 29, 44];
const FULL_SAMPLE_MINUTE: u8 = 59;

/// Readings gathered by the host before each one-minute tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickInput {
    pub temp_c16: Option<i16>,
    pub ambient_light: Option<u8>,
    pub room_lit: bool,
    /// Local hour 0..=23.
    pub hour: u8,
    /// Local minute 0..=59.
    pub minute: u8,
}

pub struct TrvEngine<S = MemoryStatsStore> {
    config: TrvConfig,
    features: Features,
    modes: ModeControl,
    targets: Box<dyn TargetSource>,
    occupancy: Box<dyn OccupancySignal>,
    stats: Statistics<S>,
    valve: RadValve,
    schedule: Schedule,

    current_temp_c16: Option<i16>,
    ambient_light: Option<u8>,
    room_lit: bool,
    minute_of_day: u16,
    reported_calling_for_heat: Option<bool>,
}

impl<S: StatsStore> TrvEngine<S> {
    pub fn new(runtime: &RuntimeConfig, stats: Statistics<S>) -> Result<Self, ConfigError> {
        let config = runtime.trv.clone();
        config.validate()?;

        let mut settings = runtime.settings.clone();
        settings.sanitize(&config);
        let mut schedule = runtime.schedule.clone();
        schedule.normalize();

        let targets: Box<dyn TargetSource> = if runtime.features.settable_targets {
            Box::new(SettableTargets::new(
                &config,
                settings.frost_target_c,
                settings.warm_target_c,
            ))
        } else {
            Box::new(FixedTargets::new(&config))
        };
        let occupancy: Box<dyn OccupancySignal> = if runtime.features.occupancy {
            Box::new(OccupancyTracker::new(&config))
        } else {
            Box::new(NoOccupancy)
        };

        let mut engine = Self {
            modes: ModeControl::new(&config, runtime.features, settings.warm_mode),
            valve: RadValve::new(&config, &settings),
            features: runtime.features,
            targets,
            occupancy,
            stats,
            schedule,
            current_temp_c16: None,
            ambient_light: None,
            room_lit: false,
            minute_of_day: 0,
            reported_calling_for_heat: None,
            config,
        };
        engine.compute_target_temperature();
        Ok(engine)
    }

    /// Replaces the set-point source, eg with a temperature pot.
    pub fn with_targets(mut self, targets: Box<dyn TargetSource>) -> Self {
        self.targets = targets;
        self.compute_target_temperature();
        self
    }

    pub fn config(&self) -> &TrvConfig {
        &self.config
    }

    pub fn features(&self) -> Features {
        self.features
    }

    pub fn valve(&self) -> &RadValve {
        &self.valve
    }

    pub fn stats(&self) -> &Statistics<S> {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut Statistics<S> {
        &mut self.stats
    }

    pub fn occupancy(&self) -> &dyn OccupancySignal {
        self.occupancy.as_ref()
    }

    pub fn occupancy_events(&self) -> Option<OccupancyEvents> {
        self.occupancy.events()
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn current_temp_c16(&self) -> Option<i16> {
        self.current_temp_c16
    }

    pub fn target_temp_c(&self) -> u8 {
        self.valve.target_temp_c()
    }

    pub fn is_calling_for_heat(&self) -> bool {
        self.valve.is_calling_for_heat()
    }

    pub fn is_valve_moved(&self) -> bool {
        self.valve.is_valve_moved()
    }

    pub fn min_valve_pc_really_open(&self) -> u8 {
        self.valve.min_valve_pc_really_open()
    }

    pub fn set_min_valve_pc_really_open(&mut self, percent: u8) {
        self.valve.set_min_valve_pc_really_open(percent);
    }

    pub fn set_glacial_mode(&mut self, glacial: bool) {
        self.valve.set_glacial_mode(glacial);
    }

    pub fn in_warm_mode(&self) -> bool {
        self.modes.in_warm_mode()
    }

    pub fn set_warm_mode(&mut self, warm: bool) -> bool {
        let changed = self.modes.set_warm_mode(warm);
        self.compute_target_temperature();
        changed
    }

    pub fn start_bake(&mut self) -> bool {
        let started = self.modes.start_bake();
        self.compute_target_temperature();
        started
    }

    pub fn cancel_bake(&mut self) {
        self.modes.cancel_bake();
        self.compute_target_temperature();
    }

    pub fn in_bake_mode(&self) -> bool {
        self.modes.in_bake_mode()
    }

    pub fn has_eco_bias(&self) -> bool {
        has_eco_bias(
            self.targets.frost_target_c(),
            self.targets.warm_target_c(),
            &self.config,
        )
    }

    pub fn frost_target_c(&self) -> u8 {
        self.config.clamp_target(self.targets.frost_target_c())
    }

    pub fn warm_target_c(&self) -> u8 {
        self.config.clamp_target(self.targets.warm_target_c())
    }

    pub fn set_frost_target_c(&mut self, temp_c: u8) -> Result<(), SetpointError> {
        self.targets.set_frost_target_c(temp_c)?;
        self.compute_target_temperature();
        Ok(())
    }

    pub fn set_warm_target_c(&mut self, temp_c: u8) -> Result<(), SetpointError> {
        self.targets.set_warm_target_c(temp_c)?;
        self.compute_target_temperature();
        Ok(())
    }

    pub fn mark_as_occupied(&self) {
        self.occupancy.mark_as_occupied();
    }

    pub fn mark_as_possibly_occupied(&self) {
        self.occupancy.mark_as_possibly_occupied();
    }

    /// Slot 0 or 1; false if the slot or start minute is invalid.
    pub fn set_schedule_programme(&mut self, which: usize, start_minutes: u16) -> bool {
        let ok = self.schedule.set_programme(which, start_minutes);
        if ok {
            self.compute_target_temperature();
        }
        ok
    }

    pub fn clear_schedule_programme(&mut self, which: usize) {
        self.schedule.clear_programme(which);
        self.compute_target_temperature();
    }

    pub fn is_any_schedule_on_warm_now(&self) -> bool {
        let period_m = Schedule::on_period_m(&self.config, !self.has_eco_bias());
        self.schedule
            .is_any_schedule_on_warm_now(self.minute_of_day, period_m)
    }

    pub fn target_inputs(&self) -> TargetInputs {
        TargetInputs {
            mode: self.modes.mode(),
            in_bake: self.modes.in_bake_mode(),
            frost_target_c: self.targets.frost_target_c(),
            warm_target_c: self.targets.warm_target_c(),
            likely_recently_occupied: false,
            likely_occupied: false,
            likely_unoccupied: false,
            vacancy_minutes: 0,
            room_lit: self.room_lit,
            warm_predicted: self
                .stats
                .should_be_warmed_at_hour(self.stats.current_hour()),
            schedule_warm_now: self.is_any_schedule_on_warm_now(),
        }
        .with_occupancy(self.occupancy.as_ref())
    }

    /// Recomputes the target and hands it to the valve. Safe to call at any time.
    pub fn compute_target_temperature(&mut self) -> u8 {
        let target = compute_target_temperature(&self.target_inputs(), &self.config);
        if target != self.valve.target_temp_c() {
            debug!(target_c = target, "target temperature changed");
        }
        self.valve.set_target_temp_c(target);
        target
    }

    /// One control tick; call once per minute on the wall-clock boundary.
    pub fn tick(&mut self, input: TickInput) -> Vec<EngineAction> {
        let mut actions = Vec::new();

        self.current_temp_c16 = input.temp_c16;
        self.ambient_light = input.ambient_light;
        self.room_lit = input.room_lit;
        self.stats.set_current_hour(input.hour);
        self.minute_of_day = u16::from(input.hour % 24) * 60 + u16::from(input.minute % 60);

        self.modes.tick_minute();
        self.occupancy.tick_minute();
        self.apply_schedule_start();
        self.sample_stats_if_due(input.hour, input.minute);

        self.compute_target_temperature();
        self.valve.set_room_temperature(input.temp_c16);
        let percent = self.valve.read();

        if self.valve.is_valve_moved() {
            actions.push(EngineAction::SetValvePercent(percent));
        }
        let calling = self.valve.is_calling_for_heat();
        if self.reported_calling_for_heat != Some(calling) {
            self.reported_calling_for_heat = Some(calling);
            info!(calling_for_heat = calling, "boiler call changed");
            actions.push(EngineAction::CallForHeat(calling));
        }

        actions
    }

    fn apply_schedule_start(&mut self) {
        if self.modes.in_warm_mode()
            || !self
                .schedule
                .is_any_schedule_starting_now(self.minute_of_day)
        {
            return;
        }
        info!(minute_of_day = self.minute_of_day, "schedule start, switching to WARM");
        self.modes.set_warm_mode(true);
    }

    fn sample_stats_if_due(&mut self, hour: u8, minute: u8) {
        let full = if minute == FULL_SAMPLE_MINUTE {
            true
        } else if SUB_SAMPLE_MINUTES.contains(&minute) {
            false
        } else {
            return;
        };
        self.sample_stats(full, hour);
    }

    /// Feeds the latest readings into the hourly statistics.
    pub fn sample_stats(&mut self, full_sample: bool, hour: u8) {
        let sample = StatsSample {
            temp_c16: self.current_temp_c16,
            ambient_light: self.ambient_light,
            occupancy_pc: self
                .features
                .occupancy
                .then(|| self.occupancy.occupancy_percent()),
        };
        self.stats.sample_stats(full_sample, hour, sample);
    }

    /// Snapshot of the user-changeable state worth keeping across restarts.
    pub fn settings(&self) -> PersistedSettings {
        PersistedSettings {
            frost_target_c: self.frost_target_c(),
            warm_target_c: self.warm_target_c(),
            min_valve_pc_really_open: self.valve.min_valve_pc_override(),
            glacial: self.valve.in_glacial_mode(),
            warm_mode: self.modes.in_warm_mode(),
        }
    }

    pub fn status(&self) -> TrvStatus {
        let valve = self.valve.state();
        let hour = self.stats.current_hour();
        TrvStatus {
            current_temp_c16: self.current_temp_c16,
            target_temp_c: valve.target_temp_c,
            frost_target_c: self.frost_target_c(),
            warm_target_c: self.warm_target_c(),
            mode: self.modes.mode().as_str(),
            bias: bias(self.frost_target_c(), self.warm_target_c(), &self.config).as_str(),
            bake_active: self.modes.in_bake_mode(),
            bake_remaining_min: self.modes.bake_remaining_m(),
            percent_open: valve.percent_open,
            calling_for_heat: valve.calling_for_heat,
            valve_moved: valve.valve_moved,
            min_valve_pc_really_open: self.valve.min_valve_pc_really_open(),
            valve_really_open: self.valve.is_controlled_valve_really_open(),
            glacial: valve.glacial,
            room_lit: self.room_lit,
            occupancy_pc: self.occupancy.occupancy_percent(),
            two_bit_occupancy: self.occupancy.two_bit_occupancy_value(),
            vacancy_h: self.occupancy.vacancy_h(),
            current_hour: hour,
            warm_predicted: self.stats.should_be_warmed_at_hour(hour),
            schedule_warm_now: self.is_any_schedule_on_warm_now(),
        }
    }
}
