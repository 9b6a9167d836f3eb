//! Radiator valve control: slow open, fast close, with anti-seek delays.

use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    config::{PersistedSettings, TrvConfig},
    sensor::Sensor,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValveState {
    #[serde(rename = "targetTempC")]
    pub target_temp_c: u8,
    #[serde(rename = "percentOpen")]
    pub percent_open: u8,
    #[serde(rename = "callingForHeat")]
    pub calling_for_heat: bool,
    #[serde(rename = "valveMoved")]
    pub valve_moved: bool,
    #[serde(rename = "turndownCountdownM")]
    pub turndown_countdown_m: u8,
    #[serde(rename = "turnupCountdownM")]
    pub turnup_countdown_m: u8,
    pub glacial: bool,
}

#[derive(Debug, Clone)]
pub struct RadValve {
    config: TrvConfig,
    state: ValveState,
    min_valve_pc_override: Option<u8>,
    room_temp_c16: Option<i16>,
    // Draining flow after a call for heat ended.
    lingering: bool,
}

impl RadValve {
    pub fn new(config: &TrvConfig, settings: &PersistedSettings) -> Self {
        let mut valve = Self {
            config: config.clone(),
            state: ValveState {
                target_temp_c: config.default_frost_target_c(),
                percent_open: 0,
                calling_for_heat: false,
                valve_moved: false,
                turndown_countdown_m: 0,
                turnup_countdown_m: 0,
                glacial: settings.glacial,
            },
            min_valve_pc_override: None,
            room_temp_c16: None,
            lingering: false,
        };
        if let Some(pc) = settings.min_valve_pc_really_open {
            valve.set_min_valve_pc_really_open(pc);
        }
        valve
    }

    pub fn state(&self) -> &ValveState {
        &self.state
    }

    pub fn target_temp_c(&self) -> u8 {
        self.state.target_temp_c
    }

    pub fn set_target_temp_c(&mut self, temp_c: u8) {
        self.state.target_temp_c = self.config.clamp_target(temp_c);
    }

    pub fn percent_open(&self) -> u8 {
        self.state.percent_open
    }

    pub fn is_calling_for_heat(&self) -> bool {
        self.state.calling_for_heat
    }

    /// True if the last tick changed the valve position.
    pub fn is_valve_moved(&self) -> bool {
        self.state.valve_moved
    }

    pub fn in_glacial_mode(&self) -> bool {
        self.state.glacial
    }

    pub fn set_glacial_mode(&mut self, glacial: bool) {
        self.state.glacial = glacial;
    }

    pub fn min_valve_pc_really_open(&self) -> u8 {
        self.min_valve_pc_override
            .unwrap_or(self.config.default_min_valve_pc_really_open)
    }

    pub fn min_valve_pc_override(&self) -> Option<u8> {
        self.min_valve_pc_override
    }

    /// Values outside 1..=100 clear the override and restore the default.
    pub fn set_min_valve_pc_really_open(&mut self, percent: u8) {
        if (1..=100).contains(&percent) {
            self.min_valve_pc_override = Some(percent);
        } else {
            self.min_valve_pc_override = None;
        }
    }

    pub fn min_percent_open(&self) -> u8 {
        self.min_valve_pc_really_open()
    }

    pub fn max_percent_open_allowed(&self) -> u8 {
        self.config.max_valve_pc_open
    }

    pub fn is_controlled_valve_really_open(&self) -> bool {
        self.state.percent_open >= self.min_percent_open()
    }

    /// Latest room temperature for the next [`Sensor::read`].
    pub fn set_room_temperature(&mut self, temp_c16: Option<i16>) {
        self.room_temp_c16 = temp_c16;
    }

    /// One control tick. Returns true if the valve moved.
    pub fn compute_call_for_heat(&mut self, temp_c16: Option<i16>) -> bool {
        self.room_temp_c16 = temp_c16;
        let before = self.state.percent_open;

        self.state.turndown_countdown_m = self.state.turndown_countdown_m.saturating_sub(1);
        self.state.turnup_countdown_m = self.state.turnup_countdown_m.saturating_sub(1);

        let after = match temp_c16 {
            Some(temp_c16) => self.compute_required_percent_open(temp_c16, before),
            None => {
                warn!("room temperature unknown, holding valve");
                before
            }
        };

        self.state.percent_open = after;
        self.state.valve_moved = after != before;
        self.state.calling_for_heat = after >= self.min_percent_open();
        if self.state.valve_moved {
            debug!(
                from = before,
                to = after,
                calling_for_heat = self.state.calling_for_heat,
                "valve moved"
            );
        }
        self.state.valve_moved
    }

    fn compute_required_percent_open(&mut self, temp_c16: i16, before: u8) -> u8 {
        let target_c16 = i16::from(self.state.target_temp_c) * 16;
        let max_open = self.max_percent_open_allowed();
        let min_open = self.min_percent_open();

        if temp_c16 < target_c16 {
            if before >= max_open {
                return max_open;
            }
            if self.state.turndown_countdown_m != 0 {
                debug!(
                    remaining_m = self.state.turndown_countdown_m,
                    "reopen deferred"
                );
                return before;
            }
            let next = if self.state.glacial {
                before.saturating_add(self.config.valve_glacial_slew_pc)
            } else if before < min_open {
                min_open
            } else {
                before.saturating_add(self.config.valve_open_slew_pc)
            };
            self.state.turnup_countdown_m = self.config.antiseek_valve_reclose_delay_m;
            self.state.turndown_countdown_m = 0;
            self.lingering = false;
            return next.min(max_open);
        }

        let close_at = target_c16.saturating_add(i16::from(self.config.hysteresis_c16));
        if temp_c16 >= close_at {
            if before == 0 {
                return 0;
            }
            if self.state.turnup_countdown_m != 0 {
                debug!(
                    remaining_m = self.state.turnup_countdown_m,
                    "close deferred"
                );
                return before;
            }
            let next = if !self.config.valve_turn_off_linger {
                0
            } else if before >= min_open {
                // Stop calling for heat but leave flow for pump overrun.
                self.lingering = true;
                min_open.saturating_sub(1)
            } else if self.lingering {
                before.saturating_sub(self.linger_step_pc())
            } else {
                0
            };
            if next == 0 {
                self.lingering = false;
            }
            self.state.turndown_countdown_m = self.config.antiseek_valve_reopen_delay_m;
            self.state.turnup_countdown_m = 0;
            return next;
        }

        before
    }

    /// Step that drains the linger position within the boiler run-on time.
    fn linger_step_pc(&self) -> u8 {
        let linger_pc = u16::from(self.min_percent_open().saturating_sub(1));
        let run_on_m = u16::from(self.config.max_run_on_time_m.max(1));
        linger_pc.div_ceil(run_on_m).max(1) as u8
    }
}

impl Sensor for RadValve {
    type Value = u8;

    fn read(&mut self) -> u8 {
        self.compute_call_for_heat(self.room_temp_c16);
        self.state.percent_open
    }

    fn get(&self) -> u8 {
        self.state.percent_open
    }

    fn tag(&self) -> Option<&'static str> {
        Some("v|%")
    }
}
