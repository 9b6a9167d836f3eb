//! Lumped thermal model of one heated room, for running the controller on a host.
//!
//! Each minute the room gains heat in proportion to valve opening and loses it
//! in proportion to the difference from outside. Lights follow a simple
//! day/night pattern with a little ADC noise.

use serde::{Deserialize, Serialize};
use tracing::debug;
use trv_common::{RoomTemperature, Sensor, ValveActuator};

use crate::input::{SharedAnalogue, ADC_MAX};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoomModel {
    pub outside_c: f32,
    /// Degrees per minute gained with the valve fully open.
    pub heat_gain_c_per_min: f32,
    /// Fraction of the inside/outside difference lost per minute.
    pub loss_per_min: f32,
    /// Opening below which the valve passes no useful flow.
    pub really_open_pc: u8,
    pub lit_from_hour: u8,
    pub lit_until_hour: u8,
}

impl Default for RoomModel {
    fn default() -> Self {
        Self {
            outside_c: 5.0,
            heat_gain_c_per_min: 0.12,
            loss_per_min: 0.004,
            really_open_pc: 10,
            lit_from_hour: 7,
            lit_until_hour: 23,
        }
    }
}

pub struct SimulatedRoom {
    model: RoomModel,
    rng: fastrand::Rng,
    temp_c: f32,
    valve_pc: u8,
    sensor_fault: bool,
    last_reading: Option<i16>,
    light: SharedAnalogue,
}

impl SimulatedRoom {
    pub fn new(model: RoomModel, initial_c: f32, seed: u64) -> Self {
        Self {
            model,
            rng: fastrand::Rng::with_seed(seed),
            temp_c: initial_c,
            valve_pc: 0,
            sensor_fault: false,
            last_reading: None,
            light: SharedAnalogue::new(0),
        }
    }

    /// Light level feeding the simulated LDR.
    pub fn light(&self) -> SharedAnalogue {
        self.light.clone()
    }

    pub fn model(&self) -> &RoomModel {
        &self.model
    }

    pub fn sensor_fault(&self) -> bool {
        self.sensor_fault
    }

    pub fn temp_c(&self) -> f32 {
        self.temp_c
    }

    pub fn valve_pc(&self) -> u8 {
        self.valve_pc
    }

    /// While set, temperature reads fail.
    pub fn set_sensor_fault(&mut self, fault: bool) {
        self.sensor_fault = fault;
    }

    pub fn step_minute(&mut self, hour: u8) {
        let flow = if self.valve_pc >= self.model.really_open_pc {
            f32::from(self.valve_pc) / 100.0
        } else {
            0.0
        };
        let gain = flow * self.model.heat_gain_c_per_min;
        let loss = (self.temp_c - self.model.outside_c) * self.model.loss_per_min;
        self.temp_c += gain - loss;

        let lit = (self.model.lit_from_hour..self.model.lit_until_hour).contains(&hour);
        let base: u16 = if lit { 600 } else { 40 };
        let noise = self.rng.u16(0..8);
        self.light.set((base + noise).min(ADC_MAX));

        debug!(
            temp_c = self.temp_c,
            valve_pc = self.valve_pc,
            lit,
            "room stepped"
        );
    }
}

impl Sensor for SimulatedRoom {
    type Value = Option<i16>;

    fn read(&mut self) -> Option<i16> {
        self.last_reading = if self.sensor_fault {
            None
        } else {
            // Sensor resolution is 1/16 C.
            Some((self.temp_c * 16.0).round() as i16)
        };
        self.last_reading
    }

    fn get(&self) -> Option<i16> {
        self.last_reading
    }

    fn tag(&self) -> Option<&'static str> {
        Some("T|C16")
    }
}

impl RoomTemperature for SimulatedRoom {}

impl ValveActuator for SimulatedRoom {
    fn set_percent_open(&mut self, percent: u8) {
        self.valve_pc = percent.min(100);
    }

    fn is_really_open(&self) -> bool {
        self.valve_pc >= self.model.really_open_pc
    }
}
