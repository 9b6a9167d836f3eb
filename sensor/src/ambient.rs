use tracing::debug;
use trv_common::{AmbientLight, OccupancyEvents, Sensor};

use crate::input::{AnalogueInput, ADC_MAX};

/// At or below this raw level the room is dark.
pub const LDR_THR_LOW: u16 = 160;
/// Above this raw level the room is lit; between the two the flag holds.
pub const LDR_THR_HIGH: u16 = 200;

/// Light-dependent resistor reading with a hysteresis-filtered lit flag.
///
/// A sharp dark-to-lit transition, eg a light switched on, is weak evidence of
/// occupancy. The very first reading never counts as a transition.
pub struct AmbientLightSensor<A> {
    source: A,
    occupancy: Option<OccupancyEvents>,
    raw: u16,
    value: u8,
    room_lit: bool,
    dark_ticks: u8,
    seen_first: bool,
}

impl<A: AnalogueInput> AmbientLightSensor<A> {
    pub fn new(source: A, occupancy: Option<OccupancyEvents>) -> Self {
        Self {
            source,
            occupancy,
            raw: 0,
            value: 0,
            room_lit: false,
            dark_ticks: 0,
            seen_first: false,
        }
    }

    pub fn raw(&self) -> u16 {
        self.raw
    }

    /// Consecutive dark readings, saturating at 255.
    pub fn dark_ticks(&self) -> u8 {
        self.dark_ticks
    }
}

impl<A: AnalogueInput> Sensor for AmbientLightSensor<A> {
    type Value = u8;

    fn read(&mut self) -> u8 {
        let raw = self.source.read_raw().min(ADC_MAX);

        if raw <= LDR_THR_LOW {
            self.room_lit = false;
            self.dark_ticks = self.dark_ticks.saturating_add(1);
        } else if raw > LDR_THR_HIGH {
            if self.seen_first && !self.room_lit && self.raw < LDR_THR_LOW {
                debug!(from = self.raw, to = raw, "lights on");
                if let Some(occupancy) = &self.occupancy {
                    occupancy.mark_as_possibly_occupied();
                }
            }
            self.room_lit = true;
            self.dark_ticks = 0;
        }
        self.seen_first = true;
        self.raw = raw;

        // Drop the bottom two bits, ignoring jitter of a couple of counts.
        let scaled = (raw >> 2) as u8;
        if scaled != self.value && raw.abs_diff(u16::from(self.value) << 2) > 2 {
            self.value = scaled;
        }
        self.value
    }

    fn get(&self) -> u8 {
        self.value
    }

    fn tag(&self) -> Option<&'static str> {
        Some("L")
    }
}

impl<A: AnalogueInput> AmbientLight for AmbientLightSensor<A> {
    fn is_room_lit(&self) -> bool {
        self.room_lit
    }
}
