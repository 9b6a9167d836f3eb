/// Capability shared by every polled sensor and by the valve model.
pub trait Sensor {
    type Value: Copy;

    /// Polls the device and returns the fresh value. May be slow.
    fn read(&mut self) -> Self::Value;

    /// Value from the last [`Sensor::read`].
    fn get(&self) -> Self::Value;

    fn preferred_poll_interval_s(&self) -> u8 {
        60
    }

    /// Suggested key (with units) for reporting this value.
    fn tag(&self) -> Option<&'static str> {
        None
    }
}

/// Room temperature in 1/16 C; `None` when the sensor could not be read.
pub trait RoomTemperature: Sensor<Value = Option<i16>> {}

/// Ambient light level 0..=255 with a hysteresis-filtered lit flag.
pub trait AmbientLight: Sensor<Value = u8> {
    fn is_room_lit(&self) -> bool;
}

pub trait ValveActuator {
    fn set_percent_open(&mut self, percent: u8);

    /// True if the physical valve is open enough for real flow.
    fn is_really_open(&self) -> bool;
}
