use std::sync::{
    atomic::{AtomicU16, Ordering},
    Arc,
};

/// Full-scale value of a 10-bit ADC reading.
pub const ADC_MAX: u16 = 1023;

/// A raw analogue channel, eg an LDR divider or a potentiometer.
pub trait AnalogueInput {
    /// Raw reading in `0..=ADC_MAX`; larger values are clamped by callers.
    fn read_raw(&mut self) -> u16;
}

impl<F> AnalogueInput for F
where
    F: FnMut() -> u16,
{
    fn read_raw(&mut self) -> u16 {
        self()
    }
}

/// Analogue level shared between a producer (simulation, API) and a sensor.
#[derive(Debug, Clone, Default)]
pub struct SharedAnalogue {
    level: Arc<AtomicU16>,
}

impl SharedAnalogue {
    pub fn new(level: u16) -> Self {
        Self {
            level: Arc::new(AtomicU16::new(level.min(ADC_MAX))),
        }
    }

    pub fn set(&self, level: u16) {
        self.level.store(level.min(ADC_MAX), Ordering::Release);
    }

    pub fn get(&self) -> u16 {
        self.level.load(Ordering::Acquire)
    }
}

impl AnalogueInput for SharedAnalogue {
    fn read_raw(&mut self) -> u16 {
        self.get()
    }
}
