//! Temperature dial: a noisy potentiometer mapped onto the WARM target.
//!
//! The reduced-noise position only moves once the reading has shifted by at
//! least [`RN_HYST`], which keeps an ageing carbon track from hunting. The
//! extreme ends of the travel are reserved for forcing FROST and starting BAKE.

use std::sync::{
    atomic::{AtomicU8, Ordering},
    Arc,
};

use tracing::{debug, info};
use trv_common::{Sensor, SetpointError, StatsStore, TargetSource, TrvConfig, TrvEngine};

use crate::input::{AnalogueInput, ADC_MAX};

/// Minimum change in the reduced-noise position.
pub const RN_HYST: u8 = 8;
/// Width of the FROST (bottom) and BAKE (top) end zones.
pub const RN_FRBO: u8 = if 2 * RN_HYST > 8 { 2 * RN_HYST } else { 8 };

/// Mode change requested by moving the dial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PotAction {
    ForceFrost,
    StartBake,
    ForceWarm,
}

impl PotAction {
    pub fn apply<S: StatsStore>(self, engine: &mut TrvEngine<S>) {
        match self {
            Self::ForceFrost => {
                engine.set_warm_mode(false);
            }
            Self::StartBake => {
                engine.set_warm_mode(true);
                engine.start_bake();
            }
            Self::ForceWarm => {
                engine.set_warm_mode(true);
            }
        }
    }
}

pub struct TemperaturePot<A> {
    source: A,
    raw: u16,
    position: Arc<AtomicU8>,
    seen_first: bool,
    pending: Option<PotAction>,
}

impl<A: AnalogueInput> TemperaturePot<A> {
    pub fn new(source: A) -> Self {
        Self {
            source,
            raw: 0,
            position: Arc::new(AtomicU8::new(0)),
            seen_first: false,
            pending: None,
        }
    }

    pub fn raw(&self) -> u16 {
        self.raw
    }

    /// Mode change from the last movement, if any; cleared on read.
    pub fn take_action(&mut self) -> Option<PotAction> {
        self.pending.take()
    }

    /// Set-point source following this dial.
    pub fn targets(&self, config: &TrvConfig) -> PotTargets {
        PotTargets {
            position: Arc::clone(&self.position),
            config: config.clone(),
            frost_c: config.default_frost_target_c(),
        }
    }
}

impl<A: AnalogueInput> Sensor for TemperaturePot<A> {
    type Value = u8;

    fn read(&mut self) -> u8 {
        let raw = self.source.read_raw().min(ADC_MAX);
        self.raw = raw;

        let old = self.position.load(Ordering::Acquire);
        let shifted = (raw >> 2) as u8;
        if shifted.abs_diff(old) < RN_HYST {
            self.seen_first = true;
            return old;
        }
        self.position.store(shifted, Ordering::Release);

        // The resting position at power-up is not a user action.
        if !self.seen_first {
            self.seen_first = true;
            return shifted;
        }

        let action = if shifted < RN_FRBO {
            Some(PotAction::ForceFrost)
        } else if shifted > u8::MAX - RN_FRBO {
            Some(PotAction::StartBake)
        } else if shifted > old {
            Some(PotAction::ForceWarm)
        } else {
            None
        };
        debug!(from = old, to = shifted, ?action, "dial moved");
        if action.is_some() {
            self.pending = action;
        }
        shifted
    }

    fn get(&self) -> u8 {
        self.position.load(Ordering::Acquire)
    }

    fn tag(&self) -> Option<&'static str> {
        Some("tp")
    }
}

/// WARM target for a dial position: eco - 1 C at the bottom to comfort + 1 C at the top.
pub fn compute_warm_target_c(position: u8, config: &TrvConfig) -> u8 {
    let low = config.bias_eco_warm.saturating_sub(1);
    let high = config.bias_com_warm.saturating_add(1);
    let bands = u16::from(high.saturating_sub(low)) + 1;
    let offset = (u16::from(position) * bands) >> 8;
    config.clamp_target(low.saturating_add(offset as u8))
}

/// Targets read live from the dial; FROST stays settable as a floor.
#[derive(Debug, Clone)]
pub struct PotTargets {
    position: Arc<AtomicU8>,
    config: TrvConfig,
    frost_c: u8,
}

impl TargetSource for PotTargets {
    fn frost_target_c(&self) -> u8 {
        self.frost_c
    }

    fn warm_target_c(&self) -> u8 {
        compute_warm_target_c(self.position.load(Ordering::Acquire), &self.config)
            .max(self.frost_c)
    }

    fn set_frost_target_c(&mut self, temp_c: u8) -> Result<(), SetpointError> {
        if !(self.config.min_target_c..=self.config.max_target_c).contains(&temp_c) {
            return Err(SetpointError::OutOfRange {
                value: temp_c,
                min: self.config.min_target_c,
                max: self.config.max_target_c,
            });
        }
        self.frost_c = temp_c;
        info!(frost_c = temp_c, "frost floor set");
        Ok(())
    }
}
