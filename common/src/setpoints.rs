use tracing::info;

use crate::{config::TrvConfig, error::SetpointError};

/// Where the FROST and WARM targets come from.
pub trait TargetSource: Send {
    fn frost_target_c(&self) -> u8;
    fn warm_target_c(&self) -> u8;

    fn set_frost_target_c(&mut self, _temp_c: u8) -> Result<(), SetpointError> {
        Err(SetpointError::NotSettable)
    }

    fn set_warm_target_c(&mut self, _temp_c: u8) -> Result<(), SetpointError> {
        Err(SetpointError::NotSettable)
    }
}

/// Compile-time targets for units without any set-point input.
#[derive(Debug, Clone, Copy)]
pub struct FixedTargets {
    frost_c: u8,
    warm_c: u8,
}

impl FixedTargets {
    pub fn new(config: &TrvConfig) -> Self {
        Self {
            frost_c: config.default_frost_target_c(),
            warm_c: config.default_warm_target_c(),
        }
    }
}

impl TargetSource for FixedTargets {
    fn frost_target_c(&self) -> u8 {
        self.frost_c
    }

    fn warm_target_c(&self) -> u8 {
        self.warm_c
    }
}

/// Targets changed remotely; FROST may never exceed WARM.
#[derive(Debug, Clone)]
pub struct SettableTargets {
    frost_c: u8,
    warm_c: u8,
    min_c: u8,
    max_c: u8,
}

impl SettableTargets {
    pub fn new(config: &TrvConfig, frost_c: u8, warm_c: u8) -> Self {
        let frost_c = config.clamp_target(frost_c);
        let warm_c = config.clamp_target(warm_c).max(frost_c);
        Self {
            frost_c,
            warm_c,
            min_c: config.min_target_c,
            max_c: config.max_target_c,
        }
    }

    fn check_range(&self, temp_c: u8) -> Result<(), SetpointError> {
        if (self.min_c..=self.max_c).contains(&temp_c) {
            Ok(())
        } else {
            Err(SetpointError::OutOfRange {
                value: temp_c,
                min: self.min_c,
                max: self.max_c,
            })
        }
    }
}

impl TargetSource for SettableTargets {
    fn frost_target_c(&self) -> u8 {
        self.frost_c
    }

    fn warm_target_c(&self) -> u8 {
        self.warm_c
    }

    fn set_frost_target_c(&mut self, temp_c: u8) -> Result<(), SetpointError> {
        self.check_range(temp_c)?;
        if temp_c > self.warm_c {
            return Err(SetpointError::FrostAboveWarm {
                frost: temp_c,
                warm: self.warm_c,
            });
        }
        self.frost_c = temp_c;
        info!(frost_c = temp_c, "frost target set");
        Ok(())
    }

    fn set_warm_target_c(&mut self, temp_c: u8) -> Result<(), SetpointError> {
        self.check_range(temp_c)?;
        if temp_c < self.frost_c {
            return Err(SetpointError::FrostAboveWarm {
                frost: self.frost_c,
                warm: temp_c,
            });
        }
        self.warm_c = temp_c;
        info!(warm_c = temp_c, "warm target set");
        Ok(())
    }
}
