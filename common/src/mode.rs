use tracing::info;

use crate::{
    config::{Features, TrvConfig},
    types::{Bias, Mode},
};

/// FROST/WARM mode with the optional BAKE boost on top of WARM.
///
/// Callers are expected to debounce UI input before calling the setters.
#[derive(Debug, Clone)]
pub struct ModeControl {
    warm: bool,
    bake_countdown_m: u8,
    bake_max_m: u8,
    bake_supported: bool,
}

impl ModeControl {
    pub fn new(config: &TrvConfig, features: Features, warm: bool) -> Self {
        Self {
            warm,
            bake_countdown_m: 0,
            bake_max_m: config.bake_max_m,
            bake_supported: features.bake,
        }
    }

    pub fn mode(&self) -> Mode {
        if self.warm {
            Mode::Warm
        } else {
            Mode::Frost
        }
    }

    pub fn in_warm_mode(&self) -> bool {
        self.warm
    }

    /// Forces FROST or WARM immediately; FROST also cancels BAKE.
    /// Returns true if anything changed.
    pub fn set_warm_mode(&mut self, warm: bool) -> bool {
        let mut changed = self.warm != warm;
        self.warm = warm;
        if !warm && self.bake_countdown_m != 0 {
            self.bake_countdown_m = 0;
            changed = true;
        }
        if changed {
            info!(mode = self.mode().as_str(), "mode changed");
        }
        changed
    }

    /// Starts (or restarts) BAKE; ignored unless in WARM and BAKE is supported.
    pub fn start_bake(&mut self) -> bool {
        if !self.warm || !self.bake_supported {
            return false;
        }
        self.bake_countdown_m = self.bake_max_m;
        info!(minutes = self.bake_max_m, "bake started");
        true
    }

    pub fn cancel_bake(&mut self) {
        if self.bake_countdown_m != 0 {
            info!("bake cancelled");
        }
        self.bake_countdown_m = 0;
    }

    pub fn in_bake_mode(&self) -> bool {
        self.warm && self.bake_countdown_m != 0
    }

    pub fn bake_remaining_m(&self) -> u8 {
        self.bake_countdown_m
    }

    pub fn tick_minute(&mut self) {
        if self.bake_countdown_m == 1 {
            info!("bake finished");
        }
        self.bake_countdown_m = self.bake_countdown_m.saturating_sub(1);
    }
}

/// Eco when WARM is at or below the midpoint of the eco/comfort WARM bands, or
/// when FROST sits at or below the eco FROST band and WARM is short of comfort.
pub fn has_eco_bias(frost_target_c: u8, warm_target_c: u8, config: &TrvConfig) -> bool {
    let warm_midpoint = (u16::from(config.bias_eco_warm) + u16::from(config.bias_com_warm)) / 2;
    u16::from(warm_target_c) <= warm_midpoint
        || (warm_target_c < config.bias_com_warm && frost_target_c <= config.bias_eco_frost)
}

pub fn bias(frost_target_c: u8, warm_target_c: u8, config: &TrvConfig) -> Bias {
    if has_eco_bias(frost_target_c, warm_target_c, config) {
        Bias::Eco
    } else {
        Bias::Comfort
    }
}

pub fn is_eco_temperature(temp_c: u8, config: &TrvConfig) -> bool {
    temp_c <= config.bias_eco_warm
}

pub fn is_comfort_temperature(temp_c: u8, config: &TrvConfig) -> bool {
    temp_c >= config.bias_com_warm
}
