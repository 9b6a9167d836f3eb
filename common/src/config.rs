use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, schedule::Schedule};

/// Control constants. Defaults are the shipped values for a domestic radiator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrvConfig {
    pub min_target_c: u8,
    pub max_target_c: u8,
    pub bias_eco_frost: u8,
    pub bias_com_frost: u8,
    pub bias_eco_warm: u8,
    pub bias_com_warm: u8,
    pub safe_room_temperature: u8,
    pub bake_uplift: u8,
    pub bake_max_m: u8,
    pub setback_default: u8,
    pub setback_eco: u8,
    pub setback_full: u8,
    pub setback_full_m: u8,
    pub antiseek_valve_reclose_delay_m: u8,
    pub antiseek_valve_reopen_delay_m: u8,
    pub default_min_valve_pc_really_open: u8,
    pub max_valve_pc_open: u8,
    pub max_run_on_time_m: u8,
    pub valve_turn_off_linger: bool,
    /// Width of the dead band above target, in 1/16 C.
    pub hysteresis_c16: u8,
    pub valve_open_slew_pc: u8,
    pub valve_glacial_slew_pc: u8,
    pub learned_on_period_m: u8,
    pub learned_on_period_comfort_m: u8,
}

impl Default for TrvConfig {
    fn default() -> Self {
        Self {
            min_target_c: 5,
            max_target_c: 95,
            bias_eco_frost: 7,
            bias_com_frost: 12,
            bias_eco_warm: 17,
            bias_com_warm: 21,
            safe_room_temperature: 18,
            bake_uplift: 5,
            bake_max_m: 30,
            setback_default: 1,
            setback_eco: 2,
            setback_full: 3,
            setback_full_m: 50,
            antiseek_valve_reclose_delay_m: 4,
            antiseek_valve_reopen_delay_m: 8,
            default_min_valve_pc_really_open: 10,
            max_valve_pc_open: 100,
            max_run_on_time_m: 5,
            valve_turn_off_linger: true,
            hysteresis_c16: 8,
            valve_open_slew_pc: 5,
            valve_glacial_slew_pc: 1,
            learned_on_period_m: 60,
            learned_on_period_comfort_m: 120,
        }
    }
}

impl TrvConfig {
    /// Minutes a room stays "occupied" after strong evidence.
    pub fn occupation_timeout_m(&self) -> u8 {
        self.setback_full_m.max(30)
    }

    /// Countdown level above which occupancy counts as recent.
    pub fn occupation_recent_threshold_m(&self) -> u8 {
        ((u16::from(self.occupation_timeout_m()) * 2) / 3) as u8
    }

    pub fn default_frost_target_c(&self) -> u8 {
        self.bias_eco_frost.max(self.min_target_c)
    }

    pub fn default_warm_target_c(&self) -> u8 {
        self.bias_eco_warm.max(self.safe_room_temperature)
    }

    pub fn clamp_target(&self, temp_c: u8) -> u8 {
        temp_c.clamp(self.min_target_c, self.max_target_c)
    }

    /// Checks every cross-constant ordering rule; call once at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_target_c == 0 {
            return Err(ConfigError::Zero {
                name: "min_target_c",
            });
        }
        if self.min_target_c >= self.max_target_c {
            return Err(ConfigError::TargetBounds {
                min: self.min_target_c,
                max: self.max_target_c,
            });
        }

        for (name, value) in [
            ("bias_eco_frost", self.bias_eco_frost),
            ("bias_com_frost", self.bias_com_frost),
            ("bias_eco_warm", self.bias_eco_warm),
            ("bias_com_warm", self.bias_com_warm),
            ("safe_room_temperature", self.safe_room_temperature),
        ] {
            if !(self.min_target_c..=self.max_target_c).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    name,
                    value,
                    min: self.min_target_c,
                    max: self.max_target_c,
                });
            }
        }

        ordered("bias_eco_frost", self.bias_eco_frost, "bias_com_frost", self.bias_com_frost)?;
        ordered(
            "bias_com_frost + 1",
            self.bias_com_frost.saturating_add(1),
            "bias_eco_warm",
            self.bias_eco_warm,
        )?;
        ordered("bias_eco_warm", self.bias_eco_warm, "bias_com_warm", self.bias_com_warm)?;
        ordered(
            "bias_com_warm + bake_uplift",
            self.bias_com_warm.saturating_add(self.bake_uplift),
            "max_target_c",
            self.max_target_c,
        )?;

        for (name, value) in [
            ("bake_uplift", self.bake_uplift),
            ("bake_max_m", self.bake_max_m),
            ("setback_default", self.setback_default),
            ("setback_full_m", self.setback_full_m),
            ("antiseek_valve_reclose_delay_m", self.antiseek_valve_reclose_delay_m),
            ("antiseek_valve_reopen_delay_m", self.antiseek_valve_reopen_delay_m),
            ("default_min_valve_pc_really_open", self.default_min_valve_pc_really_open),
            ("valve_open_slew_pc", self.valve_open_slew_pc),
            ("valve_glacial_slew_pc", self.valve_glacial_slew_pc),
            ("max_run_on_time_m", self.max_run_on_time_m),
            ("learned_on_period_m", self.learned_on_period_m),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero { name });
            }
        }

        if self.setback_eco < self.setback_default {
            return Err(ConfigError::Ordering {
                lower: "setback_default",
                lower_value: self.setback_default,
                upper: "setback_eco",
                upper_value: self.setback_eco,
            });
        }
        ordered("setback_eco", self.setback_eco, "setback_full + 1", self.setback_full.saturating_add(1))?;

        if self.default_min_valve_pc_really_open > self.max_valve_pc_open
            || self.max_valve_pc_open > 100
        {
            return Err(ConfigError::OutOfRange {
                name: "default_min_valve_pc_really_open",
                value: self.default_min_valve_pc_really_open,
                min: 1,
                max: self.max_valve_pc_open.min(100),
            });
        }

        Ok(())
    }
}

fn ordered(
    lower: &'static str,
    lower_value: u8,
    upper: &'static str,
    upper_value: u8,
) -> Result<(), ConfigError> {
    if lower_value < upper_value {
        Ok(())
    } else {
        Err(ConfigError::Ordering {
            lower,
            lower_value,
            upper,
            upper_value,
        })
    }
}

/// Optional capabilities, resolved once when the engine is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    pub bake: bool,
    pub occupancy: bool,
    pub settable_targets: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            bake: true,
            occupancy: true,
            settable_targets: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSettings {
    pub frost_target_c: u8,
    pub warm_target_c: u8,
    #[serde(default)]
    pub min_valve_pc_really_open: Option<u8>,
    #[serde(default)]
    pub glacial: bool,
    #[serde(default)]
    pub warm_mode: bool,
}

impl Default for PersistedSettings {
    fn default() -> Self {
        let config = TrvConfig::default();
        Self {
            frost_target_c: config.default_frost_target_c(),
            warm_target_c: config.default_warm_target_c(),
            min_valve_pc_really_open: None,
            glacial: false,
            warm_mode: false,
        }
    }
}

impl PersistedSettings {
    pub fn sanitize(&mut self, config: &TrvConfig) {
        self.frost_target_c = config.clamp_target(self.frost_target_c);
        self.warm_target_c = config.clamp_target(self.warm_target_c);
        if self.frost_target_c > self.warm_target_c {
            self.frost_target_c = self.warm_target_c;
        }

        if let Some(pc) = self.min_valve_pc_really_open {
            if !(1..=100).contains(&pc) {
                self.min_valve_pc_really_open = None;
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub trv: TrvConfig,
    #[serde(default)]
    pub features: Features,
    #[serde(default)]
    pub settings: PersistedSettings,
    #[serde(default)]
    pub schedule: Schedule,
    pub timezone: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            trv: TrvConfig::default(),
            features: Features::default(),
            settings: PersistedSettings::default(),
            schedule: Schedule::default(),
            timezone: "Europe/London".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_validate() {
        assert_eq!(TrvConfig::default().validate(), Ok(()));
    }

    #[test]
    fn occupation_timeout_follows_full_setback_delay() {
        let mut config = TrvConfig::default();
        assert_eq!(config.occupation_timeout_m(), 50);
        assert_eq!(config.occupation_recent_threshold_m(), 33);

        config.setback_full_m = 10;
        assert_eq!(config.occupation_timeout_m(), 30);
    }

    #[test]
    fn inverted_bias_bands_are_rejected() {
        let config = TrvConfig {
            bias_eco_warm: 22,
            ..TrvConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Ordering {
                lower: "bias_eco_warm",
                ..
            })
        ));
    }

    #[test]
    fn bake_uplift_must_fit_below_max() {
        let config = TrvConfig {
            max_target_c: 25,
            ..TrvConfig::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn sanitize_clamps_and_orders_targets() {
        let config = TrvConfig::default();
        let mut settings = PersistedSettings {
            frost_target_c: 30,
            warm_target_c: 200,
            min_valve_pc_really_open: Some(150),
            glacial: false,
            warm_mode: true,
        };

        settings.sanitize(&config);

        assert_eq!(settings.warm_target_c, 95);
        assert_eq!(settings.frost_target_c, 30);
        assert_eq!(settings.min_valve_pc_really_open, None);

        settings.warm_target_c = 20;
        settings.sanitize(&config);
        assert_eq!(settings.frost_target_c, 20);
    }

    #[test]
    fn runtime_config_fills_missing_sections() {
        let runtime: RuntimeConfig = serde_json::from_str(
            r#"{"timezone":"Europe/Paris","trv":{"bake_max_m":20},"settings":{"frost_target_c":9,"warm_target_c":19}}"#,
        )
        .unwrap();

        assert_eq!(runtime.timezone, "Europe/Paris");
        assert_eq!(runtime.trv.bake_max_m, 20);
        assert_eq!(runtime.trv.setback_full_m, 50);
        assert_eq!(runtime.features, Features::default());
        assert_eq!(runtime.settings.min_valve_pc_really_open, None);
        assert!(!runtime.schedule.is_any_set());
    }

    #[test]
    fn default_targets_match_eco_bias() {
        let settings = PersistedSettings::default();
        assert_eq!(settings.frost_target_c, 7);
        assert_eq!(settings.warm_target_c, 18);
    }
}
