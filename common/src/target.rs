use serde::Serialize;

use crate::{config::TrvConfig, mode::has_eco_bias, occupancy::OccupancySignal, types::Mode};

/// Snapshot of everything the target temperature depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TargetInputs {
    pub mode: Mode,
    pub in_bake: bool,
    pub frost_target_c: u8,
    pub warm_target_c: u8,
    pub likely_recently_occupied: bool,
    pub likely_occupied: bool,
    pub likely_unoccupied: bool,
    pub vacancy_minutes: u16,
    pub room_lit: bool,
    pub warm_predicted: bool,
    pub schedule_warm_now: bool,
}

impl TargetInputs {
    /// Fills the occupancy fields from `occupancy`, leaving the rest as given.
    pub fn with_occupancy(mut self, occupancy: &dyn OccupancySignal) -> Self {
        self.likely_recently_occupied = occupancy.is_likely_recently_occupied();
        self.likely_occupied = occupancy.is_likely_occupied();
        self.likely_unoccupied = occupancy.is_likely_unoccupied();
        self.vacancy_minutes = occupancy.vacancy_minutes();
        self
    }
}

/// Setback in whole C for a WARM room that is not being pre-warmed.
pub fn setback_c(inputs: &TargetInputs, eco_bias: bool, config: &TrvConfig) -> u8 {
    if inputs.likely_recently_occupied {
        return 0;
    }
    if inputs.likely_unoccupied && inputs.vacancy_minutes >= u16::from(config.setback_full_m) {
        return config.setback_full;
    }
    if inputs.likely_unoccupied || !inputs.room_lit {
        return if eco_bias {
            config.setback_eco
        } else {
            config.setback_default
        };
    }
    if inputs.likely_occupied {
        return config.setback_default;
    }
    0
}

/// Target temperature in C; always within `[min_target_c, max_target_c]`.
///
/// Pure, so it is safe to call at any time as well as once per tick.
pub fn compute_target_temperature(inputs: &TargetInputs, config: &TrvConfig) -> u8 {
    let frost = config.clamp_target(inputs.frost_target_c);
    let warm = config.clamp_target(inputs.warm_target_c).max(frost);

    let target = match inputs.mode {
        Mode::Frost => frost,
        Mode::Warm if inputs.in_bake => warm
            .saturating_add(config.bake_uplift)
            .min(config.max_target_c),
        Mode::Warm if inputs.warm_predicted || inputs.schedule_warm_now => warm,
        Mode::Warm => {
            let eco = has_eco_bias(frost, warm, config);
            warm.saturating_sub(setback_c(inputs, eco, config))
                .max(frost)
                .max(config.min_target_c)
        }
    };

    config.clamp_target(target)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn warm(warm_target_c: u8) -> TargetInputs {
        TargetInputs {
            mode: Mode::Warm,
            in_bake: false,
            frost_target_c: 7,
            warm_target_c,
            likely_recently_occupied: true,
            likely_occupied: true,
            likely_unoccupied: false,
            vacancy_minutes: 0,
            room_lit: true,
            warm_predicted: false,
            schedule_warm_now: false,
        }
    }

    fn vacant(minutes: u16, warm_target_c: u8) -> TargetInputs {
        TargetInputs {
            likely_recently_occupied: false,
            likely_occupied: false,
            likely_unoccupied: true,
            vacancy_minutes: minutes,
            ..warm(warm_target_c)
        }
    }

    #[test]
    fn frost_mode_uses_frost_target() {
        let config = TrvConfig::default();
        let inputs = TargetInputs {
            mode: Mode::Frost,
            warm_predicted: true,
            ..warm(21)
        };
        assert_eq!(compute_target_temperature(&inputs, &config), 7);
    }

    #[test]
    fn occupied_warm_room_gets_warm_target() {
        let config = TrvConfig::default();
        assert_eq!(compute_target_temperature(&warm(21), &config), 21);
    }

    #[test]
    fn bake_adds_uplift_capped_at_max() {
        let config = TrvConfig::default();
        let inputs = TargetInputs {
            in_bake: true,
            ..vacant(500, 21)
        };
        assert_eq!(compute_target_temperature(&inputs, &config), 26);

        let hot = TargetInputs {
            in_bake: true,
            ..warm(93)
        };
        assert_eq!(compute_target_temperature(&hot, &config), 95);
    }

    #[test]
    fn setback_tiers_follow_vacancy_and_bias() {
        let config = TrvConfig::default();
        // Eco bias at WARM 18.
        assert_eq!(compute_target_temperature(&vacant(10, 18), &config), 16);
        assert_eq!(compute_target_temperature(&vacant(50, 18), &config), 15);
        // Comfort bias at WARM 21.
        let comfort = TargetInputs {
            frost_target_c: 12,
            ..vacant(10, 21)
        };
        assert_eq!(compute_target_temperature(&comfort, &config), 20);
    }

    #[test]
    fn light_setback_once_recent_evidence_lapses() {
        let config = TrvConfig::default();
        let inputs = TargetInputs {
            likely_recently_occupied: false,
            ..warm(21)
        };
        assert_eq!(compute_target_temperature(&inputs, &config), 20);
    }

    #[test]
    fn dark_room_without_occupancy_is_set_back() {
        let config = TrvConfig::default();
        let inputs = TargetInputs {
            likely_recently_occupied: false,
            likely_occupied: false,
            room_lit: false,
            ..warm(18)
        };
        assert_eq!(compute_target_temperature(&inputs, &config), 16);

        let lit = TargetInputs { room_lit: true, ..inputs };
        assert_eq!(compute_target_temperature(&lit, &config), 18);
    }

    #[test]
    fn prediction_and_schedule_suppress_setback() {
        let config = TrvConfig::default();
        let predicted = TargetInputs {
            warm_predicted: true,
            ..vacant(200, 18)
        };
        assert_eq!(compute_target_temperature(&predicted, &config), 18);

        let scheduled = TargetInputs {
            schedule_warm_now: true,
            ..vacant(200, 18)
        };
        assert_eq!(compute_target_temperature(&scheduled, &config), 18);
    }

    #[test]
    fn setback_never_drops_below_frost() {
        let config = TrvConfig::default();
        let inputs = TargetInputs {
            frost_target_c: 17,
            ..vacant(200, 18)
        };
        assert_eq!(compute_target_temperature(&inputs, &config), 17);
    }

    #[test]
    fn out_of_range_targets_are_clamped() {
        let config = TrvConfig::default();
        let low = TargetInputs {
            mode: Mode::Frost,
            frost_target_c: 0,
            ..warm(0)
        };
        assert_eq!(compute_target_temperature(&low, &config), 5);

        let high = warm(250);
        assert_eq!(compute_target_temperature(&high, &config), 95);
    }
}
