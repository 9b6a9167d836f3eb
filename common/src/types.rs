use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    Frost,
    Warm,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Frost => "FROST",
            Self::Warm => "WARM",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Bias {
    Eco,
    Comfort,
}

impl Bias {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eco => "ECO",
            Self::Comfort => "COMFORT",
        }
    }
}

/// Output of a control tick, executed in order by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineAction {
    SetValvePercent(u8),
    CallForHeat(bool),
}

#[derive(Debug, Clone, Serialize)]
pub struct TrvStatus {
    #[serde(rename = "currentTempC16")]
    pub current_temp_c16: Option<i16>,
    #[serde(rename = "targetTempC")]
    pub target_temp_c: u8,
    #[serde(rename = "frostTargetC")]
    pub frost_target_c: u8,
    #[serde(rename = "warmTargetC")]
    pub warm_target_c: u8,
    pub mode: &'static str,
    pub bias: &'static str,
    #[serde(rename = "bakeActive")]
    pub bake_active: bool,
    #[serde(rename = "bakeRemainingMin")]
    pub bake_remaining_min: u8,
    #[serde(rename = "percentOpen")]
    pub percent_open: u8,
    #[serde(rename = "callingForHeat")]
    pub calling_for_heat: bool,
    #[serde(rename = "valveMoved")]
    pub valve_moved: bool,
    #[serde(rename = "minValvePcReallyOpen")]
    pub min_valve_pc_really_open: u8,
    #[serde(rename = "valveReallyOpen")]
    pub valve_really_open: bool,
    pub glacial: bool,
    #[serde(rename = "roomLit")]
    pub room_lit: bool,
    #[serde(rename = "occupancyPc")]
    pub occupancy_pc: u8,
    #[serde(rename = "twoBitOccupancy")]
    pub two_bit_occupancy: u8,
    #[serde(rename = "vacancyH")]
    pub vacancy_h: u8,
    #[serde(rename = "currentHour")]
    pub current_hour: u8,
    #[serde(rename = "warmPredicted")]
    pub warm_predicted: bool,
    #[serde(rename = "scheduleWarmNow")]
    pub schedule_warm_now: bool,
}
