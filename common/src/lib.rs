pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod mode;
pub mod occupancy;
pub mod schedule;
pub mod sensor;
pub mod setpoints;
pub mod stats;
pub mod target;
pub mod types;
pub mod valve;

pub use codec::{compress_temp_c16, expand_temp_c16, STATS_UNSET_BYTE, STATS_UNSET_INT};
pub use config::{Features, PersistedSettings, RuntimeConfig, TrvConfig};
pub use engine::{TickInput, TrvEngine};
pub use error::{ConfigError, SetpointError};
pub use mode::{bias, has_eco_bias, is_comfort_temperature, is_eco_temperature, ModeControl};
pub use occupancy::{NoOccupancy, OccupancyEvents, OccupancySignal, OccupancyTracker};
pub use schedule::{Schedule, WarmProgramme};
pub use sensor::{AmbientLight, RoomTemperature, Sensor, ValveActuator};
pub use setpoints::{FixedTargets, SettableTargets, TargetSource};
pub use stats::{smooth_stats_value, MemoryStatsStore, Statistics, StatsSample, StatsSet, StatsStore};
pub use target::{compute_target_temperature, TargetInputs};
pub use types::{Bias, EngineAction, Mode, TrvStatus};
pub use valve::{RadValve, ValveState};
