pub mod ambient;
pub mod input;
pub mod pot;
pub mod sim;
pub mod voice;

pub use ambient::{AmbientLightSensor, LDR_THR_HIGH, LDR_THR_LOW};
pub use input::{AnalogueInput, SharedAnalogue, ADC_MAX};
pub use pot::{compute_warm_target_c, PotAction, PotTargets, TemperaturePot};
pub use sim::{RoomModel, SimulatedRoom};
pub use voice::{VoiceDetection, VoiceInterrupt, VOICE_DETECTION_THRESHOLD};
