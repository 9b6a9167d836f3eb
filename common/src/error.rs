use thiserror::Error;

/// Violations of the ordering rules between configured constants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("target bounds inverted: min {min} C is not below max {max} C")]
    TargetBounds { min: u8, max: u8 },
    #[error("{name} = {value} C is outside [{min}, {max}] C")]
    OutOfRange {
        name: &'static str,
        value: u8,
        min: u8,
        max: u8,
    },
    #[error("{lower} ({lower_value}) must be strictly below {upper} ({upper_value})")]
    Ordering {
        lower: &'static str,
        lower_value: u8,
        upper: &'static str,
        upper_value: u8,
    },
    #[error("{name} must be strictly positive")]
    Zero { name: &'static str },
}

/// Rejected attempts to change a FROST or WARM set-point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SetpointError {
    #[error("set-points are fixed on this unit")]
    NotSettable,
    #[error("{value} C is outside [{min}, {max}] C")]
    OutOfRange { value: u8, min: u8, max: u8 },
    #[error("FROST {frost} C would be above WARM {warm} C")]
    FrostAboveWarm { frost: u8, warm: u8 },
}
