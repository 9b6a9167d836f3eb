//! Range compression of 1/16 C temperatures into a single stats byte.
//!
//! Three linear bands, split at whole degrees:
//!
//! | input (C)  | step        | compressed |
//! |------------|-------------|------------|
//! | [0, 16)    | 1/2 C       | 0..32      |
//! | [16, 24)   | 1/8 C       | 32..96     |
//! | [24, 100]  | 1/2 C       | 96..=248   |
//!
//! Inputs outside [0, 100] C are clamped before encoding.

/// Raw stats byte meaning "no sample yet".
pub const STATS_UNSET_BYTE: u8 = 0xff;
/// Expanded integer meaning "no sample yet".
pub const STATS_UNSET_INT: i16 = 0x7fff;

pub const COMPRESSION_C16_FLOOR_VAL: i16 = 0;
pub const COMPRESSION_C16_LOW_THRESHOLD: i16 = 16 << 4;
pub const COMPRESSION_C16_LOW_THR_AFTER: u8 = (COMPRESSION_C16_LOW_THRESHOLD >> 3) as u8;
pub const COMPRESSION_C16_HIGH_THRESHOLD: i16 = 24 << 4;
pub const COMPRESSION_C16_HIGH_THR_AFTER: u8 = COMPRESSION_C16_LOW_THR_AFTER
    + ((COMPRESSION_C16_HIGH_THRESHOLD - COMPRESSION_C16_LOW_THRESHOLD) >> 1) as u8;
pub const COMPRESSION_C16_CEIL_VAL: i16 = 100 << 4;
pub const COMPRESSION_C16_CEIL_VAL_AFTER: u8 = COMPRESSION_C16_HIGH_THR_AFTER
    + ((COMPRESSION_C16_CEIL_VAL - COMPRESSION_C16_HIGH_THRESHOLD) >> 3) as u8;

/// Largest valid compressed temperature.
pub const MAX_STATS_TEMP: u8 = COMPRESSION_C16_CEIL_VAL_AFTER;

pub fn compress_temp_c16(temp_c16: i16) -> u8 {
    let t = temp_c16.clamp(COMPRESSION_C16_FLOOR_VAL, COMPRESSION_C16_CEIL_VAL);
    if t < COMPRESSION_C16_LOW_THRESHOLD {
        (t >> 3) as u8
    } else if t < COMPRESSION_C16_HIGH_THRESHOLD {
        COMPRESSION_C16_LOW_THR_AFTER + ((t - COMPRESSION_C16_LOW_THRESHOLD) >> 1) as u8
    } else {
        COMPRESSION_C16_HIGH_THR_AFTER + ((t - COMPRESSION_C16_HIGH_THRESHOLD) >> 3) as u8
    }
}

/// Reverses [`compress_temp_c16`]; anything above [`MAX_STATS_TEMP`] expands to
/// [`STATS_UNSET_INT`].
pub fn expand_temp_c16(compressed: u8) -> i16 {
    let c = i16::from(compressed);
    if compressed < COMPRESSION_C16_LOW_THR_AFTER {
        c << 3
    } else if compressed < COMPRESSION_C16_HIGH_THR_AFTER {
        ((c - i16::from(COMPRESSION_C16_LOW_THR_AFTER)) << 1) + COMPRESSION_C16_LOW_THRESHOLD
    } else if compressed <= COMPRESSION_C16_CEIL_VAL_AFTER {
        ((c - i16::from(COMPRESSION_C16_HIGH_THR_AFTER)) << 3) + COMPRESSION_C16_HIGH_THRESHOLD
    } else {
        STATS_UNSET_INT
    }
}

/// Largest round-trip error for an in-range input, in 1/16 C.
pub fn quantisation_error_c16(temp_c16: i16) -> i16 {
    if (COMPRESSION_C16_LOW_THRESHOLD..COMPRESSION_C16_HIGH_THRESHOLD).contains(&temp_c16) {
        1
    } else {
        7
    }
}
