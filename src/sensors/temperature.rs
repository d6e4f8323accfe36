//! Linear analog temperature sensor (TMP36 class: 10 mV/°C, 500 mV at 0 °C).
//!
//! The normalised sample spans `[0, 1024)` across a 3.5 V reference.  The
//! transfer function is kept in this exact order of operations (scale to
//! millivolts, subtract the offset, divide by the slope) so logged values
//! stay bit-for-bit comparable with existing logs.

/// Reference voltage in millivolts mapped onto the full normalised range.
const V_REF_MV: f64 = 3500.0;
/// Normalised full-scale count.
const FULL_SCALE: f64 = 1024.0;
/// Sensor output at 0 °C, millivolts.
const OFFSET_MV: f64 = 500.0;
/// Sensor slope, millivolts per °C.
const MV_PER_DEGREE: f64 = 10.0;

/// Convert a normalised raw sample to degrees Celsius.
pub fn celsius_from_raw(raw: u16) -> f64 {
    let millivolts = (f64::from(raw) * V_REF_MV) / FULL_SCALE;
    (millivolts - OFFSET_MV) / MV_PER_DEGREE
}
