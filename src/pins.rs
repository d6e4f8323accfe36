//! GPIO / peripheral pin assignments for the SdLogger node board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Liveness indicator
// ---------------------------------------------------------------------------

/// Digital output toggled once per second as a heartbeat.
pub const LIVENESS_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// Sensors: Analog (ADC1)
// ---------------------------------------------------------------------------

/// Photoresistor divider. ADC1 channel 0 (GPIO 1 on ESP32-S3).
pub const LIGHT_ADC_GPIO: i32 = 1;
/// Linear analog temperature sensor (10 mV/°C, 500 mV offset).
/// ADC1 channel 1 (GPIO 2 on ESP32-S3).
pub const TEMP_ADC_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// Edge input
// ---------------------------------------------------------------------------

/// Event input, pulled up, interrupt on falling edge.
pub const EDGE_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// SD card (SPI)
// ---------------------------------------------------------------------------

pub const SD_SCLK_GPIO: i32 = 12;
pub const SD_MOSI_GPIO: i32 = 11;
pub const SD_MISO_GPIO: i32 = 10;
pub const SD_CS_GPIO: i32 = 9;
