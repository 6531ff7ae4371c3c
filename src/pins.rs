//! GPIO / peripheral pin assignments for the EnvGuard main board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// DHT22 temperature/humidity sensor, single-wire open-drain data line.
pub const DHT_GPIO: i32 = 13;

/// MQ-7 CO sensor divider output.
/// ADC1 channel 9 (GPIO 10 on ESP32-S3).
pub const MQ7_ADC_GPIO: i32 = 10;
pub const MQ7_ADC_CHANNEL: u32 = 9;

// ---------------------------------------------------------------------------
// Relays (active HIGH)
// ---------------------------------------------------------------------------

/// Fan 1: AC fan.
pub const RELAY_FAN1_GPIO: i32 = 38;
/// Fan 2: air purifier.
pub const RELAY_FAN2_GPIO: i32 = 39;

// ---------------------------------------------------------------------------
// Indicators
// ---------------------------------------------------------------------------

pub const LED_RED_GPIO: i32 = 15;
pub const LED_GREEN_GPIO: i32 = 16;

/// Piezo buzzer, driven by LEDC square wave.
pub const BUZZER_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// I²C buses (one 20x4 character display each)
// ---------------------------------------------------------------------------

/// Bus 0: readings display.
pub const I2C0_SDA_GPIO: i32 = 8;
pub const I2C0_SCL_GPIO: i32 = 9;

/// Bus 1: status / clock display.
pub const I2C1_SDA_GPIO: i32 = 3;
pub const I2C1_SCL_GPIO: i32 = 4;

/// PCF8574 backpack address of the readings display.
pub const LCD_READINGS_ADDR: u8 = 0x27;
/// PCF8574 backpack address of the status display.
pub const LCD_STATUS_ADDR: u8 = 0x26;

/// I²C bus speed for both displays (Hz).
pub const I2C_FREQ_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC duty resolution for the buzzer (bits).
pub const BUZZER_PWM_RESOLUTION_BITS: u32 = 8;
/// Initial LEDC timer frequency; retuned by every tone request (Hz).
pub const BUZZER_BASE_FREQ_HZ: u32 = 2_000;
