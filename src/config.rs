//! System configuration parameters
//!
//! All tunable parameters for the EnvGuard controller: alert thresholds,
//! task cadences, gas-sensor calibration constants and broker topics.
//! Defaults match the bench-calibrated board; a JSON override can be
//! supplied at startup through [`SystemConfig::from_json`].

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Thresholds ---
    /// Temperature (Celsius) above which the AC fan is wanted
    pub temp_high_threshold_c: f32,
    /// CO concentration (ppm) above which the room is dangerous
    pub co_danger_threshold_ppm: f32,

    // --- Timing ---
    /// Sensing cycle interval (milliseconds)
    pub sensor_read_interval_ms: u32,
    /// How long the status page stays up after a state change (milliseconds)
    pub status_hold_ms: u32,
    /// Red LED blink half-period while in danger (milliseconds)
    pub blink_period_ms: u32,
    /// Status page redraw interval while the link is up (milliseconds)
    pub status_refresh_ms: u32,
    /// Clock page redraw interval (milliseconds)
    pub clock_refresh_ms: u32,
    /// Status page redraw throttle while the link is down (milliseconds)
    pub offline_refresh_ms: u32,

    // --- Buzzer ---
    /// Alarm tone frequency (Hz)
    pub buzzer_tone_hz: u32,

    // --- MQ-7 gas sensor ---
    /// Sensor clean-air resistance R0 (kOhm) used until calibration runs
    pub gas_r0_kohm: f32,
    /// Number of clean-air samples taken during startup calibration
    pub gas_calibration_samples: u16,
    /// Pause between calibration samples (milliseconds)
    pub gas_calibration_interval_ms: u32,

    // --- Broker ---
    /// Telemetry topic (JSON payload)
    pub telemetry_topic: heapless::String<32>,
    /// Alert topic (plain-text payload)
    pub alert_topic: heapless::String<32>,
    /// Online-status topic
    pub status_topic: heapless::String<32>,
    /// Control topic prefix; the device MAC is appended
    pub control_topic_prefix: heapless::String<32>,
    /// Broker URL
    pub broker_url: heapless::String<64>,

    // --- Network / time ---
    /// Wi-Fi station SSID
    pub wifi_ssid: heapless::String<32>,
    /// Wi-Fi station passphrase (empty for open networks)
    pub wifi_password: heapless::String<64>,
    /// SNTP server
    pub ntp_server: heapless::String<32>,
    /// Local time offset from UTC (seconds)
    pub utc_offset_secs: i32,
}

fn fixed<const N: usize>(s: &str) -> heapless::String<N> {
    let mut t = heapless::String::new();
    // Defaults all fit their capacity.
    let _ = t.push_str(s);
    t
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Thresholds
            temp_high_threshold_c: 35.0,
            co_danger_threshold_ppm: 50.0,

            // Timing
            sensor_read_interval_ms: 2000,
            status_hold_ms: 5000,
            blink_period_ms: 250,
            status_refresh_ms: 500,
            clock_refresh_ms: 1000,
            offline_refresh_ms: 2000,

            // Buzzer
            buzzer_tone_hz: 1000,

            // MQ-7
            gas_r0_kohm: 10.0,
            gas_calibration_samples: 50,
            gas_calibration_interval_ms: 100,

            // Broker
            telemetry_topic: fixed("ecs/upload"),
            alert_topic: fixed("room/alert"),
            status_topic: fixed("room/status"),
            control_topic_prefix: fixed("ecs/control/"),
            broker_url: fixed("mqtt://broker.hivemq.com:1883"),

            // Network / time (GMT+7)
            wifi_ssid: fixed("Wokwi-GUEST"),
            wifi_password: fixed(""),
            ntp_server: fixed("pool.ntp.org"),
            utc_offset_secs: 7 * 3600,
        }
    }
}

impl SystemConfig {
    /// Parse a JSON override.  Missing fields keep their defaults; the
    /// result is validated before it is returned.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }

    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.temp_high_threshold_c.is_finite() {
            return Err(ConfigError::ValidationFailed("temp_high_threshold_c must be finite"));
        }
        if !self.co_danger_threshold_ppm.is_finite() || self.co_danger_threshold_ppm <= 0.0 {
            return Err(ConfigError::ValidationFailed("co_danger_threshold_ppm must be > 0"));
        }
        if self.sensor_read_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("sensor_read_interval_ms must be > 0"));
        }
        if self.blink_period_ms == 0 {
            return Err(ConfigError::ValidationFailed("blink_period_ms must be > 0"));
        }
        if self.status_refresh_ms == 0 || self.clock_refresh_ms == 0 || self.offline_refresh_ms == 0
        {
            return Err(ConfigError::ValidationFailed("display refresh intervals must be > 0"));
        }
        if self.status_refresh_ms > self.clock_refresh_ms {
            return Err(ConfigError::ValidationFailed(
                "status page must refresh at least as often as the clock page",
            ));
        }
        if !self.gas_r0_kohm.is_finite() || self.gas_r0_kohm <= 0.0 {
            return Err(ConfigError::ValidationFailed("gas_r0_kohm must be > 0"));
        }
        if self.telemetry_topic.is_empty()
            || self.alert_topic.is_empty()
            || self.status_topic.is_empty()
            || self.control_topic_prefix.is_empty()
        {
            return Err(ConfigError::ValidationFailed("topics must not be empty"));
        }
        if self.broker_url.is_empty() || self.wifi_ssid.is_empty() {
            return Err(ConfigError::ValidationFailed("broker_url and wifi_ssid must be set"));
        }
        if self.utc_offset_secs.abs() > 14 * 3600 {
            return Err(ConfigError::ValidationFailed("utc_offset_secs out of range"));
        }
        Ok(())
    }
}
