//! Sensor subsystem — drivers and the aggregating [`SensorAggregator`].
//!
//! The aggregator turns one round of raw port reads into a
//! [`SensorSample`], which the sensing task hands to the alert machine,
//! the readings display and the telemetry publisher.

pub mod climate;
pub mod gas;

use log::warn;

use crate::app::ports::SensorPort;
use crate::error::SensorError;
use gas::GasModel;

/// One complete, validated reading.  Superseded by the next; no history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    /// Air temperature (°C).
    pub temperature_c: f32,
    /// Relative humidity (%).
    pub humidity_pct: f32,
    /// CO concentration (ppm), always in `[0, GasModel::PPM_CEILING]`.
    pub co_ppm: f32,
    /// Uptime at which the sample was taken (ms).
    pub valid_at_ms: u64,
}

/// Reads every sensor behind a [`SensorPort`] and validates the result.
#[derive(Debug, Clone, Copy)]
pub struct SensorAggregator {
    r0_kohm: f32,
}

impl SensorAggregator {
    /// `r0_kohm` is the clean-air resistance from calibration (or the
    /// configured default).
    pub fn new(r0_kohm: f32) -> Self {
        Self { r0_kohm }
    }

    pub fn r0_kohm(&self) -> f32 {
        self.r0_kohm
    }

    /// Read temperature, humidity and CO.
    ///
    /// A NaN temperature or humidity fails the whole sample; the caller
    /// keeps the previous one.  A non-finite gas estimate is coerced to 0.
    pub fn read_all(
        &mut self,
        port: &mut (impl SensorPort + ?Sized),
        now_ms: u64,
    ) -> Result<SensorSample, SensorError> {
        let temperature_c = port.read_temperature_celsius();
        let humidity_pct = port.read_humidity_percent();
        let raw = port.read_raw_gas_adc();

        if temperature_c.is_nan() || humidity_pct.is_nan() {
            warn!("Climate sensor read failed (t={temperature_c}, h={humidity_pct})");
            return Err(SensorError::InvalidReading);
        }

        let mut co_ppm = GasModel::estimate_ppm(raw, self.r0_kohm);
        if !co_ppm.is_finite() {
            warn!("Gas estimate not finite for raw={raw}, reporting 0 ppm");
            co_ppm = 0.0;
        }

        Ok(SensorSample {
            temperature_c,
            humidity_pct,
            co_ppm,
            valid_at_ms: now_ms,
        })
    }
}
