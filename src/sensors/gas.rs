//! MQ-7 carbon-monoxide sensor model.
//!
//! The sensor is a heated SnO2 element whose resistance drops as CO
//! concentration rises.  It sits in a divider with a fixed load resistor;
//! the ADC sees the voltage across the load.
//!
//! ```text
//!   Vcc ──[ Rs (sensor) ]──┬──[ RL 10k ]── GND
//!                          │
//!                          └──▶ ADC (0..4095 over 0..3.3 V)
//! ```
//!
//! `Rs = RL * (Vcc / V - 1)`, `ratio = Rs / R0`, `ppm = A * ratio^B`.
//!
//! `R0` is the sensor resistance in clean air and is found once at boot by
//! [`calibrate`].  The curve constants are the datasheet fit for CO.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::app::ports::SensorPort;
#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

#[cfg(not(target_os = "espidf"))]
static SIM_GAS_ADC: AtomicU16 = AtomicU16::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_gas_adc(raw: u16) {
    SIM_GAS_ADC.store(raw, Ordering::Relaxed);
}

/// Curve fit and divider constants for the MQ-7 on a 12-bit, 3.3 V ADC.
pub struct GasModel;

impl GasModel {
    /// Full-scale ADC count.
    pub const ADC_MAX: f32 = 4095.0;
    /// ADC reference / divider supply (V).
    pub const SUPPLY_V: f32 = 3.3;
    /// Below this the sensor is unpowered or disconnected (V).
    pub const LOW_GUARD_V: f32 = 0.1;
    /// Above this the divider is saturated against the rail (V).
    pub const HIGH_GUARD_V: f32 = 3.2;
    /// Load resistor (kOhm).
    pub const LOAD_KOHM: f32 = 10.0;
    /// Power-law coefficient.
    pub const CURVE_A: f32 = 99.048;
    /// Power-law exponent.
    pub const CURVE_B: f32 = -1.518;
    /// Ratio clamp, lower bound.
    pub const RATIO_MIN: f32 = 0.01;
    /// Ratio clamp, upper bound.
    pub const RATIO_MAX: f32 = 100.0;
    /// Reported concentration ceiling (ppm).
    pub const PPM_CEILING: f32 = 9999.0;
    /// Rs/R0 in clean air, from the datasheet.
    pub const CLEAN_AIR_RATIO: f32 = 27.5;

    /// ADC count to divider voltage.
    pub fn voltage(raw_adc: u16) -> f32 {
        f32::from(raw_adc) * Self::SUPPLY_V / Self::ADC_MAX
    }

    /// Sensor resistance (kOhm) for a raw reading, or `None` when the
    /// voltage is outside the usable window.
    pub fn sensor_resistance_kohm(raw_adc: u16) -> Option<f32> {
        let v = Self::voltage(raw_adc);
        if !(Self::LOW_GUARD_V..=Self::HIGH_GUARD_V).contains(&v) {
            return None;
        }
        Some(Self::LOAD_KOHM * (Self::SUPPLY_V / v - 1.0))
    }

    /// Estimate CO concentration (ppm) from a raw ADC count.
    ///
    /// Always returns a finite value in `[0, PPM_CEILING]`: a floating
    /// input reads 0, a saturated divider reads the ceiling, and a
    /// degenerate `r0_kohm` (zero, negative, NaN) reads 0.
    pub fn estimate_ppm(raw_adc: u16, r0_kohm: f32) -> f32 {
        if !r0_kohm.is_finite() || r0_kohm <= 0.0 {
            return 0.0;
        }

        let v = Self::voltage(raw_adc);
        if v < Self::LOW_GUARD_V {
            return 0.0;
        }
        if v > Self::HIGH_GUARD_V {
            return Self::PPM_CEILING;
        }

        let rs = Self::LOAD_KOHM * (Self::SUPPLY_V / v - 1.0);
        let ratio = (rs / r0_kohm).clamp(Self::RATIO_MIN, Self::RATIO_MAX);
        let ppm = Self::CURVE_A * ratio.powf(Self::CURVE_B);

        if ppm.is_nan() {
            return 0.0;
        }
        ppm.clamp(0.0, Self::PPM_CEILING)
    }
}

/// Raw ADC access to the MQ-7 divider.
///
/// On ESP-IDF: oneshot read of the configured ADC1 channel.
/// On host/test: reads the value injected through `sim_set_gas_adc`.
pub struct Mq7Adc {
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    channel: u32,
}

impl Mq7Adc {
    pub fn new(channel: u32) -> Self {
        Self { channel }
    }

    #[cfg(target_os = "espidf")]
    pub fn read_raw(&self) -> u16 {
        hw_init::adc1_read(self.channel)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn read_raw(&self) -> u16 {
        SIM_GAS_ADC.load(Ordering::Relaxed)
    }
}

/// Clean-air calibration.  Blocking; run once at startup before the loop.
///
/// Takes `samples` raw readings `interval_ms` apart, averages the usable
/// sensor resistances and divides by the clean-air ratio.  Falls back to
/// `default_r0_kohm` when no reading is usable.
pub fn calibrate(
    sensor: &mut impl SensorPort,
    delay: &mut impl DelayNs,
    samples: u16,
    interval_ms: u32,
    default_r0_kohm: f32,
) -> f32 {
    info!("Calibrating MQ-7 ({samples} samples, {interval_ms} ms apart)");

    let mut sum = 0.0f32;
    let mut used = 0u16;
    for i in 0..samples {
        if let Some(rs) = GasModel::sensor_resistance_kohm(sensor.read_raw_gas_adc()) {
            sum += rs;
            used += 1;
        }
        if i + 1 < samples {
            delay.delay_ms(interval_ms);
        }
    }

    if used == 0 {
        warn!("MQ-7 calibration: no usable reading, keeping R0 = {default_r0_kohm:.2} kOhm");
        return default_r0_kohm;
    }

    let r0 = sum / f32::from(used) / GasModel::CLEAN_AIR_RATIO;
    if !r0.is_finite() || r0 <= 0.0 {
        warn!("MQ-7 calibration produced R0 = {r0}, keeping default");
        return default_r0_kohm;
    }
    info!("MQ-7 calibrated: R0 = {r0:.3} kOhm ({used}/{samples} usable)");
    r0
}
