//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the climate sensor, the MQ-7 ADC channel and every actuator
//! driver, exposing them through [`SensorPort`], [`ActuatorPort`] and
//! [`ToneOutput`].  This is the only module in the system that touches
//! actual hardware.  On non-espidf targets, the underlying drivers use
//! cfg-gated simulation stubs.

use crate::app::ports::{ActuatorPort, SensorPort, ToneOutput};
use crate::control::mode::RelayState;
use crate::drivers::indicators::{Buzzer, StatusLeds};
use crate::drivers::relay::RelayBank;
use crate::pins;
use crate::sensors::climate::ClimateSensor;
use crate::sensors::gas::Mq7Adc;

/// Concrete adapter that combines all main-board hardware behind port traits.
pub struct HardwareAdapter {
    climate: ClimateSensor,
    gas: Mq7Adc,
    relays: RelayBank,
    leds: StatusLeds,
    buzzer: Buzzer,
}

impl Default for HardwareAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareAdapter {
    /// Bind to the pins in [`pins`].  Peripherals must already be
    /// configured by `hw_init::init_peripherals`.
    pub fn new() -> Self {
        Self {
            climate: ClimateSensor::new(pins::DHT_GPIO),
            gas: Mq7Adc::new(pins::MQ7_ADC_CHANNEL),
            relays: RelayBank::new(),
            leds: StatusLeds::new(),
            buzzer: Buzzer::new(),
        }
    }

    pub fn relay_state(&self) -> RelayState {
        self.relays.state()
    }

    pub fn indicator_state(&self) -> (bool, bool) {
        self.leds.current()
    }

    pub fn buzzer_tone(&self) -> Option<u32> {
        self.buzzer.current_tone()
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl SensorPort for HardwareAdapter {
    fn read_temperature_celsius(&mut self) -> f32 {
        self.climate.temperature_c()
    }

    fn read_humidity_percent(&mut self) -> f32 {
        self.climate.humidity_pct()
    }

    fn read_raw_gas_adc(&mut self) -> u16 {
        self.gas.read_raw()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl ActuatorPort for HardwareAdapter {
    fn set_relays(&mut self, relays: RelayState) {
        self.relays.set(relays);
    }

    fn set_indicators(&mut self, red: bool, green: bool) {
        self.leds.set(red, green);
    }
}

// ── ToneOutput implementation ─────────────────────────────────

impl ToneOutput for HardwareAdapter {
    fn tone(&mut self, freq_hz: u32) {
        self.buzzer.tone(freq_hz);
    }

    fn silence(&mut self) {
        self.buzzer.silence();
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;
    use crate::sensors::climate::sim_set_climate;

    #[test]
    fn ports_reach_the_drivers() {
        // Same values as the climate driver test; the sim statics are shared.
        sim_set_climate(21.5, 55.0);
        let mut hw = HardwareAdapter::new();
        assert_eq!(hw.read_temperature_celsius(), 21.5);
        assert_eq!(hw.read_humidity_percent(), 55.0);

        hw.set_relays(RelayState { fan1: false, fan2: true });
        assert_eq!(hw.relay_state(), RelayState { fan1: false, fan2: true });

        hw.set_indicators(true, false);
        assert_eq!(hw.indicator_state(), (true, false));

        hw.tone(1000);
        assert_eq!(hw.buzzer_tone(), Some(1000));
        hw.silence();
        assert_eq!(hw.buzzer_tone(), None);
    }
}
