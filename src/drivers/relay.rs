//! Two-channel fan relay driver.
//!
//! Relay 1 switches the ventilation fan, relay 2 the air purifier.  Both
//! are active-high GPIO outputs.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the relay GPIOs via hw_init.
//! On host/test: tracks state in-memory only.

use crate::control::mode::RelayState;
use crate::drivers::hw_init;
use crate::pins;

pub struct RelayBank {
    state: RelayState,
}

impl Default for RelayBank {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayBank {
    /// Both relays start de-energised.
    pub fn new() -> Self {
        hw_init::gpio_write(pins::RELAY_FAN1_GPIO, false);
        hw_init::gpio_write(pins::RELAY_FAN2_GPIO, false);
        Self {
            state: RelayState::default(),
        }
    }

    pub fn set(&mut self, relays: RelayState) {
        hw_init::gpio_write(pins::RELAY_FAN1_GPIO, relays.fan1);
        hw_init::gpio_write(pins::RELAY_FAN2_GPIO, relays.fan2);
        self.state = relays;
    }

    pub fn state(&self) -> RelayState {
        self.state
    }
}
