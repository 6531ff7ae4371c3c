//! Red/green status LEDs and the piezo buzzer.
//!
//! LEDs are plain GPIO outputs.  The buzzer is driven by LEDC timer 0 at
//! 50 % duty; retuning changes the timer frequency.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: GPIO and LEDC writes via hw_init.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;
use crate::pins;

pub struct StatusLeds {
    red: bool,
    green: bool,
}

impl Default for StatusLeds {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusLeds {
    pub fn new() -> Self {
        let mut leds = Self { red: false, green: false };
        leds.set(false, false);
        leds
    }

    pub fn set(&mut self, red: bool, green: bool) {
        hw_init::gpio_write(pins::LED_RED_GPIO, red);
        hw_init::gpio_write(pins::LED_GREEN_GPIO, green);
        self.red = red;
        self.green = green;
    }

    pub fn current(&self) -> (bool, bool) {
        (self.red, self.green)
    }
}

pub struct Buzzer {
    tone_hz: Option<u32>,
}

impl Default for Buzzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buzzer {
    pub fn new() -> Self {
        hw_init::ledc_silence();
        Self { tone_hz: None }
    }

    pub fn tone(&mut self, freq_hz: u32) {
        if freq_hz == 0 {
            self.silence();
            return;
        }
        hw_init::ledc_tone(freq_hz);
        self.tone_hz = Some(freq_hz);
    }

    pub fn silence(&mut self) {
        hw_init::ledc_silence();
        self.tone_hz = None;
    }

    pub fn current_tone(&self) -> Option<u32> {
        self.tone_hz
    }
}
