//! DHT22 (AM2302) temperature / humidity sensor.
//!
//! Single-wire protocol: the host pulls the line low for ≥1 ms, releases
//! it, and the sensor answers with an 80 µs low / 80 µs high preamble
//! followed by 40 bits.  Each bit is a 50 µs low followed by a high pulse
//! of ~27 µs (0) or ~70 µs (1).
//!
//! ```text
//!   byte 0..1  humidity × 10      (big-endian)
//!   byte 2..3  temperature × 10   (bit 15 = sign)
//!   byte 4     checksum = low byte of sum(bytes 0..3)
//! ```
//!
//! ## Dual-target design
//!
//! On ESP-IDF: bit-bangs the data line through `hw_init` helpers.
//! On host/test: returns values injected through `sim_set_climate`.
//!
//! Failed reads (timeout, checksum) yield NaN for both values, which the
//! aggregator treats as an invalid sample.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU32, Ordering};

#[cfg(not(target_os = "espidf"))]
static SIM_TEMP_BITS: AtomicU32 = AtomicU32::new(0x41C8_0000); // 25.0
#[cfg(not(target_os = "espidf"))]
static SIM_HUMIDITY_BITS: AtomicU32 = AtomicU32::new(0x4220_0000); // 40.0

/// Inject simulated readings.  Pass `f32::NAN` to simulate a dead sensor.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_climate(temperature_c: f32, humidity_pct: f32) {
    SIM_TEMP_BITS.store(temperature_c.to_bits(), Ordering::Relaxed);
    SIM_HUMIDITY_BITS.store(humidity_pct.to_bits(), Ordering::Relaxed);
}

/// The sensor refuses to answer more often than this.
pub const MIN_READ_INTERVAL_MS: u64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

impl ClimateReading {
    pub const INVALID: Self = Self {
        temperature_c: f32::NAN,
        humidity_pct: f32::NAN,
    };
}

/// Decode a 5-byte DHT22 frame.  `None` on checksum mismatch or
/// out-of-range humidity.
pub fn decode_frame(frame: [u8; 5]) -> Option<ClimateReading> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return None;
    }

    let humidity_raw = u16::from_be_bytes([frame[0], frame[1]]);
    let temp_raw = u16::from_be_bytes([frame[2] & 0x7F, frame[3]]);
    let humidity_pct = f32::from(humidity_raw) / 10.0;
    let mut temperature_c = f32::from(temp_raw) / 10.0;
    if frame[2] & 0x80 != 0 {
        temperature_c = -temperature_c;
    }

    if humidity_pct > 100.0 {
        return None;
    }
    Some(ClimateReading {
        temperature_c,
        humidity_pct,
    })
}

/// DHT22 driver with a one-reading cache.
///
/// Temperature and humidity arrive in the same frame; the cache lets the
/// two port calls of one sensing cycle share a single bus transaction.
pub struct ClimateSensor {
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    gpio: i32,
    cached: Option<ClimateReading>,
}

impl ClimateSensor {
    pub fn new(gpio: i32) -> Self {
        Self { gpio, cached: None }
    }

    /// Temperature (°C).  Triggers a fresh bus read.
    pub fn temperature_c(&mut self) -> f32 {
        let reading = self.read();
        self.cached = Some(reading);
        reading.temperature_c
    }

    /// Humidity (%).  Uses the reading cached by the preceding
    /// [`temperature_c`](Self::temperature_c) call when there is one.
    pub fn humidity_pct(&mut self) -> f32 {
        match self.cached.take() {
            Some(r) => r.humidity_pct,
            None => self.read().humidity_pct,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn read(&mut self) -> ClimateReading {
        ClimateReading {
            temperature_c: f32::from_bits(SIM_TEMP_BITS.load(Ordering::Relaxed)),
            humidity_pct: f32::from_bits(SIM_HUMIDITY_BITS.load(Ordering::Relaxed)),
        }
    }

    #[cfg(target_os = "espidf")]
    fn read(&mut self) -> ClimateReading {
        match self.read_frame() {
            Some(frame) => decode_frame(frame).unwrap_or_else(|| {
                log::warn!("DHT22: checksum mismatch {:02X?}", frame);
                ClimateReading::INVALID
            }),
            None => {
                log::warn!("DHT22: no response");
                ClimateReading::INVALID
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn read_frame(&mut self) -> Option<[u8; 5]> {
        use crate::drivers::hw_init::{delay_us, gpio_read, gpio_write, micros};

        let pin = self.gpio;

        // Wait for `level` to end; returns the time it lasted (µs).
        let wait_while = |level: bool, timeout_us: i64| -> Option<i64> {
            let start = micros();
            while gpio_read(pin) == level {
                if micros() - start > timeout_us {
                    return None;
                }
            }
            Some(micros() - start)
        };

        // Start pulse.
        gpio_write(pin, false);
        delay_us(1_100);
        gpio_write(pin, true);
        delay_us(30);

        // Bit timing is tight; keep interrupts off for the 40-bit burst.
        let mut frame = [0u8; 5];
        let ok = esp_idf_svc::hal::interrupt::free(|| {
            wait_while(true, 100)?; // release → sensor pulls low
            wait_while(false, 100)?; // 80 µs low
            wait_while(true, 100)?; // 80 µs high
            for bit in 0..40 {
                wait_while(false, 80)?;
                let high_us = wait_while(true, 100)?;
                if high_us > 45 {
                    frame[bit / 8] |= 0x80 >> (bit % 8);
                }
            }
            Some(())
        });

        ok.map(|()| frame)
    }
}
