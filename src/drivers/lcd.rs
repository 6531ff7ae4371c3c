//! HD44780 character LCD behind a PCF8574 I²C backpack.
//!
//! Generic over `embedded_hal::i2c::I2c` and `embedded_hal::delay::DelayNs`
//! so the same driver runs on both I²C controllers of the ESP32-S3 and
//! against a recording bus in tests.
//!
//! ## Backpack wiring
//!
//! ```text
//!   PCF8574 bit:  7   6   5   4   3    2   1   0
//!                 D7  D6  D5  D4  BL   EN  RW  RS
//! ```
//!
//! The controller runs in 4-bit mode; every byte is sent as two nibbles,
//! each latched by pulsing EN.  Bus errors are counted and logged, never
//! propagated: a dead panel must not stall the control loop.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, I2c};
use log::warn;

use crate::app::ports::TextDisplay;

const RS: u8 = 0x01;
const EN: u8 = 0x04;
const BACKLIGHT: u8 = 0x08;

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE_INC: u8 = 0x06;
const CMD_DISPLAY_ON: u8 = 0x0C;
const CMD_FUNCTION_4BIT_2LINE: u8 = 0x28;
const CMD_SET_DDRAM: u8 = 0x80;

/// DDRAM start address of each row on a 20×4 panel.
const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

pub struct Lcd<I, D> {
    i2c: I,
    delay: D,
    addr: u8,
    cols: u8,
    rows: u8,
    bus_errors: u32,
}

impl<I: I2c, D: DelayNs> Lcd<I, D> {
    pub fn new(i2c: I, delay: D, addr: u8, cols: u8, rows: u8) -> Self {
        Self {
            i2c,
            delay,
            addr,
            cols,
            rows,
            bus_errors: 0,
        }
    }

    pub fn bus_errors(&self) -> u32 {
        self.bus_errors
    }

    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }

    // ── Low level ─────────────────────────────────────────────

    fn expander_write(&mut self, bits: u8) {
        if let Err(e) = self.i2c.write(self.addr, &[bits | BACKLIGHT]) {
            self.bus_errors = self.bus_errors.saturating_add(1);
            if self.bus_errors == 1 {
                warn!("LCD 0x{:02X}: I2C write failed: {:?}", self.addr, e.kind());
            }
        }
    }

    fn pulse(&mut self, bits: u8) {
        self.expander_write(bits | EN);
        self.delay.delay_us(1);
        self.expander_write(bits & !EN);
        self.delay.delay_us(50);
    }

    fn write_nibble(&mut self, nibble_high: u8, mode: u8) {
        let bits = (nibble_high & 0xF0) | mode;
        self.expander_write(bits);
        self.pulse(bits);
    }

    fn send(&mut self, byte: u8, mode: u8) {
        self.write_nibble(byte & 0xF0, mode);
        self.write_nibble(byte << 4, mode);
    }

    fn command(&mut self, cmd: u8) {
        self.send(cmd, 0);
    }

    fn data(&mut self, byte: u8) {
        self.send(byte, RS);
    }
}

impl<I: I2c, D: DelayNs> TextDisplay for Lcd<I, D> {
    fn init(&mut self) {
        self.delay.delay_ms(50);
        self.expander_write(0);
        self.delay.delay_ms(1);

        // Force 8-bit mode three times, then switch to 4-bit.
        self.write_nibble(0x30, 0);
        self.delay.delay_us(4_500);
        self.write_nibble(0x30, 0);
        self.delay.delay_us(4_500);
        self.write_nibble(0x30, 0);
        self.delay.delay_us(150);
        self.write_nibble(0x20, 0);

        self.command(CMD_FUNCTION_4BIT_2LINE);
        self.command(CMD_DISPLAY_ON);
        self.clear();
        self.command(CMD_ENTRY_MODE_INC);
    }

    fn set_cursor(&mut self, col: u8, row: u8) {
        let row = row.min(self.rows.saturating_sub(1)).min(ROW_OFFSETS.len() as u8 - 1);
        let col = col.min(self.cols.saturating_sub(1));
        self.command(CMD_SET_DDRAM | (col + ROW_OFFSETS[row as usize]));
    }

    /// Non-ASCII characters are shown as `?` (the HD44780 ROM is not UTF-8).
    fn print(&mut self, text: &str) {
        for ch in text.chars() {
            let b = if ch.is_ascii() { ch as u8 } else { b'?' };
            self.data(b);
        }
    }

    fn clear(&mut self) {
        self.command(CMD_CLEAR);
        self.delay.delay_ms(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};

    #[derive(Default)]
    struct RecordingBus {
        writes: Vec<(u8, u8)>,
        fail: bool,
    }

    #[derive(Debug)]
    struct BusError;

    impl embedded_hal::i2c::Error for BusError {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    impl ErrorType for RecordingBus {
        type Error = BusError;
    }

    impl I2c for RecordingBus {
        fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
            if self.fail {
                return Err(BusError);
            }
            for op in operations {
                if let Operation::Write(bytes) = op {
                    for b in bytes.iter() {
                        self.writes.push((address, *b));
                    }
                }
            }
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    /// Reassemble bytes latched on the EN falling edge.
    fn latched_bytes(writes: &[(u8, u8)]) -> Vec<(u8, bool)> {
        let nibbles: Vec<(u8, bool)> = writes
            .windows(2)
            .filter(|w| w[0].1 & EN != 0 && w[1].1 & EN == 0)
            .map(|w| (w[0].1 & 0xF0, w[0].1 & RS != 0))
            .collect();
        nibbles.chunks(2).filter(|c| c.len() == 2).map(|c| (c[0].0 | (c[1].0 >> 4), c[0].1)).collect()
    }

    #[test]
    fn print_sends_data_bytes_with_rs() {
        let mut lcd = Lcd::new(RecordingBus::default(), NoDelay, 0x27, 20, 4);
        lcd.print("Hi");
        let (bus, _) = lcd.release();
        assert!(bus.writes.iter().all(|(a, b)| *a == 0x27 && b & BACKLIGHT != 0));
        assert_eq!(latched_bytes(&bus.writes), vec![(b'H', true), (b'i', true)]);
    }

    #[test]
    fn cursor_uses_row_offsets_and_clamps() {
        let mut lcd = Lcd::new(RecordingBus::default(), NoDelay, 0x26, 20, 4);
        lcd.set_cursor(3, 2);
        lcd.set_cursor(40, 9);
        let (bus, _) = lcd.release();
        assert_eq!(
            latched_bytes(&bus.writes),
            vec![(0x80 | (0x14 + 3), false), (0x80 | (0x54 + 19), false)]
        );
    }

    #[test]
    fn non_ascii_becomes_question_mark() {
        let mut lcd = Lcd::new(RecordingBus::default(), NoDelay, 0x27, 20, 4);
        lcd.print("°");
        let (bus, _) = lcd.release();
        assert_eq!(latched_bytes(&bus.writes), vec![(b'?', true)]);
    }

    #[test]
    fn bus_errors_are_counted_not_fatal() {
        let bus = RecordingBus { fail: true, ..Default::default() };
        let mut lcd = Lcd::new(bus, NoDelay, 0x27, 20, 4);
        lcd.init();
        lcd.print("x");
        assert!(lcd.bus_errors() > 0);
    }
}
