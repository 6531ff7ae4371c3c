//! Page rendering for the two 20x4 character displays.
//!
//! Every page is rendered to a full [`Frame`]: four lines, each padded to
//! the panel width, so a redraw overwrites stale characters without a
//! flicker-inducing `clear()`.
//!
//! ```text
//!   Status page          Clock page           Readings display
//!  ┌────────────────────┐┌────────────────────┐┌────────────────────┐
//!  │!! DANGER !!        ││    14:05:09        ││T:24.6C H:51.0%     │
//!  │WiFi:OK  MQTT:OK    ││   18/10/2026       ││CO:3.2ppm           │
//!  │Mode: AUTO          ││                    ││Fan:OFF  Pur:OFF    │
//!  │                    ││                    ││Status: Safe        │
//!  └────────────────────┘└────────────────────┘└────────────────────┘
//! ```

use core::fmt::{self, Write};

use crate::app::ports::{TextDisplay, WallTime};
use crate::connectivity::ConnectivityState;
use crate::control::mode::{ActuationMode, RelayState};
use crate::fsm::context::AlertStatus;
use crate::sensors::SensorSample;

pub const LCD_COLS: usize = 20;
pub const LCD_ROWS: usize = 4;

pub type Line = heapless::String<LCD_COLS>;
pub type Frame = [Line; LCD_ROWS];

/// `fmt::Write` sink that silently drops whatever does not fit.
struct Truncating<'a>(&'a mut Line);

impl Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for ch in s.chars() {
            if self.0.push(ch).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Format into a full-width line: truncated at the panel edge, padded
/// with spaces to it.
pub fn line(args: fmt::Arguments<'_>) -> Line {
    let mut out = Line::new();
    let _ = Truncating(&mut out).write_fmt(args);
    while out.push(' ').is_ok() {}
    out
}

fn blank() -> Line {
    line(format_args!(""))
}

// ── Status page ─────────────────────────────────────────────────

fn alert_headline(alert: &AlertStatus) -> &'static str {
    if alert.gas_danger {
        "!! DANGER !!"
    } else if alert.temp_high {
        "TEMP HIGH!"
    } else {
        "Status: OK"
    }
}

fn connectivity_summary(conn: ConnectivityState) -> &'static str {
    match (conn.link_up, conn.broker_up) {
        (false, _) => "WiFi: Offline",
        (true, true) => "WiFi:OK  MQTT:OK",
        (true, false) => "WiFi:OK  MQTT:--",
    }
}

pub fn status_frame(alert: &AlertStatus, conn: ConnectivityState, mode: ActuationMode) -> Frame {
    [
        line(format_args!("{}", alert_headline(alert))),
        line(format_args!("{}", connectivity_summary(conn))),
        line(format_args!("Mode: {}", mode.as_str())),
        blank(),
    ]
}

// ── Clock page ──────────────────────────────────────────────────

pub fn clock_frame(time: Option<WallTime>) -> Frame {
    match time {
        Some(t) => [
            line(format_args!("    {:02}:{:02}:{:02}", t.hour, t.minute, t.second)),
            line(format_args!("   {:02}/{:02}/{:04}", t.day, t.month, t.year)),
            blank(),
            blank(),
        ],
        None => [
            line(format_args!("Time: Sync Error")),
            line(format_args!("Date: N/A")),
            blank(),
            blank(),
        ],
    }
}

// ── Readings display ────────────────────────────────────────────

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

pub fn readings_frame(sample: &SensorSample, relays: RelayState, danger: bool) -> Frame {
    [
        line(format_args!("T:{:.1}C H:{:.1}%", sample.temperature_c, sample.humidity_pct)),
        line(format_args!("CO:{:.1}ppm", sample.co_ppm)),
        line(format_args!("Fan:{}  Pur:{}", on_off(relays.fan1), on_off(relays.fan2))),
        line(format_args!("{}", if danger { "Status: DANGER!" } else { "Status: Safe" })),
    ]
}

/// Bottom row of the readings display after a failed sample.  The rows
/// above keep the last good values.
pub const SENSOR_ERROR_ROW: u8 = 3;

pub fn sensor_error_line() -> Line {
    line(format_args!("Sensor error"))
}

// ── Boot splash ─────────────────────────────────────────────────

pub fn splash_frame(link_up: bool) -> Frame {
    [
        line(format_args!("System Ready")),
        line(format_args!("{}", if link_up { "WiFi: Connected" } else { "WiFi: Offline" })),
        blank(),
        blank(),
    ]
}

// ── Output ──────────────────────────────────────────────────────

pub fn draw_line(display: &mut (impl TextDisplay + ?Sized), row: u8, text: &Line) {
    display.set_cursor(0, row);
    display.print(text);
}

pub fn draw(display: &mut (impl TextDisplay + ?Sized), frame: &Frame) {
    for (row, text) in frame.iter().enumerate() {
        draw_line(display, row as u8, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(gas: bool, temp: bool) -> AlertStatus {
        AlertStatus {
            gas_danger: gas,
            temp_high: temp,
            ..AlertStatus::default()
        }
    }

    const ONLINE: ConnectivityState = ConnectivityState { link_up: true, broker_up: true };

    #[test]
    fn lines_are_padded_to_panel_width() {
        let l = line(format_args!("abc"));
        assert_eq!(l.len(), LCD_COLS);
        assert!(l.starts_with("abc "));
    }

    #[test]
    fn long_lines_are_truncated() {
        let l = line(format_args!("{}", "x".repeat(40)));
        assert_eq!(l.len(), LCD_COLS);
    }

    #[test]
    fn headline_priority_chain() {
        let m = ActuationMode::Automatic;
        assert!(status_frame(&alert(true, true), ONLINE, m)[0].starts_with("!! DANGER !!"));
        assert!(status_frame(&alert(false, true), ONLINE, m)[0].starts_with("TEMP HIGH!"));
        assert!(status_frame(&alert(false, false), ONLINE, m)[0].starts_with("Status: OK"));
    }

    #[test]
    fn connectivity_line_variants() {
        let a = alert(false, false);
        let m = ActuationMode::Manual;
        let broker_down = ConnectivityState { link_up: true, broker_up: false };
        let offline = ConnectivityState { link_up: false, broker_up: false };
        assert_eq!(status_frame(&a, ONLINE, m)[1].trim_end(), "WiFi:OK  MQTT:OK");
        assert_eq!(status_frame(&a, broker_down, m)[1].trim_end(), "WiFi:OK  MQTT:--");
        assert_eq!(status_frame(&a, offline, m)[1].trim_end(), "WiFi: Offline");
        assert_eq!(status_frame(&a, offline, m)[2].trim_end(), "Mode: MANUAL");
    }

    #[test]
    fn clock_positions() {
        let t = WallTime { year: 2026, month: 3, day: 7, hour: 9, minute: 5, second: 1 };
        let f = clock_frame(Some(t));
        assert_eq!(f[0].trim_end(), "    09:05:01");
        assert_eq!(f[1].trim_end(), "   07/03/2026");
    }

    #[test]
    fn clock_without_sync() {
        let f = clock_frame(None);
        assert_eq!(f[0].trim_end(), "Time: Sync Error");
        assert_eq!(f[1].trim_end(), "Date: N/A");
    }

    #[test]
    fn readings_lines() {
        let s = SensorSample { temperature_c: 24.56, humidity_pct: 51.0, co_ppm: 3.24, valid_at_ms: 0 };
        let f = readings_frame(&s, RelayState { fan1: true, fan2: false }, false);
        assert_eq!(f[0].trim_end(), "T:24.6C H:51.0%");
        assert_eq!(f[1].trim_end(), "CO:3.2ppm");
        assert_eq!(f[2].trim_end(), "Fan:ON  Pur:OFF");
        assert_eq!(f[3].trim_end(), "Status: Safe");

        let f = readings_frame(&s, RelayState::default(), true);
        assert_eq!(f[3].trim_end(), "Status: DANGER!");
    }
}
