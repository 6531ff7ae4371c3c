//! ESP32 time adapter.
//!
//! Implements [`ClockPort`].
//!
//! - **`target_os = "espidf"`** — uptime from `esp_timer_get_time()`;
//!   wall time from the SNTP-disciplined system clock via `localtime_r`
//!   (the timezone is set once at startup from `utc_offset_secs`).
//! - **`not(target_os = "espidf")`** — uptime from `std::time::Instant`;
//!   wall time is never synced.

use crate::app::ports::{ClockPort, WallTime};

/// Anything before 2020-01-01 means SNTP has not synced yet.
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
const EPOCH_2020: i64 = 1_577_836_800;

/// Time adapter for the ESP32-S3 platform.
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }
}

/// POSIX `TZ` string for a fixed offset east of UTC (`ICT-7` style: the
/// POSIX sign is inverted).
pub fn posix_tz(utc_offset_secs: i32) -> heapless::String<16> {
    use core::fmt::Write;
    let mut tz = heapless::String::new();
    let sign = if utc_offset_secs >= 0 { '-' } else { '+' };
    let abs = utc_offset_secs.unsigned_abs();
    let (h, m) = (abs / 3600, (abs % 3600) / 60);
    let _ = if m == 0 {
        write!(tz, "UTC{sign}{h}")
    } else {
        write!(tz, "UTC{sign}{h}:{m:02}")
    };
    tz
}

#[cfg(target_os = "espidf")]
impl ClockPort for Esp32TimeAdapter {
    fn uptime_ms(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }

    fn local_time(&self) -> Option<WallTime> {
        use core::ptr;
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, ptr::null_mut()) } != 0 {
            return None;
        }
        if (tv.tv_sec as i64) < EPOCH_2020 {
            return None;
        }
        let secs = tv.tv_sec as esp_idf_svc::sys::time_t;
        let mut tm: esp_idf_svc::sys::tm = unsafe { core::mem::zeroed() };
        if unsafe { esp_idf_svc::sys::localtime_r(&secs, &mut tm) }.is_null() {
            return None;
        }
        Some(WallTime {
            year: (tm.tm_year + 1900) as u16,
            month: (tm.tm_mon + 1) as u8,
            day: tm.tm_mday as u8,
            hour: tm.tm_hour as u8,
            minute: tm.tm_min as u8,
            second: tm.tm_sec as u8,
        })
    }
}

#[cfg(not(target_os = "espidf"))]
impl ClockPort for Esp32TimeAdapter {
    fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn local_time(&self) -> Option<WallTime> {
        None
    }
}
