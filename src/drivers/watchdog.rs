//! Task Watchdog Timer (TWDT) driver.
//!
//! Resets the device if the control loop stops passing for longer than
//! the configured timeout.  The loop calls [`Watchdog::feed`] once per
//! pass; a pass is a few milliseconds, so the margin is wide.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::{info, warn};

/// Default stall timeout.
pub const DEFAULT_TIMEOUT_MS: u32 = 10_000;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
    #[cfg(not(target_os = "espidf"))]
    feeds: u64,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_MS)
    }
}

impl Watchdog {
    /// Reconfigure the TWDT and subscribe the calling task.
    #[cfg(target_os = "espidf")]
    pub fn new(timeout_ms: u32) -> Self {
        unsafe {
            let cfg = esp_task_wdt_config_t {
                timeout_ms,
                idle_core_mask: 0,
                trigger_panic: true,
            };
            let ret = esp_task_wdt_reconfigure(&cfg);
            if ret != ESP_OK {
                warn!("TWDT reconfigure returned {} (may already be configured)", ret);
            }

            let ret = esp_task_wdt_add(core::ptr::null_mut());
            let subscribed = ret == ESP_OK;
            if subscribed {
                info!("Watchdog: subscribed ({} ms timeout, panic on trigger)", timeout_ms);
            } else {
                warn!("Watchdog: failed to subscribe ({})", ret);
            }
            Self { subscribed }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(timeout_ms: u32) -> Self {
        if timeout_ms == 0 {
            warn!("Watchdog(sim): zero timeout");
        }
        info!("Watchdog(sim): no-op ({} ms)", timeout_ms);
        Self { feeds: 0 }
    }

    #[cfg(target_os = "espidf")]
    pub fn feed(&mut self) {
        if self.subscribed {
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn feed(&mut self) {
        self.feeds += 1;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn feeds(&self) -> u64 {
        self.feeds
    }
}
