//! WiFi station-mode adapter.
//!
//! Implements [`LinkPort`] — the hexagonal boundary for link-layer
//! connectivity.  Reconnect pacing lives in the connectivity supervisor;
//! this adapter only reports association state and kicks a
//! non-blocking reassociation when asked.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stub whose link state is set by tests.

use core::fmt;
use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::LinkPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiError {
    InvalidSsid,
    InvalidPassword,
    DriverFailed,
}

impl fmt::Display for WifiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::DriverFailed => write!(f, "WiFi driver call failed"),
        }
    }
}

impl core::error::Error for WifiError {}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

pub fn validate_ssid(ssid: &str) -> Result<(), WifiError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(WifiError::InvalidSsid);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), WifiError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(WifiError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF adapter
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct WifiAdapter {
    wifi: esp_idf_svc::wifi::EspWifi<'static>,
}

#[cfg(target_os = "espidf")]
impl WifiAdapter {
    /// Configure STA mode, start the driver and begin association.
    /// Does not wait for an IP; see [`wait_link_up`](Self::wait_link_up).
    pub fn start(
        modem: esp_idf_svc::hal::modem::Modem,
        sysloop: esp_idf_svc::eventloop::EspSystemEventLoop,
        nvs: Option<esp_idf_svc::nvs::EspDefaultNvsPartition>,
        ssid: &str,
        password: &str,
    ) -> Result<Self, WifiError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};

        validate_ssid(ssid)?;
        validate_password(password)?;

        let mut wifi = EspWifi::new(modem, sysloop, nvs).map_err(|e| {
            warn!("WiFi: driver init failed: {e}");
            WifiError::DriverFailed
        })?;

        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let client = ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| WifiError::InvalidSsid)?,
            password: password.try_into().map_err(|_| WifiError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        };
        wifi.set_configuration(&Configuration::Client(client))
            .map_err(|_| WifiError::DriverFailed)?;
        wifi.start().map_err(|_| WifiError::DriverFailed)?;
        info!("WiFi: connecting to '{}'", ssid);
        if let Err(e) = wifi.connect() {
            warn!("WiFi: initial connect failed: {e}");
        }
        Ok(Self { wifi })
    }

    /// Startup-only blocking wait for association + IP.
    pub fn wait_link_up(&self, timeout_ms: u32) -> bool {
        let mut waited = 0;
        while waited < timeout_ms {
            if self.is_link_up() {
                return true;
            }
            esp_idf_svc::hal::delay::FreeRtos::delay_ms(100);
            waited += 100;
        }
        false
    }
}

#[cfg(target_os = "espidf")]
impl LinkPort for WifiAdapter {
    fn is_link_up(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false) && self.wifi.sta_netif().is_up().unwrap_or(false)
    }

    fn reconnect(&mut self) {
        if let Err(e) = self.wifi.connect() {
            warn!("WiFi: reconnect kick failed: {e}");
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation adapter
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub struct WifiAdapter {
    up: bool,
    reconnects: u32,
}

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    pub fn start(ssid: &str, password: &str) -> Result<Self, WifiError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        info!("WiFi(sim): associated with '{}'", ssid);
        Ok(Self { up: true, reconnects: 0 })
    }

    pub fn sim_set_link(&mut self, up: bool) {
        self.up = up;
    }

    pub fn reconnect_count(&self) -> u32 {
        self.reconnects
    }
}

#[cfg(not(target_os = "espidf"))]
impl LinkPort for WifiAdapter {
    fn is_link_up(&self) -> bool {
        self.up
    }

    fn reconnect(&mut self) {
        self.reconnects += 1;
        info!("WiFi(sim): reconnect kick #{}", self.reconnects);
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
