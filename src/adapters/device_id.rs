//! Device identity derived from the ESP32 factory MAC address.
//!
//! The full MAC in upper-case, colon-separated form
//! (`AA:BB:CC:DD:EE:FF`) names the device in telemetry and forms the
//! suffix of its control topic.

/// Fixed-size device ID string (17 chars).
pub type DeviceIdString = heapless::String<24>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the Wi-Fi station MAC from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_read_mac(
            mac.as_mut_ptr(),
            esp_idf_svc::sys::esp_mac_type_t_ESP_MAC_WIFI_STA,
        );
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// Format: `AA:BB:CC:DD:EE:FF`.
pub fn device_id(mac: &MacAddress) -> DeviceIdString {
    use core::fmt::Write;
    let mut id = DeviceIdString::new();
    let _ = write!(
        id,
        "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    );
    id
}
