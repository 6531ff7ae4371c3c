//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements         | Connects to                  |
//! |-------------|--------------------|------------------------------|
//! | `hardware`  | SensorPort         | DHT22, MQ-7 via ADC1         |
//! |             | ActuatorPort       | relay + LED GPIOs            |
//! |             | ToneOutput         | LEDC buzzer channel          |
//! | `log_sink`  | EventSink          | Serial log output            |
//! | `mqtt`      | PubSubPort         | ESP-IDF MQTT client          |
//! | `time`      | ClockPort          | esp_timer + SNTP wall clock  |
//! | `wifi`      | LinkPort           | ESP-IDF WiFi STA             |
//! | `device_id` | —                  | eFuse station MAC            |
//!
//! The HD44780 panels implement `TextDisplay` directly in
//! `drivers::lcd`.

pub mod device_id;
pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod time;
pub mod wifi;
