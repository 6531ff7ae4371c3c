//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService / Scheduler (domain)
//! ```
//!
//! Driven adapters (climate + gas sensor, relays, LEDs, buzzer, character
//! displays, MQTT client, Wi-Fi station, clock, event sinks) implement
//! these traits.  The domain core consumes them via generics or trait
//! objects, so it never touches registers directly and a test harness can
//! substitute in-memory fakes.

use crate::control::mode::RelayState;
use crate::error::CommsError;

/// Maximum topic length carried in an [`InboundMessage`].
pub const MAX_TOPIC_LEN: usize = 64;
/// Maximum command payload length carried in an [`InboundMessage`].
pub const MAX_PAYLOAD_LEN: usize = 64;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the climate sensor and the MQ-7 gas sensor.
pub trait SensorPort {
    /// Air temperature in °C, or NaN when the sensor did not answer.
    fn read_temperature_celsius(&mut self) -> f32;

    /// Relative humidity in %, or NaN when the sensor did not answer.
    fn read_humidity_percent(&mut self) -> f32;

    /// Raw 12-bit ADC count from the gas sensor divider.
    fn read_raw_gas_adc(&mut self) -> u16;
}

// ───────────────────────────────────────────────────────────────
// Actuator ports (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Relays and the two status LEDs.
pub trait ActuatorPort {
    /// Drive both fan relays (active high).
    fn set_relays(&mut self, relays: RelayState);

    /// Drive the red (danger) and green (normal) LEDs.
    fn set_indicators(&mut self, red: bool, green: bool);
}

/// PWM tone generator behind the piezo buzzer.
pub trait ToneOutput {
    /// Start (or retune) a square-wave tone.
    fn tone(&mut self, freq_hz: u32);

    /// Stop the tone.
    fn silence(&mut self);
}

/// Character display (HD44780-class, row/column addressed).
pub trait TextDisplay {
    /// Power-on initialisation sequence.
    fn init(&mut self);

    /// Move the cursor.  Out-of-range positions are clamped by the driver.
    fn set_cursor(&mut self, col: u8, row: u8);

    /// Write text at the cursor.
    fn print(&mut self, text: &str);

    /// Blank the whole panel.
    fn clear(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Network ports
// ───────────────────────────────────────────────────────────────

/// A control message delivered by the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: heapless::String<MAX_TOPIC_LEN>,
    pub payload: heapless::Vec<u8, MAX_PAYLOAD_LEN>,
}

impl InboundMessage {
    /// Build a message, truncating oversized topics/payloads rather than
    /// failing (inbound data is untrusted and only ever compared exactly).
    pub fn new(topic: &str, payload: &[u8]) -> Self {
        let mut t = heapless::String::new();
        for ch in topic.chars() {
            if t.push(ch).is_err() {
                break;
            }
        }
        let n = payload.len().min(MAX_PAYLOAD_LEN);
        let mut p = heapless::Vec::new();
        // n <= capacity, cannot fail
        let _ = p.extend_from_slice(&payload[..n]);
        Self { topic: t, payload: p }
    }
}

/// Publish/subscribe transport (MQTT in production).
pub trait PubSubPort {
    /// Non-blocking connect attempt.  Returns `Ok` once the session is up.
    fn connect(&mut self) -> Result<(), CommsError>;

    /// Whether the broker session is currently established.
    fn is_connected(&self) -> bool;

    /// Publish a message.  Must return `TransportUnavailable` instead of
    /// blocking or queueing while disconnected.
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError>;

    /// Subscribe to a topic on the current session.
    fn subscribe(&mut self, topic: &str) -> Result<(), CommsError>;

    /// Pop the next pending inbound message, if any.
    fn poll_inbound(&mut self) -> Option<InboundMessage>;
}

/// Wi-Fi station association.
pub trait LinkPort {
    /// Whether the station is associated and has an IP.
    fn is_link_up(&self) -> bool;

    /// Kick a non-blocking reassociation attempt.
    fn reconnect(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Local calendar time as shown on the clock page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// Monotonic and wall-clock time source.
pub trait ClockPort {
    /// Milliseconds since boot (monotonic).
    fn uptime_ms(&self) -> u64;

    /// Local time, or `None` while SNTP has not synced yet.
    fn local_time(&self) -> Option<WallTime>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, a test
/// recorder, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Board bundle
// ───────────────────────────────────────────────────────────────

/// Everything on the main board that the sensing cycle touches: sensors,
/// relays, LEDs and the buzzer.  Blanket-implemented so any adapter that
/// provides the three ports can be handed to the scheduler as one object.
pub trait Board: SensorPort + ActuatorPort + ToneOutput {}

impl<T: SensorPort + ActuatorPort + ToneOutput> Board for T {}
