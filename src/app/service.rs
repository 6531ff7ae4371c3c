//! Application service — the hexagonal core.
//!
//! [`AppService`] owns every piece of mutable domain state: the latest
//! sample, the alert machine, the mode controller and the last levels
//! written to the relays and indicators.  All I/O flows through port
//! traits passed in at call sites, so the whole service runs against
//! mock adapters in tests.
//!
//! ```text
//!   SensorPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                  │        AppService         │
//!  ActuatorPort ◀──│  Alert FSM · Mode · Cache │
//!    ToneOutput ◀──└──────────────────────────┘
//! ```

use core::fmt::Write;

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::SystemConfig;
use crate::control::mode::{ActuationMode, ModeController, RelayState};
use crate::error::SensorError;
use crate::fsm::context::{AlertStatus, AlertThresholds, IndicatorOutputs};
use crate::fsm::{AlertMachine, StateId};
use crate::sensors::gas::GasModel;
use crate::sensors::{SensorAggregator, SensorSample};

use super::commands::Command;
use super::events::AppEvent;
use super::ports::{ActuatorPort, Board, EventSink, InboundMessage, ToneOutput};

/// Payload published on the alert topic at gas-danger onset.
pub const ALERT_PAYLOAD: &str = "HIGH CO DETECTED!";
/// Payload published on the status topic after every broker connect.
pub const ONLINE_PAYLOAD: &str = "online";

pub type DeviceId = heapless::String<24>;
pub type Topic = heapless::String<64>;

/// What a successful sensing cycle produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SenseOutcome {
    pub sample: SensorSample,
    /// Gas danger went from false to true on this sample.
    pub gas_onset: bool,
}

/// Telemetry JSON body.
#[derive(Debug, Serialize)]
struct Telemetry<'a> {
    device_id: &'a str,
    temperature: f32,
    humidity: f32,
    co_level: f32,
}

fn round2(x: f32) -> f32 {
    (x * 100.0).round() / 100.0
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService {
    config: SystemConfig,
    aggregator: SensorAggregator,
    alert: AlertMachine,
    mode: ModeController,
    last_sample: Option<SensorSample>,
    applied_relays: Option<RelayState>,
    applied_leds: Option<(bool, bool)>,
    applied_buzzer: Option<bool>,
    device_id: DeviceId,
    control_topic: Topic,
}

impl AppService {
    /// `r0_kohm` comes from startup calibration; `device_id` is the
    /// colon-separated MAC that names the control topic.
    pub fn new(config: SystemConfig, r0_kohm: f32, device_id: &str) -> Self {
        let mut id = DeviceId::new();
        let _ = id.push_str(device_id);
        let mut control_topic = Topic::new();
        let _ = write!(control_topic, "{}{}", config.control_topic_prefix, id);

        Self {
            aggregator: SensorAggregator::new(r0_kohm),
            alert: AlertMachine::new(AlertThresholds::from(&config)),
            mode: ModeController::new(),
            last_sample: None,
            applied_relays: None,
            applied_leds: None,
            applied_buzzer: None,
            device_id: id,
            control_topic,
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive every output to its initial level (relays off, green on).
    pub fn start(&mut self, hw: &mut (impl Board + ?Sized), sink: &mut (impl EventSink + ?Sized)) {
        self.apply_relays(hw, sink);
        self.apply_indicators(hw);
        sink.emit(&AppEvent::Started {
            r0_kohm: self.aggregator.r0_kohm(),
        });
        info!(
            "AppService started: device={} control_topic={}",
            self.device_id, self.control_topic
        );
    }

    // ── Sensing ───────────────────────────────────────────────

    /// One sensing cycle: read, evaluate, actuate.
    ///
    /// On `InvalidReading` nothing is evaluated or written; the previous
    /// sample, alert flags and relay levels all stand.
    pub fn sense(
        &mut self,
        hw: &mut (impl Board + ?Sized),
        sink: &mut (impl EventSink + ?Sized),
        now_ms: u64,
    ) -> Result<SenseOutcome, SensorError> {
        let sample = match self.aggregator.read_all(hw, now_ms) {
            Ok(s) => s,
            Err(e) => {
                sink.emit(&AppEvent::SensorFault);
                return Err(e);
            }
        };

        let prev_level = self.alert.level();
        let prev_gas = self.alert.status().gas_danger;
        self.alert.evaluate(&sample, now_ms);
        self.last_sample = Some(sample);

        self.apply_relays(hw, sink);
        self.apply_indicators(hw);

        sink.emit(&AppEvent::SampleTaken(sample));
        let level = self.alert.level();
        if level != prev_level {
            sink.emit(&AppEvent::AlertChanged {
                from: prev_level,
                to: level,
            });
        }

        Ok(SenseOutcome {
            sample,
            gas_onset: !prev_gas && self.alert.status().gas_danger,
        })
    }

    /// Blink oscillator step; writes the LEDs only when a level changes.
    pub fn tick_blink(&mut self, hw: &mut (impl Board + ?Sized), now_ms: u64) {
        if !self.alert.is_danger() {
            return;
        }
        self.alert.tick(now_ms);
        self.apply_indicators(hw);
    }

    // ── Commands ──────────────────────────────────────────────

    /// Handle one inbound control message.  Returns `true` if the mode or
    /// the manual relays changed (relays are then re-resolved and written
    /// immediately).
    pub fn handle_inbound(
        &mut self,
        msg: &InboundMessage,
        hw: &mut (impl ActuatorPort + ?Sized),
        sink: &mut (impl EventSink + ?Sized),
    ) -> bool {
        if msg.topic.as_str() != self.control_topic.as_str() {
            debug!("Ignoring message on foreign topic {}", msg.topic);
            return false;
        }

        let cmd = match Command::parse(&msg.payload) {
            Ok(cmd) => cmd,
            Err(e) => {
                warn!("{e}: {:?}", core::str::from_utf8(&msg.payload).unwrap_or("<binary>"));
                sink.emit(&AppEvent::CommandRejected {
                    payload: msg.payload.clone(),
                });
                return false;
            }
        };

        info!("Command received: {}", cmd.as_str());
        if !self.mode.apply_command(cmd, self.alert.status()) {
            return false;
        }

        sink.emit(&AppEvent::ModeChanged {
            mode: self.mode.mode(),
            relays: self.mode.resolve_relays(self.alert.status()),
        });
        self.apply_relays(hw, sink);
        true
    }

    // ── Outbound payloads ─────────────────────────────────────

    /// Telemetry JSON: values rounded to two decimals, CO capped at the
    /// model ceiling.
    pub fn telemetry_json(&self, sample: &SensorSample) -> Result<String, serde_json::Error> {
        serde_json::to_string(&Telemetry {
            device_id: &self.device_id,
            temperature: round2(sample.temperature_c),
            humidity: round2(sample.humidity_pct),
            co_level: round2(sample.co_ppm.clamp(0.0, GasModel::PPM_CEILING)),
        })
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn control_topic(&self) -> &str {
        &self.control_topic
    }

    pub fn mode(&self) -> ActuationMode {
        self.mode.mode()
    }

    pub fn alert_status(&self) -> &AlertStatus {
        self.alert.status()
    }

    pub fn alert_level(&self) -> StateId {
        self.alert.level()
    }

    pub fn is_danger(&self) -> bool {
        self.alert.is_danger()
    }

    pub fn indicators(&self) -> IndicatorOutputs {
        self.alert.outputs()
    }

    /// Relay levels for the current mode and alert flags.
    pub fn relays(&self) -> RelayState {
        self.mode.resolve_relays(self.alert.status())
    }

    pub fn last_sample(&self) -> Option<&SensorSample> {
        self.last_sample.as_ref()
    }

    // ── Internal ──────────────────────────────────────────────

    fn apply_relays(&mut self, hw: &mut (impl ActuatorPort + ?Sized), sink: &mut (impl EventSink + ?Sized)) {
        let relays = self.relays();
        if self.applied_relays == Some(relays) {
            return;
        }
        hw.set_relays(relays);
        self.applied_relays = Some(relays);
        sink.emit(&AppEvent::RelaysChanged(relays));
    }

    fn apply_indicators(&mut self, hw: &mut (impl Board + ?Sized)) {
        let out = self.alert.outputs();

        let leds = (out.led_red, out.led_green);
        if self.applied_leds != Some(leds) {
            hw.set_indicators(out.led_red, out.led_green);
            self.applied_leds = Some(leds);
        }

        if self.applied_buzzer != Some(out.buzzer) {
            set_buzzer(hw, out.buzzer, self.config.buzzer_tone_hz);
            self.applied_buzzer = Some(out.buzzer);
        }
    }
}

fn set_buzzer(hw: &mut (impl ToneOutput + ?Sized), on: bool, freq_hz: u32) {
    if on {
        hw.tone(freq_hz);
    } else {
        hw.silence();
    }
}
