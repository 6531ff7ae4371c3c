//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production, stderr on host).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn on_off(b: bool) -> &'static str {
    if b { "ON" } else { "OFF" }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { r0_kohm } => {
                info!("START | r0={:.2}kOhm", r0_kohm);
            }
            AppEvent::SampleTaken(s) => {
                info!(
                    "TELEM | T={:.1}\u{00b0}C | H={:.1}% | CO={:.1}ppm | t={}ms",
                    s.temperature_c, s.humidity_pct, s.co_ppm, s.valid_at_ms,
                );
            }
            AppEvent::SensorFault => {
                warn!("SENSE | climate sensor read failed, keeping previous sample");
            }
            AppEvent::AlertChanged { from, to } => {
                info!("ALERT | {:?} -> {:?}", from, to);
            }
            AppEvent::ModeChanged { mode, relays } => {
                info!(
                    "MODE  | {} | fan={} purifier={}",
                    mode.as_str(),
                    on_off(relays.fan1),
                    on_off(relays.fan2),
                );
            }
            AppEvent::RelaysChanged(r) => {
                info!("RELAY | fan={} purifier={}", on_off(r.fan1), on_off(r.fan2));
            }
            AppEvent::CommandRejected { payload } => {
                warn!("CMD   | unknown command ({} bytes)", payload.len());
            }
            AppEvent::ConnectivityChanged(c) => {
                info!(
                    "NET   | wifi={} mqtt={}",
                    if c.link_up { "UP" } else { "DOWN" },
                    if c.broker_up { "UP" } else { "DOWN" },
                );
            }
            AppEvent::PublishDropped(kind) => {
                warn!("PUB   | {} dropped, broker unavailable", kind.as_str());
            }
        }
    }
}
