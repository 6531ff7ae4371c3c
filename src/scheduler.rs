//! Cooperative control-loop scheduler.
//!
//! One call to [`Scheduler::run_pass`] is one trip around the main loop.
//! Nothing in a pass blocks; each task checks its own timer and returns
//! immediately when it is not due.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  run_pass(now)                                               │
//! │                                                              │
//! │  1. Connectivity ── poll link/broker, backoff reconnect,     │
//! │        │            announce + subscribe on broker up,       │
//! │        │            drain ≤ MAX_INBOUND_PER_PASS commands    │
//! │        ▼                                                     │
//! │  2. Sensing ─────── [sensing cadence] read → alert FSM →     │
//! │        │            relays/LEDs/buzzer → readings LCD →      │
//! │        │            telemetry (+ alert on gas onset)         │
//! │        ▼                                                     │
//! │  3. Status LCD ──── DisplayPageController (self-throttled)   │
//! │        │                                                     │
//! │        ▼                                                     │
//! │  4. Blink ───────── alert FSM tick (own period timer)        │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use log::{info, warn};

use crate::app::events::{AppEvent, Outbound};
use crate::app::ports::{Board, ClockPort, EventSink, LinkPort, PubSubPort, TextDisplay};
use crate::app::service::{AppService, ALERT_PAYLOAD, ONLINE_PAYLOAD};
use crate::config::SystemConfig;
use crate::connectivity::{ConnectivityState, ConnectivitySupervisor};
use crate::display::pages;
use crate::display::{DisplayPage, DisplayPageController, PageTimings};
use crate::error::CommsError;
use crate::sensors::SensorSample;

/// Upper bound on control messages handled in one pass.
pub const MAX_INBOUND_PER_PASS: usize = 8;

// ═══════════════════════════════════════════════════════════════
//  Cadence
// ═══════════════════════════════════════════════════════════════

/// Independent periodic timer keyed on its own last-run timestamp.
/// A cadence that has never run is due immediately.
#[derive(Debug, Clone, Copy)]
pub struct Cadence {
    interval_ms: u64,
    last_run_ms: Option<u64>,
}

impl Cadence {
    pub const fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_run_ms: None,
        }
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        match self.last_run_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
            None => true,
        }
    }

    /// If due, record the run and return `true`.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if self.is_due(now_ms) {
            self.last_run_ms = Some(now_ms);
            true
        } else {
            false
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  I/O bundle
// ═══════════════════════════════════════════════════════════════

/// Every adapter a pass touches, borrowed for the duration of the pass.
pub struct Io<'a> {
    pub board: &'a mut dyn Board,
    pub readings_display: &'a mut dyn TextDisplay,
    pub status_display: &'a mut dyn TextDisplay,
    pub broker: &'a mut dyn PubSubPort,
    pub link: &'a mut dyn LinkPort,
    pub clock: &'a dyn ClockPort,
    pub sink: &'a mut dyn EventSink,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

pub struct Scheduler {
    app: AppService,
    connectivity: ConnectivitySupervisor,
    pages: DisplayPageController,
    sensing: Cadence,
    passes: u64,
}

impl Scheduler {
    pub fn new(config: SystemConfig, r0_kohm: f32, device_id: &str) -> Self {
        let sensing = Cadence::new(u64::from(config.sensor_read_interval_ms));
        let pages = DisplayPageController::new(PageTimings::from(&config));
        Self {
            app: AppService::new(config, r0_kohm, device_id),
            connectivity: ConnectivitySupervisor::new(),
            pages,
            sensing,
            passes: 0,
        }
    }

    /// Put the outputs in their idle state and show the boot splash.
    pub fn start(&mut self, io: &mut Io<'_>) {
        self.app.start(io.board, io.sink);
        io.status_display.clear();
        pages::draw(io.status_display, &pages::splash_frame(io.link.is_link_up()));
    }

    /// One non-blocking trip around the loop.
    pub fn run_pass(&mut self, now_ms: u64, io: &mut Io<'_>) {
        self.passes += 1;

        let conn = self.service_connectivity(now_ms, io);

        if self.sensing.poll(now_ms) {
            self.run_sensing(now_ms, conn, io);
        }

        self.refresh_status_display(conn, now_ms, io);

        self.app.tick_blink(io.board, now_ms);
    }

    pub fn app(&self) -> &AppService {
        &self.app
    }

    pub fn connectivity(&self) -> ConnectivityState {
        self.connectivity.last_state()
    }

    pub fn page(&self) -> DisplayPage {
        self.pages.page()
    }

    pub fn passes(&self) -> u64 {
        self.passes
    }

    // ── 1. Connectivity + inbound commands ────────────────────

    fn service_connectivity(&mut self, now_ms: u64, io: &mut Io<'_>) -> ConnectivityState {
        let report = self.connectivity.poll(io.link, io.broker, now_ms);

        if report.changed {
            info!(
                "Connectivity: link={} broker={}",
                report.state.link_up, report.state.broker_up
            );
            io.sink.emit(&AppEvent::ConnectivityChanged(report.state));
        }

        if report.broker_came_up {
            self.announce(report.state, io);
        }

        if report.state.broker_up {
            self.drain_inbound(io);
        }

        report.state
    }

    fn announce(&mut self, conn: ConnectivityState, io: &mut Io<'_>) {
        let status_topic = self.app.config().status_topic.clone();
        self.publish(conn, Outbound::Status, &status_topic, ONLINE_PAYLOAD.as_bytes(), io);

        match io.broker.subscribe(self.app.control_topic()) {
            Ok(()) => info!("Subscribed to {}", self.app.control_topic()),
            Err(e) => warn!("Subscribe to {} failed: {e}", self.app.control_topic()),
        }
    }

    fn drain_inbound(&mut self, io: &mut Io<'_>) {
        let mut relays_touched = false;
        for _ in 0..MAX_INBOUND_PER_PASS {
            let Some(msg) = io.broker.poll_inbound() else {
                break;
            };
            relays_touched |= self.app.handle_inbound(&msg, io.board, io.sink);
        }

        // Keep the Fan/Pur row honest after a remote command.
        if relays_touched {
            if let Some(sample) = self.app.last_sample().copied() {
                self.draw_readings(&sample, io);
            }
        }
    }

    // ── 2. Sensing ────────────────────────────────────────────

    fn run_sensing(&mut self, now_ms: u64, conn: ConnectivityState, io: &mut Io<'_>) {
        let outcome = match self.app.sense(io.board, io.sink, now_ms) {
            Ok(o) => o,
            Err(e) => {
                warn!("Sensing skipped: {e}");
                pages::draw_line(
                    io.readings_display,
                    pages::SENSOR_ERROR_ROW,
                    &pages::sensor_error_line(),
                );
                return;
            }
        };

        self.draw_readings(&outcome.sample, io);

        match self.app.telemetry_json(&outcome.sample) {
            Ok(json) => {
                let topic = self.app.config().telemetry_topic.clone();
                self.publish(conn, Outbound::Telemetry, &topic, json.as_bytes(), io);
            }
            Err(e) => warn!("Telemetry encode failed: {e}"),
        }

        if outcome.gas_onset {
            let topic = self.app.config().alert_topic.clone();
            self.publish(conn, Outbound::Alert, &topic, ALERT_PAYLOAD.as_bytes(), io);
        }
    }

    fn draw_readings(&self, sample: &SensorSample, io: &mut Io<'_>) {
        let frame = pages::readings_frame(sample, self.app.relays(), self.app.is_danger());
        pages::draw(io.readings_display, &frame);
    }

    // ── 3. Status display ─────────────────────────────────────

    fn refresh_status_display(&mut self, conn: ConnectivityState, now_ms: u64, io: &mut Io<'_>) {
        let Some(page) = self.pages.poll(conn, self.app.is_danger(), now_ms) else {
            return;
        };
        let frame = match page {
            DisplayPage::Status => pages::status_frame(self.app.alert_status(), conn, self.app.mode()),
            DisplayPage::Clock => pages::clock_frame(io.clock.local_time()),
        };
        pages::draw(io.status_display, &frame);
    }

    // ── Publish helper ────────────────────────────────────────

    /// Publish if the broker is up; otherwise drop.  Never queues.
    fn publish(
        &mut self,
        conn: ConnectivityState,
        kind: Outbound,
        topic: &str,
        payload: &[u8],
        io: &mut Io<'_>,
    ) {
        let result = if conn.broker_up {
            io.broker.publish(topic, payload)
        } else {
            Err(CommsError::TransportUnavailable)
        };
        if let Err(e) = result {
            warn!("Dropped {} publish on {topic}: {e}", kind.as_str());
            io.sink.emit(&AppEvent::PublishDropped(kind));
        }
    }
}
