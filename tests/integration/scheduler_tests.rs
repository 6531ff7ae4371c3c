//! Full loop passes: Scheduler → AppService → mocks for every port.

use envguard::app::events::{AppEvent, Outbound};
use envguard::app::ports::WallTime;
use envguard::app::service::{ALERT_PAYLOAD, ONLINE_PAYLOAD};
use envguard::config::SystemConfig;
use envguard::control::mode::RelayState;
use envguard::display::DisplayPage;
use envguard::scheduler::{Io, Scheduler, MAX_INBOUND_PER_PASS};

use crate::mock_hw::*;

const TELEMETRY: &str = "ecs/upload";
const ALERT: &str = "room/alert";
const STATUS: &str = "room/status";

struct Rig {
    sched: Scheduler,
    board: MockBoard,
    readings: MockDisplay,
    status: MockDisplay,
    broker: MockBroker,
    link: MockLink,
    clock: FixedClock,
    sink: RecordingSink,
}

impl Rig {
    fn new() -> Self {
        let mut rig = Self {
            sched: Scheduler::new(SystemConfig::default(), R0_KOHM, MAC),
            board: MockBoard::new(),
            readings: MockDisplay::new(),
            status: MockDisplay::new(),
            broker: MockBroker::new(),
            link: MockLink::new(true),
            clock: FixedClock(None),
            sink: RecordingSink::new(),
        };
        let (sched, mut io) = rig.io_parts();
        sched.start(&mut io);
        rig
    }

    fn io_parts(&mut self) -> (&mut Scheduler, Io<'_>) {
        (
            &mut self.sched,
            Io {
                board: &mut self.board,
                readings_display: &mut self.readings,
                status_display: &mut self.status,
                broker: &mut self.broker,
                link: &mut self.link,
                clock: &self.clock,
                sink: &mut self.sink,
            },
        )
    }

    fn pass(&mut self, now_ms: u64) {
        let (sched, mut io) = self.io_parts();
        sched.run_pass(now_ms, &mut io);
    }

    /// Passes every `step` ms over `[from, to)`.
    fn run(&mut self, from: u64, to: u64, step: u64) {
        let mut now = from;
        while now < to {
            self.pass(now);
            now += step;
        }
    }
}

#[test]
fn start_shows_splash_and_idle_outputs() {
    let rig = Rig::new();
    assert_eq!(rig.status.row(0), "System Ready");
    assert_eq!(rig.status.row(1), "WiFi: Connected");
    assert_eq!(rig.board.relays(), Some(RelayState::default()));
}

#[test]
fn first_pass_connects_announces_and_samples() {
    let mut rig = Rig::new();
    rig.pass(0);

    assert!(rig.broker.connected);
    assert_eq!(rig.broker.published_on(STATUS), vec![ONLINE_PAYLOAD.to_owned()]);
    assert_eq!(rig.broker.subscriptions, vec![CONTROL_TOPIC.to_owned()]);
    assert_eq!(rig.board.reads, 1, "sensing runs on the first pass");

    let telemetry = rig.broker.published_on(TELEMETRY);
    assert_eq!(telemetry.len(), 1);
    let v: serde_json::Value = serde_json::from_str(&telemetry[0]).unwrap();
    assert_eq!(v["device_id"], MAC);
    assert_eq!(v["temperature"], 25.0);
    assert_eq!(v["humidity"], 40.0);

    assert_eq!(rig.readings.row(0), "T:25.0C H:40.0%");
    assert_eq!(rig.readings.row(2), "Fan:OFF  Pur:OFF");
    assert_eq!(rig.readings.row(3), "Status: Safe");
    assert_eq!(rig.status.row(0), "Status: OK");
    assert_eq!(rig.status.row(1), "WiFi:OK  MQTT:OK");
    assert_eq!(rig.status.row(2), "Mode: AUTO");
}

#[test]
fn sensing_follows_its_own_cadence() {
    let mut rig = Rig::new();
    rig.run(0, 10_000, 100);
    assert_eq!(rig.board.reads, 5);
    assert_eq!(rig.broker.published_on(TELEMETRY).len(), 5);
    assert_eq!(rig.sched.passes(), 100);
}

#[test]
fn gas_onset_publishes_single_alert() {
    let mut rig = Rig::new();
    rig.pass(0);
    rig.board.gas_raw = GAS_DANGER_RAW;
    // Onset at 2 s; stay inside the 5 s status hold that follows it.
    rig.run(100, 6_000, 100);

    assert_eq!(rig.broker.published_on(ALERT), vec![ALERT_PAYLOAD.to_owned()]);
    assert_eq!(rig.board.relays(), Some(RelayState { fan1: false, fan2: true }));
    assert!(rig.board.buzzing());
    assert_eq!(rig.readings.row(3), "Status: DANGER!");
    assert_eq!(rig.status.row(0), "!! DANGER !!");
}

#[test]
fn blink_toggles_once_per_period_across_passes() {
    let mut rig = Rig::new();
    rig.board.gas_raw = GAS_DANGER_RAW;
    rig.pass(0);
    let base = rig.board.red_toggles();

    // 1 s of 10 ms passes: four 250 ms periods.
    rig.run(10, 1_001, 10);
    assert_eq!(rig.board.red_toggles() - base, 4);
}

#[test]
fn broker_outage_drops_publishes_without_queueing() {
    let mut rig = Rig::new();
    rig.broker.reachable = false;
    rig.run(0, 4_001, 100);

    assert!(rig.broker.published.is_empty());
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::PublishDropped(Outbound::Telemetry))),
        3
    );
    assert_eq!(rig.board.reads, 3, "sensing continues offline");

    rig.broker.reachable = true;
    rig.run(4_100, 6_001, 100);
    // Only fresh traffic after reconnect: the announce and one sample.
    assert_eq!(rig.broker.published_on(STATUS).len(), 1);
    assert_eq!(rig.broker.published_on(TELEMETRY).len(), 1);
}

#[test]
fn broker_reconnect_resubscribes() {
    let mut rig = Rig::new();
    rig.pass(0);
    rig.broker.drop_session();
    rig.pass(100);
    assert_eq!(rig.broker.subscriptions.len(), 2);
    assert_eq!(rig.broker.published_on(STATUS).len(), 2);
}

#[test]
fn link_loss_forces_status_page_immediately() {
    let mut rig = Rig::new();
    rig.run(0, 5_100, 100);
    assert_eq!(rig.sched.page(), DisplayPage::Clock);
    assert_eq!(rig.status.row(0), "Time: Sync Error");
    assert_eq!(rig.status.row(1), "Date: N/A");

    rig.link.up = false;
    rig.pass(5_100);
    assert_eq!(rig.sched.page(), DisplayPage::Status);
    assert_eq!(rig.status.row(1), "WiFi: Offline");
    assert!(!rig.sched.connectivity().broker_up);
}

#[test]
fn clock_page_shows_synced_time() {
    let mut rig = Rig::new();
    rig.clock = FixedClock(Some(WallTime {
        year: 2026,
        month: 3,
        day: 9,
        hour: 7,
        minute: 5,
        second: 3,
    }));
    rig.run(0, 5_100, 100);
    assert_eq!(rig.status.row(0), "    07:05:03");
    assert_eq!(rig.status.row(1), "   09/03/2026");
}

#[test]
fn offline_link_is_retried_with_backoff() {
    let mut rig = Rig::new();
    rig.link.up = false;
    rig.run(0, 6_000, 100);
    assert_eq!(rig.link.kicks, 2);
    assert_eq!(rig.broker.connects, 0);
}

#[test]
fn remote_command_applies_within_the_pass() {
    let mut rig = Rig::new();
    rig.pass(0);
    rig.broker.inject(CONTROL_TOPIC, b"FAN_ON");
    rig.pass(100);

    assert_eq!(rig.board.relays(), Some(RelayState { fan1: true, fan2: false }));
    assert_eq!(rig.readings.row(2), "Fan:ON  Pur:OFF");

    // Next sensing cycle must not undo it.
    rig.run(200, 4_001, 100);
    assert_eq!(rig.board.relays(), Some(RelayState { fan1: true, fan2: false }));
}

#[test]
fn inbound_drain_is_bounded_per_pass() {
    let mut rig = Rig::new();
    rig.pass(0);
    for _ in 0..MAX_INBOUND_PER_PASS + 2 {
        rig.broker.inject(CONTROL_TOPIC, b"PURIFIER_ON");
    }
    rig.pass(100);
    assert_eq!(rig.broker.inbound.len(), 2);
    rig.pass(200);
    assert!(rig.broker.inbound.is_empty());
}

#[test]
fn sensor_fault_marks_readings_display() {
    let mut rig = Rig::new();
    rig.pass(0);
    rig.board.temperature_c = f32::NAN;
    rig.run(100, 2_001, 100);

    assert_eq!(rig.readings.row(3), "Sensor error");
    assert_eq!(rig.readings.row(0), "T:25.0C H:40.0%", "last good values stay");
    assert_eq!(rig.broker.published_on(TELEMETRY).len(), 1);
}
