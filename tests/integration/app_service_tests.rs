//! AppService → alert FSM → relays / indicators, driven through mocks.

use envguard::app::events::AppEvent;
use envguard::app::ports::InboundMessage;
use envguard::app::service::AppService;
use envguard::config::SystemConfig;
use envguard::control::mode::{ActuationMode, RelayState};
use envguard::fsm::StateId;
use envguard::sensors::gas::GasModel;

use crate::mock_hw::*;

fn service() -> AppService {
    AppService::new(SystemConfig::default(), R0_KOHM, MAC)
}

fn started() -> (AppService, MockBoard, RecordingSink) {
    let mut app = service();
    let mut hw = MockBoard::new();
    let mut sink = RecordingSink::new();
    app.start(&mut hw, &mut sink);
    (app, hw, sink)
}

fn cmd(payload: &[u8]) -> InboundMessage {
    InboundMessage::new(CONTROL_TOPIC, payload)
}

#[test]
fn mock_gas_levels_straddle_threshold() {
    let limit = SystemConfig::default().co_danger_threshold_ppm;
    assert!(GasModel::estimate_ppm(GAS_CLEAN_RAW, R0_KOHM) < limit);
    assert!(GasModel::estimate_ppm(GAS_DANGER_RAW, R0_KOHM) > limit);
}

#[test]
fn start_drives_idle_outputs() {
    let (app, hw, sink) = started();
    assert_eq!(hw.relays(), Some(RelayState::default()));
    assert_eq!(hw.indicators(), Some((false, true)));
    assert!(!hw.buzzing());
    assert_eq!(app.alert_level(), StateId::Safe);
    assert!(matches!(sink.events.last(), Some(AppEvent::Started { .. })));
}

#[test]
fn automatic_hot_room_runs_fan_only() {
    let (mut app, mut hw, mut sink) = started();
    hw.temperature_c = 36.0;
    let out = app.sense(&mut hw, &mut sink, 2_000).unwrap();

    assert!(!out.gas_onset);
    assert_eq!(hw.relays(), Some(RelayState { fan1: true, fan2: false }));
    assert_eq!(app.alert_level(), StateId::Danger);
    assert!(!hw.buzzing(), "temperature alone does not sound the buzzer");
}

#[test]
fn threshold_comparison_is_strict() {
    let (mut app, mut hw, mut sink) = started();
    hw.temperature_c = 35.0;
    app.sense(&mut hw, &mut sink, 0).unwrap();
    assert!(!app.alert_status().temp_high);
    assert_eq!(app.alert_level(), StateId::Safe);
}

#[test]
fn fan_on_command_latches_manual_mode() {
    let (mut app, mut hw, mut sink) = started();

    assert!(app.handle_inbound(&cmd(b"FAN_ON"), &mut hw, &mut sink));
    assert_eq!(app.mode(), ActuationMode::Manual);
    assert_eq!(hw.relays(), Some(RelayState { fan1: true, fan2: false }));

    // Cool, clean air would turn the fan off in Automatic.
    hw.temperature_c = 20.0;
    app.sense(&mut hw, &mut sink, 2_000).unwrap();
    assert_eq!(hw.relays(), Some(RelayState { fan1: true, fan2: false }));

    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::ModeChanged { mode: ActuationMode::Manual, .. })),
        1
    );
}

#[test]
fn auto_mode_resumes_threshold_control() {
    let (mut app, mut hw, mut sink) = started();
    app.handle_inbound(&cmd(b"FAN_ON"), &mut hw, &mut sink);

    hw.temperature_c = 25.0;
    hw.gas_raw = GAS_DANGER_RAW;
    app.sense(&mut hw, &mut sink, 2_000).unwrap();
    assert_eq!(hw.relays(), Some(RelayState { fan1: true, fan2: false }), "still manual");

    assert!(app.handle_inbound(&cmd(b"AUTO_MODE"), &mut hw, &mut sink));
    assert_eq!(app.mode(), ActuationMode::Automatic);
    assert_eq!(hw.relays(), Some(RelayState { fan1: false, fan2: true }));
}

#[test]
fn fan_command_during_gas_danger_leaves_purifier_on() {
    let (mut app, mut hw, mut sink) = started();
    app.handle_inbound(&cmd(b"PURIFIER_OFF"), &mut hw, &mut sink);
    app.handle_inbound(&cmd(b"AUTO_MODE"), &mut hw, &mut sink);

    hw.temperature_c = 25.0;
    hw.gas_raw = GAS_DANGER_RAW;
    app.sense(&mut hw, &mut sink, 2_000).unwrap();
    assert_eq!(hw.relays(), Some(RelayState { fan1: false, fan2: true }));

    assert!(app.handle_inbound(&cmd(b"FAN_ON"), &mut hw, &mut sink));
    assert_eq!(app.mode(), ActuationMode::Manual);
    assert_eq!(hw.relays(), Some(RelayState { fan1: true, fan2: true }));
}

#[test]
fn repeated_command_is_not_a_change() {
    let (mut app, mut hw, mut sink) = started();
    assert!(app.handle_inbound(&cmd(b"PURIFIER_ON"), &mut hw, &mut sink));
    let writes = hw.relay_writes();
    assert!(!app.handle_inbound(&cmd(b"PURIFIER_ON"), &mut hw, &mut sink));
    assert_eq!(hw.relay_writes(), writes);
}

#[test]
fn unknown_command_changes_nothing() {
    let (mut app, mut hw, mut sink) = started();
    let writes = hw.relay_writes();

    assert!(!app.handle_inbound(&cmd(b"purifier_off"), &mut hw, &mut sink));
    assert!(!app.handle_inbound(&cmd(b"FAN_ON "), &mut hw, &mut sink));
    assert!(!app.handle_inbound(&cmd(&[0xFF, 0x00]), &mut hw, &mut sink));

    assert_eq!(app.mode(), ActuationMode::Automatic);
    assert_eq!(hw.relay_writes(), writes);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::CommandRejected { .. })), 3);
}

#[test]
fn foreign_topic_is_ignored() {
    let (mut app, mut hw, mut sink) = started();
    let msg = InboundMessage::new("ecs/control/00:00:00:00:00:00", b"FAN_ON");
    assert!(!app.handle_inbound(&msg, &mut hw, &mut sink));
    assert_eq!(app.mode(), ActuationMode::Automatic);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::CommandRejected { .. })), 0);
}

#[test]
fn nan_temperature_keeps_previous_state() {
    let (mut app, mut hw, mut sink) = started();
    hw.temperature_c = 40.0;
    hw.gas_raw = GAS_DANGER_RAW;
    app.sense(&mut hw, &mut sink, 2_000).unwrap();

    let status = *app.alert_status();
    let relays = hw.relays();
    let sample = app.last_sample().copied();
    let calls = hw.calls.len();

    hw.temperature_c = f32::NAN;
    hw.gas_raw = GAS_CLEAN_RAW;
    assert!(app.sense(&mut hw, &mut sink, 4_000).is_err());

    assert_eq!(*app.alert_status(), status);
    assert_eq!(hw.relays(), relays);
    assert_eq!(app.last_sample().copied(), sample);
    assert_eq!(hw.calls.len(), calls, "no actuator writes on a failed read");
    assert_eq!(sink.count(|e| matches!(e, AppEvent::SensorFault)), 1);
}

#[test]
fn nan_humidity_also_fails_the_sample() {
    let (mut app, mut hw, mut sink) = started();
    hw.humidity_pct = f32::NAN;
    assert!(app.sense(&mut hw, &mut sink, 0).is_err());
    assert!(app.last_sample().is_none());
}

#[test]
fn gas_onset_reported_once_per_episode() {
    let (mut app, mut hw, mut sink) = started();
    hw.gas_raw = GAS_DANGER_RAW;
    assert!(app.sense(&mut hw, &mut sink, 0).unwrap().gas_onset);
    assert!(!app.sense(&mut hw, &mut sink, 2_000).unwrap().gas_onset);
    assert!(hw.buzzing());

    hw.gas_raw = GAS_CLEAN_RAW;
    assert!(!app.sense(&mut hw, &mut sink, 4_000).unwrap().gas_onset);
    assert!(!hw.buzzing());
    assert_eq!(hw.indicators(), Some((false, true)));

    hw.gas_raw = GAS_DANGER_RAW;
    assert!(app.sense(&mut hw, &mut sink, 6_000).unwrap().gas_onset);
}

#[test]
fn blink_runs_only_while_danger() {
    let (mut app, mut hw, mut sink) = started();
    hw.gas_raw = GAS_DANGER_RAW;
    app.sense(&mut hw, &mut sink, 0).unwrap();

    let period = u64::from(SystemConfig::default().blink_period_ms);
    let before = hw.red_toggles();
    for k in 1..=4 {
        app.tick_blink(&mut hw, k * period);
    }
    assert_eq!(hw.red_toggles() - before, 4);

    hw.gas_raw = GAS_CLEAN_RAW;
    app.sense(&mut hw, &mut sink, 5 * period).unwrap();
    let settled = hw.red_toggles();
    for k in 6..=10 {
        app.tick_blink(&mut hw, k * period);
    }
    assert_eq!(hw.red_toggles(), settled);
    assert_eq!(hw.indicators(), Some((false, true)));
}

#[test]
fn alert_changes_are_reported() {
    let (mut app, mut hw, mut sink) = started();
    hw.temperature_c = 36.0;
    app.sense(&mut hw, &mut sink, 0).unwrap();
    hw.temperature_c = 30.0;
    app.sense(&mut hw, &mut sink, 2_000).unwrap();

    let changes: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::AlertChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        changes,
        vec![(StateId::Safe, StateId::Danger), (StateId::Danger, StateId::Safe)]
    );
}
