//! Fuzz target: `AppService::handle_inbound`
//!
//! Splits the input into a topic and a payload and feeds it to the
//! service.  Must never panic; relay writes may only follow an accepted
//! command on the device's own control topic.
//!
//! cargo fuzz run fuzz_inbound_control

#![no_main]

use envguard::app::commands::Command;
use envguard::app::events::AppEvent;
use envguard::app::ports::{ActuatorPort, EventSink, InboundMessage};
use envguard::app::service::AppService;
use envguard::config::SystemConfig;
use envguard::control::mode::RelayState;
use libfuzzer_sys::fuzz_target;

struct NullOutputs {
    relay_writes: u32,
}

impl ActuatorPort for NullOutputs {
    fn set_relays(&mut self, _: RelayState) {
        self.relay_writes += 1;
    }
    fn set_indicators(&mut self, _: bool, _: bool) {}
}

struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let split = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    let topic = String::from_utf8_lossy(&data[..split]);
    let payload = data.get(split + 1..).unwrap_or(&[]);

    let mut app = AppService::new(SystemConfig::default(), 10.0, "AA:BB:CC:DD:EE:FF");
    let mut out = NullOutputs { relay_writes: 0 };
    let msg = InboundMessage::new(&topic, payload);

    let changed = app.handle_inbound(&msg, &mut out, &mut NullSink);
    if changed {
        assert_eq!(msg.topic.as_str(), app.control_topic());
        assert!(Command::parse(&msg.payload).is_ok());
    } else {
        assert_eq!(out.relay_writes, 0);
    }
});
