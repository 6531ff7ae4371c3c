//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) and the scheduler emit
//! these through the [`EventSink`](super::ports::EventSink) port.  Adapters
//! on the other side decide what to do with them (serial log, a test
//! recorder).

use crate::connectivity::ConnectivityState;
use crate::control::mode::{ActuationMode, RelayState};
use crate::fsm::StateId;
use crate::sensors::SensorSample;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The control loop is about to start.
    Started { r0_kohm: f32 },

    /// A valid sensing cycle completed.
    SampleTaken(SensorSample),

    /// The climate sensor returned NaN; the previous sample stands.
    SensorFault,

    /// Alert level changed.
    AlertChanged { from: StateId, to: StateId },

    /// A remote command changed the actuation mode or the manual relays.
    ModeChanged { mode: ActuationMode, relays: RelayState },

    /// New relay levels were written to the hardware.
    RelaysChanged(RelayState),

    /// An inbound control payload was not a known command.
    CommandRejected { payload: heapless::Vec<u8, 64> },

    /// Link or broker state changed.
    ConnectivityChanged(ConnectivityState),

    /// A publish was dropped because the broker was unavailable.
    PublishDropped(Outbound),
}

/// The kinds of message the firmware publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outbound {
    Telemetry,
    Alert,
    Status,
}

impl Outbound {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Telemetry => "telemetry",
            Self::Alert => "alert",
            Self::Status => "status",
        }
    }
}
