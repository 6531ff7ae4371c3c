//! Actuation mode and relay resolution.
//!
//! In [`ActuationMode::Automatic`] the relays follow the alert flags on
//! every evaluation.  Any manual command flips to
//! [`ActuationMode::Manual`], after which the stored relay state is
//! authoritative until an explicit `AUTO_MODE` arrives.  Nothing reverts
//! on a timer.
//!
//! Leaving Automatic seeds the manual state from what automatic control
//! is producing at that moment, so a command only moves the relay it
//! names.

use crate::app::commands::Command;
use crate::fsm::context::AlertStatus;

/// Who decides the relay outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActuationMode {
    #[default]
    Automatic,
    Manual,
}

impl ActuationMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Automatic => "AUTO",
            Self::Manual => "MANUAL",
        }
    }
}

/// Desired level of both fan relays (`true` = energised).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelayState {
    /// AC fan.
    pub fan1: bool,
    /// Air purifier.
    pub fan2: bool,
}

/// Mode + manual relay memory.
#[derive(Debug, Clone, Default)]
pub struct ModeController {
    mode: ActuationMode,
    manual: RelayState,
}

impl ModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ActuationMode {
        self.mode
    }

    /// The stored manual relay state (meaningful only in Manual mode).
    pub fn manual_relays(&self) -> RelayState {
        self.manual
    }

    /// Apply a remote command.  Returns `true` if the mode or the stored
    /// manual relay state changed.
    ///
    /// `alert` is the current alert status; it decides the relay a fan
    /// command does not name when the command arrives in Automatic mode.
    pub fn apply_command(&mut self, cmd: Command, alert: &AlertStatus) -> bool {
        let before = (self.mode, self.manual);
        match cmd {
            Command::FanOn => self.set_manual(alert, |r| r.fan1 = true),
            Command::FanOff => self.set_manual(alert, |r| r.fan1 = false),
            Command::PurifierOn => self.set_manual(alert, |r| r.fan2 = true),
            Command::PurifierOff => self.set_manual(alert, |r| r.fan2 = false),
            Command::AutoMode => self.mode = ActuationMode::Automatic,
        }
        before != (self.mode, self.manual)
    }

    /// Relay outputs for the current mode.  Pure.
    pub fn resolve_relays(&self, alert: &AlertStatus) -> RelayState {
        match self.mode {
            ActuationMode::Automatic => RelayState {
                fan1: alert.temp_high,
                fan2: alert.gas_danger,
            },
            ActuationMode::Manual => self.manual,
        }
    }

    fn set_manual(&mut self, alert: &AlertStatus, f: impl FnOnce(&mut RelayState)) {
        if self.mode == ActuationMode::Automatic {
            self.manual = self.resolve_relays(alert);
        }
        self.mode = ActuationMode::Manual;
        f(&mut self.manual);
    }
}
