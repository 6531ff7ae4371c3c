//! Remote control commands.
//!
//! Payloads arrive on the per-device control topic as bare ASCII tokens.
//! Matching is exact and case-sensitive; anything else is rejected without
//! touching any state.

use crate::error::UnknownCommand;

/// Commands the broker can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Manual mode, AC fan on.
    FanOn,
    /// Manual mode, AC fan off.
    FanOff,
    /// Manual mode, air purifier on.
    PurifierOn,
    /// Manual mode, air purifier off.
    PurifierOff,
    /// Return to automatic (threshold-driven) control.
    AutoMode,
}

impl Command {
    /// Every command, in wire-table order.
    pub const ALL: [Self; 5] = [
        Self::FanOn,
        Self::FanOff,
        Self::PurifierOn,
        Self::PurifierOff,
        Self::AutoMode,
    ];

    /// Parse a raw control payload.  Total: never panics, whatever the bytes.
    pub fn parse(payload: &[u8]) -> Result<Self, UnknownCommand> {
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.as_str().as_bytes() == payload)
            .ok_or(UnknownCommand)
    }

    /// The wire token for this command.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FanOn => "FAN_ON",
            Self::FanOff => "FAN_OFF",
            Self::PurifierOn => "PURIFIER_ON",
            Self::PurifierOff => "PURIFIER_OFF",
            Self::AutoMode => "AUTO_MODE",
        }
    }
}
