//! Shared mutable context threaded through every alert-state handler.
//!
//! `AlertContext` is the blackboard the handlers read from and write to:
//! the latest alert flags, the indicator levels they derive, the current
//! time and the thresholds they compare against.

use crate::config::SystemConfig;

// ---------------------------------------------------------------------------
// Alert flags (written by evaluate; read by handlers, mode controller, pages)
// ---------------------------------------------------------------------------

/// Alert flags derived from the latest valid sample.
///
/// `gas_danger` and `temp_high` are recomputed wholesale on every
/// evaluation.  `blink_phase` only moves while in Danger and drops back to
/// `false` whenever danger clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlertStatus {
    pub gas_danger: bool,
    pub temp_high: bool,
    pub blink_phase: bool,
    pub last_blink_at_ms: u64,
}

impl AlertStatus {
    /// Either condition puts the room in danger.
    pub fn is_danger(&self) -> bool {
        self.gas_danger || self.temp_high
    }
}

// ---------------------------------------------------------------------------
// Indicator outputs (written by handlers; applied by the scheduler)
// ---------------------------------------------------------------------------

/// Desired LED and buzzer levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndicatorOutputs {
    pub led_red: bool,
    pub led_green: bool,
    pub buzzer: bool,
}

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// The slice of [`SystemConfig`] the alert handlers need.
#[derive(Debug, Clone, Copy)]
pub struct AlertThresholds {
    pub temp_high_c: f32,
    pub co_danger_ppm: f32,
    pub blink_period_ms: u64,
}

impl From<&SystemConfig> for AlertThresholds {
    fn from(c: &SystemConfig) -> Self {
        Self {
            temp_high_c: c.temp_high_threshold_c,
            co_danger_ppm: c.co_danger_threshold_ppm,
            blink_period_ms: u64::from(c.blink_period_ms),
        }
    }
}

// ---------------------------------------------------------------------------
// Step kind
// ---------------------------------------------------------------------------

/// Why the engine is being stepped.  Only oscillator ticks may advance the
/// blink phase; evaluations only move the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Evaluate,
    Tick,
}

// ---------------------------------------------------------------------------
// AlertContext
// ---------------------------------------------------------------------------

pub struct AlertContext {
    /// Time of the current step (ms since boot).
    pub now_ms: u64,
    /// What triggered the current step.
    pub step: StepKind,
    pub status: AlertStatus,
    pub outputs: IndicatorOutputs,
    pub thresholds: AlertThresholds,
}

impl AlertContext {
    pub fn new(thresholds: AlertThresholds) -> Self {
        Self {
            now_ms: 0,
            step: StepKind::Evaluate,
            status: AlertStatus::default(),
            outputs: IndicatorOutputs::default(),
            thresholds,
        }
    }

    /// Whether a full blink period has passed since the last toggle.
    pub fn blink_due(&self) -> bool {
        self.now_ms.saturating_sub(self.status.last_blink_at_ms) >= self.thresholds.blink_period_ms
    }
}
