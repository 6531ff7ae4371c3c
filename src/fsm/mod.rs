//! Function-pointer finite state machine engine for the room alert level.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  StateTable                                              │
//! │  ┌─────────┬───────────┬──────────┬───────────────────┐  │
//! │  │ StateId │ on_enter  │ on_exit  │ on_update         │  │
//! │  ├─────────┼───────────┼──────────┼───────────────────┤  │
//! │  │ Safe    │ fn(ctx)   │ —        │ fn(ctx)->Option<> │  │
//! │  │ Danger  │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │  │
//! │  └─────────┴───────────┴──────────┴───────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Each step the engine calls `on_update` for the **current** state.
//! If it returns `Some(next_id)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next.  [`AlertMachine`] wraps
//! the engine with the two entry points the scheduler uses: `evaluate`
//! after each valid sample and `tick` from the blink oscillator.

pub mod context;
pub mod states;

use context::{AlertContext, AlertStatus, AlertThresholds, IndicatorOutputs, StepKind};
use log::info;

use crate::sensors::SensorSample;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Room alert level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Safe = 0,
    Danger = 1,
}

impl StateId {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 2;

    /// Convert an index back to `StateId`.  Out-of-range falls back to
    /// `Danger` in release builds.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Safe,
            1 => Self::Danger,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Danger
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut AlertContext);

/// Signature for the per-step update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut AlertContext) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    current: usize,
    /// Time at which the current state was entered (ms).
    entered_at_ms: u64,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            entered_at_ms: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    pub fn start(&mut self, ctx: &mut AlertContext) {
        info!("Alert FSM starting in state: {}", self.table[self.current].name);
        self.entered_at_ms = ctx.now_ms;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Run `on_update` for the current state and follow any transition.
    pub fn step(&mut self, ctx: &mut AlertContext) {
        if let Some(next_id) = (self.table[self.current].on_update)(ctx) {
            self.transition(next_id, ctx);
        }
    }

    /// Jump to `next` regardless of what `on_update` would say.
    pub fn force_transition(&mut self, next: StateId, ctx: &mut AlertContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    /// Milliseconds spent in the current state as of `now_ms`.
    pub fn time_in_state_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.entered_at_ms)
    }

    fn transition(&mut self, next_id: StateId, ctx: &mut AlertContext) {
        let next_idx = next_id as usize;

        info!(
            "Alert transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.entered_at_ms = ctx.now_ms;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}

// ---------------------------------------------------------------------------
// Alert machine
// ---------------------------------------------------------------------------

/// Engine plus context: the alert state machine as the rest of the
/// firmware sees it.
pub struct AlertMachine {
    fsm: Fsm,
    ctx: AlertContext,
}

impl AlertMachine {
    /// Build the machine in `Safe` and run its entry action.
    pub fn new(thresholds: AlertThresholds) -> Self {
        let mut fsm = Fsm::new(states::build_state_table(), StateId::Safe);
        let mut ctx = AlertContext::new(thresholds);
        fsm.start(&mut ctx);
        Self { fsm, ctx }
    }

    /// Recompute the alert flags from a fresh sample and step the machine.
    pub fn evaluate(&mut self, sample: &SensorSample, now_ms: u64) {
        let t = self.ctx.thresholds;
        self.ctx.status.gas_danger = sample.co_ppm > t.co_danger_ppm;
        self.ctx.status.temp_high = sample.temperature_c > t.temp_high_c;
        self.step(StepKind::Evaluate, now_ms);
    }

    /// Blink oscillator step.  Toggles the phase at most once per call.
    pub fn tick(&mut self, now_ms: u64) {
        self.step(StepKind::Tick, now_ms);
    }

    pub fn level(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn is_danger(&self) -> bool {
        self.level() == StateId::Danger
    }

    pub fn status(&self) -> &AlertStatus {
        &self.ctx.status
    }

    pub fn outputs(&self) -> IndicatorOutputs {
        self.ctx.outputs
    }

    pub fn thresholds(&self) -> AlertThresholds {
        self.ctx.thresholds
    }

    /// Milliseconds at the current level.
    pub fn time_in_level_ms(&self, now_ms: u64) -> u64 {
        self.fsm.time_in_state_ms(now_ms)
    }

    fn step(&mut self, kind: StepKind, now_ms: u64) {
        self.ctx.now_ms = now_ms;
        self.ctx.step = kind;
        self.fsm.step(&mut self.ctx);
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::config::SystemConfig;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn level_always_matches_flags(readings in proptest::collection::vec((0.0f32..60.0, 0.0f32..200.0), 1..60)) {
            let mut m = AlertMachine::new(AlertThresholds::from(&SystemConfig::default()));
            for (i, (t, co)) in readings.into_iter().enumerate() {
                let now = i as u64 * 2000;
                m.evaluate(&SensorSample { temperature_c: t, humidity_pct: 50.0, co_ppm: co, valid_at_ms: now }, now);
                prop_assert_eq!(m.is_danger(), m.status().is_danger());
                prop_assert_eq!(m.outputs().buzzer, m.status().gas_danger);
                prop_assert_eq!(m.outputs().led_green, !m.is_danger());
                if !m.is_danger() {
                    prop_assert!(!m.status().blink_phase);
                }
            }
        }
    }
}
