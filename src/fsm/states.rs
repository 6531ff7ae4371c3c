//! Concrete alert-state handlers and table builder.
//!
//! Each state is defined by plain `fn` pointers: no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!            [gas_danger || temp_high]
//!   SAFE ─────────────────────────────▶ DANGER ──┐
//!     ▲                                    │     │ [tick, period elapsed]
//!     └────────────[both clear]────────────┘ ◀───┘  toggle blink_phase
//! ```
//!
//! SAFE:   green on, red off, buzzer off.
//! DANGER: green off, red follows blink_phase, buzzer follows gas_danger
//!         (temperature alone lights but never sounds).

use super::context::{AlertContext, StepKind};
use super::{StateDescriptor, StateId};
use log::{info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Safe
        StateDescriptor {
            id: StateId::Safe,
            name: "Safe",
            on_enter: Some(safe_enter),
            on_exit: None,
            on_update: safe_update,
        },
        // Index 1: Danger
        StateDescriptor {
            id: StateId::Danger,
            name: "Danger",
            on_enter: Some(danger_enter),
            on_exit: Some(danger_exit),
            on_update: danger_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  SAFE state
// ═══════════════════════════════════════════════════════════════════════════

fn safe_enter(ctx: &mut AlertContext) {
    ctx.status.blink_phase = false;
    ctx.outputs.led_red = false;
    ctx.outputs.led_green = true;
    ctx.outputs.buzzer = false;
    info!("SAFE: indicators normal");
}

fn safe_update(ctx: &mut AlertContext) -> Option<StateId> {
    if ctx.status.is_danger() {
        return Some(StateId::Danger);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  DANGER state
// ═══════════════════════════════════════════════════════════════════════════

fn danger_enter(ctx: &mut AlertContext) {
    ctx.outputs.led_green = false;
    ctx.status.blink_phase = false;
    ctx.status.last_blink_at_ms = ctx.now_ms;
    ctx.outputs.led_red = ctx.status.blink_phase;
    ctx.outputs.buzzer = ctx.status.gas_danger;
    warn!(
        "DANGER: gas={} temp_high={}",
        ctx.status.gas_danger, ctx.status.temp_high
    );
}

fn danger_exit(ctx: &mut AlertContext) {
    ctx.outputs.buzzer = false;
    info!("DANGER: cleared");
}

fn danger_update(ctx: &mut AlertContext) -> Option<StateId> {
    if !ctx.status.is_danger() {
        return Some(StateId::Safe);
    }

    // Gas may come and go while temperature keeps us here.
    ctx.outputs.buzzer = ctx.status.gas_danger;

    if ctx.step == StepKind::Tick && ctx.blink_due() {
        ctx.status.blink_phase = !ctx.status.blink_phase;
        // Advance on the period grid; resync only after a missed period.
        let period = ctx.thresholds.blink_period_ms;
        let next = ctx.status.last_blink_at_ms.saturating_add(period);
        ctx.status.last_blink_at_ms = if ctx.now_ms.saturating_sub(next) >= period {
            ctx.now_ms
        } else {
            next
        };
    }
    ctx.outputs.led_red = ctx.status.blink_phase;

    None
}
