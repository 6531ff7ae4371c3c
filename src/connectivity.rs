//! Link / broker supervision.
//!
//! Polled once per loop pass.  Detects edges in the (link, broker) pair
//! and kicks non-blocking reconnect attempts on an exponential backoff
//! (2 s → 4 s → 8 s … capped at 60 s, reset on success).

use log::{info, warn};

use crate::app::ports::{LinkPort, PubSubPort};

/// Snapshot of network reachability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectivityState {
    pub link_up: bool,
    pub broker_up: bool,
}

// ───────────────────────────────────────────────────────────────
// Backoff
// ───────────────────────────────────────────────────────────────

pub const BACKOFF_INITIAL_MS: u64 = 2_000;
pub const BACKOFF_MAX_MS: u64 = 60_000;

/// Retry gate.  The first attempt is allowed immediately; each failure
/// doubles the wait up to the cap.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    delay_ms: u64,
    next_attempt_ms: u64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

impl Backoff {
    pub const fn new() -> Self {
        Self {
            delay_ms: BACKOFF_INITIAL_MS,
            next_attempt_ms: 0,
        }
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms >= self.next_attempt_ms
    }

    /// Record a failed attempt at `now_ms`.
    pub fn failed(&mut self, now_ms: u64) {
        self.next_attempt_ms = now_ms.saturating_add(self.delay_ms);
        self.delay_ms = (self.delay_ms * 2).min(BACKOFF_MAX_MS);
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn next_attempt_ms(&self) -> u64 {
        self.next_attempt_ms
    }
}

// ───────────────────────────────────────────────────────────────
// Supervisor
// ───────────────────────────────────────────────────────────────

/// Result of one supervision pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityReport {
    pub state: ConnectivityState,
    /// Any field differs from the previous pass (always true on the first).
    pub changed: bool,
    /// The broker session came up this pass, including a drop and
    /// reconnect that both happened since the previous pass.
    pub broker_came_up: bool,
}

#[derive(Debug, Default)]
pub struct ConnectivitySupervisor {
    last: Option<ConnectivityState>,
    link_backoff: Backoff,
    broker_backoff: Backoff,
}

impl ConnectivitySupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_state(&self) -> ConnectivityState {
        self.last.unwrap_or_default()
    }

    /// Poll both layers, retry whatever is down (if its backoff allows) and
    /// report edges.  Never blocks.
    pub fn poll(
        &mut self,
        link: &mut (impl LinkPort + ?Sized),
        broker: &mut (impl PubSubPort + ?Sized),
        now_ms: u64,
    ) -> ConnectivityReport {
        let link_up = link.is_link_up();
        let mut reconnected = false;

        if link_up {
            self.link_backoff.reset();
            if !broker.is_connected() && self.broker_backoff.is_due(now_ms) {
                match broker.connect() {
                    Ok(()) => {
                        self.broker_backoff.reset();
                        reconnected = true;
                    }
                    Err(e) => {
                        self.broker_backoff.failed(now_ms);
                        warn!(
                            "Broker connect failed ({e}), next try in {} ms",
                            self.broker_backoff.next_attempt_ms().saturating_sub(now_ms)
                        );
                    }
                }
            }
        } else if self.link_backoff.is_due(now_ms) {
            info!("WiFi: link down, reconnect attempt");
            link.reconnect();
            self.link_backoff.failed(now_ms);
        }

        let state = ConnectivityState {
            link_up,
            broker_up: link_up && broker.is_connected(),
        };
        let previous = self.last.replace(state);

        ConnectivityReport {
            state,
            changed: previous != Some(state),
            broker_came_up: state.broker_up && (reconnected || !previous.is_some_and(|p| p.broker_up)),
        }
    }
}
