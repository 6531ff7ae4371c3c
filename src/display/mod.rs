//! Status-display paging.
//!
//! The second panel alternates between a status page and a clock page.
//! [`DisplayPageController::poll`] runs every loop pass and decides which
//! page to redraw, or whether to skip the I²C write entirely.
//!
//! Rules, first match wins:
//!
//! 1. **Edge** (link or broker state changed, alert level changed, or
//!    the very first poll): show Status, restart the hold timer, redraw.
//! 2. **Link down**: stay on Status and redraw at the offline throttle.
//!    The hold timer is ignored.
//! 3. **Hold elapsed** on Status: promote to Clock, redraw.
//! 4. **Refresh**: redraw the current page once its interval has passed
//!    (Status faster than Clock).

pub mod pages;

use crate::config::SystemConfig;
use crate::connectivity::ConnectivityState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayPage {
    Status,
    Clock,
}

/// Paging intervals (ms).
#[derive(Debug, Clone, Copy)]
pub struct PageTimings {
    pub status_hold_ms: u64,
    pub status_refresh_ms: u64,
    pub clock_refresh_ms: u64,
    pub offline_refresh_ms: u64,
}

impl From<&SystemConfig> for PageTimings {
    fn from(c: &SystemConfig) -> Self {
        Self {
            status_hold_ms: u64::from(c.status_hold_ms),
            status_refresh_ms: u64::from(c.status_refresh_ms),
            clock_refresh_ms: u64::from(c.clock_refresh_ms),
            offline_refresh_ms: u64::from(c.offline_refresh_ms),
        }
    }
}

pub struct DisplayPageController {
    timings: PageTimings,
    page: DisplayPage,
    hold_started_ms: u64,
    last_draw_ms: Option<u64>,
    last_conn: Option<ConnectivityState>,
    last_danger: Option<bool>,
}

impl DisplayPageController {
    pub fn new(timings: PageTimings) -> Self {
        Self {
            timings,
            page: DisplayPage::Status,
            hold_started_ms: 0,
            last_draw_ms: None,
            last_conn: None,
            last_danger: None,
        }
    }

    pub fn page(&self) -> DisplayPage {
        self.page
    }

    /// Decide what to draw this pass.  `None` means leave the panel alone.
    pub fn poll(&mut self, conn: ConnectivityState, danger: bool, now_ms: u64) -> Option<DisplayPage> {
        let edge = self.last_conn != Some(conn) || self.last_danger != Some(danger);
        self.last_conn = Some(conn);
        self.last_danger = Some(danger);

        if edge {
            self.page = DisplayPage::Status;
            self.hold_started_ms = now_ms;
            return self.draw(now_ms);
        }

        if !conn.link_up {
            self.page = DisplayPage::Status;
            return self.draw_if_due(self.timings.offline_refresh_ms, now_ms);
        }

        if self.page == DisplayPage::Status
            && now_ms.saturating_sub(self.hold_started_ms) >= self.timings.status_hold_ms
        {
            self.page = DisplayPage::Clock;
            return self.draw(now_ms);
        }

        let interval = match self.page {
            DisplayPage::Status => self.timings.status_refresh_ms,
            DisplayPage::Clock => self.timings.clock_refresh_ms,
        };
        self.draw_if_due(interval, now_ms)
    }

    fn draw(&mut self, now_ms: u64) -> Option<DisplayPage> {
        self.last_draw_ms = Some(now_ms);
        Some(self.page)
    }

    fn draw_if_due(&mut self, interval_ms: u64, now_ms: u64) -> Option<DisplayPage> {
        match self.last_draw_ms {
            Some(last) if now_ms.saturating_sub(last) < interval_ms => None,
            _ => self.draw(now_ms),
        }
    }
}
