//! Mock adapters for integration tests.
//!
//! Record every port call so tests can assert on the full output history
//! without touching real GPIO, I²C or the network.

use envguard::app::events::AppEvent;
use envguard::app::ports::{
    ActuatorPort, ClockPort, EventSink, InboundMessage, LinkPort, PubSubPort, SensorPort,
    TextDisplay, ToneOutput, WallTime,
};
use envguard::control::mode::RelayState;
use envguard::error::CommsError;
use std::collections::VecDeque;

/// Raw ADC counts well inside the safe / danger regions with R0 = 10 kOhm.
pub const GAS_CLEAN_RAW: u16 = 500;
pub const GAS_DANGER_RAW: u16 = 3000;
pub const R0_KOHM: f32 = 10.0;
pub const MAC: &str = "AA:BB:CC:DD:EE:FF";
pub const CONTROL_TOPIC: &str = "ecs/control/AA:BB:CC:DD:EE:FF";

// ── Board ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum BoardCall {
    Relays(RelayState),
    Indicators { red: bool, green: bool },
    Tone(u32),
    Silence,
}

pub struct MockBoard {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub gas_raw: u16,
    pub calls: Vec<BoardCall>,
    pub reads: u32,
}

#[allow(dead_code)]
impl MockBoard {
    pub fn new() -> Self {
        Self {
            temperature_c: 25.0,
            humidity_pct: 40.0,
            gas_raw: GAS_CLEAN_RAW,
            calls: Vec::new(),
            reads: 0,
        }
    }

    pub fn relays(&self) -> Option<RelayState> {
        self.calls.iter().rev().find_map(|c| match c {
            BoardCall::Relays(r) => Some(*r),
            _ => None,
        })
    }

    pub fn indicators(&self) -> Option<(bool, bool)> {
        self.calls.iter().rev().find_map(|c| match c {
            BoardCall::Indicators { red, green } => Some((*red, *green)),
            _ => None,
        })
    }

    pub fn buzzing(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                BoardCall::Tone(_) => Some(true),
                BoardCall::Silence => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn relay_writes(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, BoardCall::Relays(_))).count()
    }

    pub fn red_toggles(&self) -> usize {
        let reds: Vec<bool> = self
            .calls
            .iter()
            .filter_map(|c| match c {
                BoardCall::Indicators { red, .. } => Some(*red),
                _ => None,
            })
            .collect();
        reds.windows(2).filter(|w| w[0] != w[1]).count()
    }
}

impl SensorPort for MockBoard {
    fn read_temperature_celsius(&mut self) -> f32 {
        self.reads += 1;
        self.temperature_c
    }

    fn read_humidity_percent(&mut self) -> f32 {
        self.humidity_pct
    }

    fn read_raw_gas_adc(&mut self) -> u16 {
        self.gas_raw
    }
}

impl ActuatorPort for MockBoard {
    fn set_relays(&mut self, relays: RelayState) {
        self.calls.push(BoardCall::Relays(relays));
    }

    fn set_indicators(&mut self, red: bool, green: bool) {
        self.calls.push(BoardCall::Indicators { red, green });
    }
}

impl ToneOutput for MockBoard {
    fn tone(&mut self, freq_hz: u32) {
        self.calls.push(BoardCall::Tone(freq_hz));
    }

    fn silence(&mut self) {
        self.calls.push(BoardCall::Silence);
    }
}

// ── Character display ─────────────────────────────────────────

/// 20×4 framebuffer that honours cursor moves.
pub struct MockDisplay {
    pub rows: [String; 4],
    cursor: (usize, usize),
    pub prints: usize,
    pub clears: usize,
}

#[allow(dead_code)]
impl MockDisplay {
    pub fn new() -> Self {
        Self {
            rows: Default::default(),
            cursor: (0, 0),
            prints: 0,
            clears: 0,
        }
    }

    pub fn row(&self, r: usize) -> &str {
        self.rows[r].trim_end()
    }
}

impl TextDisplay for MockDisplay {
    fn init(&mut self) {}

    fn set_cursor(&mut self, col: u8, row: u8) {
        self.cursor = (usize::from(col), usize::from(row).min(3));
    }

    fn print(&mut self, text: &str) {
        self.prints += 1;
        let (col, row) = self.cursor;
        let mut chars: Vec<char> = self.rows[row].chars().collect();
        chars.resize(chars.len().max(col), ' ');
        for (i, ch) in text.chars().enumerate() {
            if col + i < chars.len() {
                chars[col + i] = ch;
            } else {
                chars.push(ch);
            }
        }
        self.rows[row] = chars.into_iter().collect();
        self.cursor.0 += text.chars().count();
    }

    fn clear(&mut self) {
        self.clears += 1;
        self.rows = Default::default();
        self.cursor = (0, 0);
    }
}

// ── Network ───────────────────────────────────────────────────

pub struct MockBroker {
    pub reachable: bool,
    pub connected: bool,
    pub connects: u32,
    pub published: Vec<(String, Vec<u8>)>,
    pub subscriptions: Vec<String>,
    pub inbound: VecDeque<InboundMessage>,
}

#[allow(dead_code)]
impl MockBroker {
    pub fn new() -> Self {
        Self {
            reachable: true,
            connected: false,
            connects: 0,
            published: Vec::new(),
            subscriptions: Vec::new(),
            inbound: VecDeque::new(),
        }
    }

    pub fn inject(&mut self, topic: &str, payload: &[u8]) {
        self.inbound.push_back(InboundMessage::new(topic, payload));
    }

    pub fn published_on(&self, topic: &str) -> Vec<String> {
        self.published
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| String::from_utf8_lossy(p).into_owned())
            .collect()
    }

    pub fn drop_session(&mut self) {
        self.connected = false;
    }
}

impl PubSubPort for MockBroker {
    fn connect(&mut self) -> Result<(), CommsError> {
        self.connects += 1;
        if self.reachable {
            self.connected = true;
            Ok(())
        } else {
            Err(CommsError::ConnectFailed)
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        if !self.connected {
            return Err(CommsError::TransportUnavailable);
        }
        self.published.push((topic.to_owned(), payload.to_vec()));
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), CommsError> {
        self.subscriptions.push(topic.to_owned());
        Ok(())
    }

    fn poll_inbound(&mut self) -> Option<InboundMessage> {
        self.inbound.pop_front()
    }
}

pub struct MockLink {
    pub up: bool,
    pub kicks: u32,
}

impl MockLink {
    pub fn new(up: bool) -> Self {
        Self { up, kicks: 0 }
    }
}

impl LinkPort for MockLink {
    fn is_link_up(&self) -> bool {
        self.up
    }

    fn reconnect(&mut self) {
        self.kicks += 1;
    }
}

// ── Clock ─────────────────────────────────────────────────────

pub struct FixedClock(pub Option<WallTime>);

impl ClockPort for FixedClock {
    fn uptime_ms(&self) -> u64 {
        0
    }

    fn local_time(&self) -> Option<WallTime> {
        self.0
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
