//! MQTT broker adapter.
//!
//! Implements [`PubSubPort`].  Publishes are fire-and-forget at QoS 0 and
//! are refused (never queued) while the session is down.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspMqttClient` with an event callback.
//!   The callback runs on the MQTT task; it only flips the connection flag
//!   and pushes received messages into a bounded queue that the main loop
//!   drains through [`PubSubPort::poll_inbound`].
//! - **all other targets**: in-memory broker for host-side tests.

use log::info;

use crate::app::ports::{InboundMessage, PubSubPort};
use crate::error::CommsError;

/// Inbound messages buffered between loop passes.  Overflow drops the
/// newest message.
pub const INBOUND_QUEUE_DEPTH: usize = 8;

/// Largest outbound payload accepted.
pub const MAX_PUBLISH_LEN: usize = 256;

// ───────────────────────────────────────────────────────────────
// ESP-IDF adapter
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod esp {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};
    use log::warn;

    use super::*;

    type InboundQueue = heapless::Deque<InboundMessage, INBOUND_QUEUE_DEPTH>;

    pub struct MqttAdapter {
        url: heapless::String<64>,
        client_id: heapless::String<32>,
        client: Option<EspMqttClient<'static>>,
        connected: Arc<AtomicBool>,
        inbound: Arc<Mutex<InboundQueue>>,
    }

    impl MqttAdapter {
        pub fn new(url: &str, client_id: &str) -> Self {
            let mut u = heapless::String::new();
            let _ = u.push_str(url);
            let mut c = heapless::String::new();
            let _ = c.push_str(client_id);
            Self {
                url: u,
                client_id: c,
                client: None,
                connected: Arc::new(AtomicBool::new(false)),
                inbound: Arc::new(Mutex::new(InboundQueue::new())),
            }
        }

        fn create_client(&mut self) -> Result<(), CommsError> {
            let conf = MqttClientConfiguration {
                client_id: Some(self.client_id.as_str()),
                ..Default::default()
            };
            let connected = Arc::clone(&self.connected);
            let inbound = Arc::clone(&self.inbound);

            let client = EspMqttClient::new_cb(self.url.as_str(), &conf, move |event| {
                match event.payload() {
                    EventPayload::Connected(_) => connected.store(true, Ordering::Release),
                    EventPayload::Disconnected => connected.store(false, Ordering::Release),
                    EventPayload::Received { topic: Some(topic), data, .. } => {
                        if let Ok(mut q) = inbound.lock() {
                            let _ = q.push_back(InboundMessage::new(topic, data));
                        }
                    }
                    _ => {}
                }
            })
            .map_err(|e| {
                warn!("MQTT: client init failed: {e}");
                CommsError::ConnectFailed
            })?;

            info!("MQTT: client started for {}", self.url);
            self.client = Some(client);
            Ok(())
        }
    }

    impl PubSubPort for MqttAdapter {
        /// The ESP-IDF client reconnects on its own once created; this only
        /// creates it and reports whether the session is up yet.
        fn connect(&mut self) -> Result<(), CommsError> {
            if self.client.is_none() {
                self.create_client()?;
            }
            if self.is_connected() {
                Ok(())
            } else {
                Err(CommsError::ConnectFailed)
            }
        }

        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::Acquire)
        }

        fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
            if payload.len() > MAX_PUBLISH_LEN {
                return Err(CommsError::TooLarge);
            }
            if !self.is_connected() {
                return Err(CommsError::TransportUnavailable);
            }
            let client = self.client.as_mut().ok_or(CommsError::TransportUnavailable)?;
            client
                .enqueue(topic, QoS::AtMostOnce, false, payload)
                .map(|_| ())
                .map_err(|_| CommsError::TransportUnavailable)
        }

        fn subscribe(&mut self, topic: &str) -> Result<(), CommsError> {
            let client = self.client.as_mut().ok_or(CommsError::TransportUnavailable)?;
            client
                .subscribe(topic, QoS::AtMostOnce)
                .map(|_| ())
                .map_err(|_| CommsError::SubscribeFailed)
        }

        fn poll_inbound(&mut self) -> Option<InboundMessage> {
            self.inbound.lock().ok()?.pop_front()
        }
    }
}

#[cfg(target_os = "espidf")]
pub use esp::MqttAdapter;

// ───────────────────────────────────────────────────────────────
// Simulation adapter
// ───────────────────────────────────────────────────────────────

/// In-memory broker: records publishes and subscriptions, lets tests
/// inject inbound messages and toggle availability.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct MqttAdapter {
    available: bool,
    connected: bool,
    pub published: Vec<(String, Vec<u8>)>,
    pub subscriptions: Vec<String>,
    inbound: heapless::Deque<InboundMessage, INBOUND_QUEUE_DEPTH>,
}

#[cfg(not(target_os = "espidf"))]
impl MqttAdapter {
    pub fn new(_url: &str, _client_id: &str) -> Self {
        Self {
            available: true,
            ..Self::default()
        }
    }

    /// Broker reachability.  Going unavailable drops the session.
    pub fn sim_set_available(&mut self, available: bool) {
        self.available = available;
        if !available {
            self.connected = false;
        }
    }

    /// Queue a message as if the broker had delivered it.
    pub fn sim_inject(&mut self, topic: &str, payload: &[u8]) -> bool {
        self.inbound.push_back(InboundMessage::new(topic, payload)).is_ok()
    }
}

#[cfg(not(target_os = "espidf"))]
impl PubSubPort for MqttAdapter {
    fn connect(&mut self) -> Result<(), CommsError> {
        if !self.available {
            return Err(CommsError::ConnectFailed);
        }
        self.connected = true;
        info!("MQTT(sim): connected");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        if payload.len() > MAX_PUBLISH_LEN {
            return Err(CommsError::TooLarge);
        }
        if !self.connected {
            return Err(CommsError::TransportUnavailable);
        }
        self.published.push((topic.to_owned(), payload.to_vec()));
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), CommsError> {
        if !self.connected {
            return Err(CommsError::TransportUnavailable);
        }
        self.subscriptions.push(topic.to_owned());
        Ok(())
    }

    fn poll_inbound(&mut self) -> Option<InboundMessage> {
        self.inbound.pop_front()
    }
}
