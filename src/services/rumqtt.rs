//! Desktop MQTT session over `rumqttc`.
//!
//! [`RumqttSession`] implements [`MqttClient`] on the synchronous
//! `rumqttc::Client`/`Connection` pair, so the control loop can run
//! unchanged against a real broker on a workstation.
//!
//! The connection is driven by a receiver thread that reconnects by itself,
//! backing off between failed attempts. It reports the session on a
//! [`SessionFlag`] and forwards incoming publishes over a channel.
//!
//! - `connect` never waits: it adopts the live session or reports that
//!   there is none. The supervisor's next period tries again.
//! - `try_recv` drains the channel.
//! - `publish` and `subscribe` queue requests without blocking; a full
//!   request queue is reported as an error.

use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use rumqttc::{Client, ConnectReturnCode, Connection, Event, MqttOptions, Outgoing, Packet, QoS};

use crate::config::MqttConfig;
use crate::session::{SessionFlag, SessionWatch};
use crate::traits::{MqttClient, MqttMessage};

/// Capacity of the outgoing request queue.
const REQUEST_QUEUE: usize = 16;

/// rumqttc only accepts whole-second keep-alives of at least this much.
const MIN_KEEP_ALIVE_SECS: u16 = 5;

/// Pause after a failed connection attempt before the next one.
const RECONNECT_BACKOFF: Duration = Duration::from_secs(1);

// ============================================================================
// Errors
// ============================================================================

/// Errors from the desktop MQTT session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MqttError {
    /// No acknowledged session with the broker yet
    NotConnected,
    /// Subscription request rejected
    Subscribe(String),
    /// Publish request rejected
    Publish(String),
}

impl std::fmt::Display for MqttError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConnected => write!(f, "MQTT session not established"),
            Self::Subscribe(e) => write!(f, "MQTT subscribe error: {}", e),
            Self::Publish(e) => write!(f, "MQTT publish error: {}", e),
        }
    }
}

impl std::error::Error for MqttError {}

// ============================================================================
// Session
// ============================================================================

/// Synchronous rumqttc session.
pub struct RumqttSession {
    client: Client,
    session: SessionWatch,
    message_rx: Receiver<MqttMessage>,
}

impl RumqttSession {
    /// Create a session for the configured broker and start connecting in
    /// the background.
    ///
    /// # Errors
    ///
    /// Returns an error if the receiver thread cannot be spawned.
    pub fn new(config: &MqttConfig, client_id: &str) -> std::io::Result<Self> {
        let mut options = MqttOptions::new(client_id, config.host.as_str(), config.port);
        options.set_keep_alive(Duration::from_secs(
            config.keep_alive_secs.max(MIN_KEEP_ALIVE_SECS) as u64,
        ));
        options.set_clean_session(true);
        if config.has_auth() {
            options.set_credentials(config.username.as_str(), config.password.as_str());
        }

        let (client, mut connection) = Client::new(options, REQUEST_QUEUE);

        let mut network = connection.eventloop.network_options();
        network.set_connection_timeout(u64::from(config.connect_timeout_ms.div_ceil(1000).max(1)));
        connection.eventloop.set_network_options(network);

        let flag = Arc::new(SessionFlag::new());
        let (message_tx, message_rx) = channel();

        let events = Arc::clone(&flag);
        thread::Builder::new()
            .name("mqtt-rx".into())
            .spawn(move || handle_mqtt_events(connection, events, message_tx))?;

        Ok(Self {
            client,
            session: SessionWatch::new(flag),
            message_rx,
        })
    }
}

impl MqttClient for RumqttSession {
    type Error = MqttError;

    fn connect(&mut self) -> Result<(), MqttError> {
        if self.session.adopt() {
            debug!("mqtt session adopted");
            Ok(())
        } else {
            Err(MqttError::NotConnected)
        }
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), MqttError> {
        self.client
            .try_publish(topic, QoS::AtMostOnce, retain, payload.to_vec())
            .map_err(|e| MqttError::Publish(e.to_string()))
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), MqttError> {
        self.client
            .try_subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| MqttError::Subscribe(e.to_string()))
    }

    fn try_recv(&mut self) -> Option<MqttMessage> {
        match self.message_rx.try_recv() {
            Ok(msg) => Some(msg),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.session.flag().mark_down();
                None
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.session.is_current()
    }
}

// ============================================================================
// Receiver Thread
// ============================================================================

fn handle_mqtt_events(
    mut connection: Connection,
    session: Arc<SessionFlag>,
    message_tx: Sender<MqttMessage>,
) {
    for event in connection.iter() {
        match event {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if ack.code == ConnectReturnCode::Success {
                    debug!("mqtt connected");
                    session.mark_up();
                } else {
                    warn!("broker refused session: {:?}", ack.code);
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let msg = MqttMessage::new(publish.topic, publish.payload.to_vec());
                if message_tx.send(msg).is_err() {
                    // session object dropped
                    return;
                }
            }
            Ok(Event::Incoming(Packet::Disconnect)) | Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                session.mark_down();
            }
            Ok(_) => {}
            Err(e) => {
                if session.is_up() {
                    warn!("mqtt connection lost: {}", e);
                } else {
                    debug!("mqtt connect failed: {}", e);
                }
                session.mark_down();
                thread::sleep(RECONNECT_BACKOFF);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
