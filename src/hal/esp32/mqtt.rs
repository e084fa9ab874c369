//! MQTT session for ESP32.
//!
//! Wraps `EspMqttClient` from esp-idf-svc behind the [`MqttClient`]
//! trait. A receiver thread drains the connection's event stream: it
//! reports `Connected`/`Disconnected` events on a [`SessionFlag`] and
//! forwards complete messages over a channel that
//! [`try_recv`](MqttClient::try_recv) polls.
//!
//! The ESP-IDF client reconnects by itself, so
//! [`connect`](MqttClient::connect) never waits: it adopts the live session
//! or reports that there is none, and the supervisor asks again next
//! period. Subscriptions are made by the supervisor once a session is
//! adopted.
//!
//! # Example
//!
//! ```ignore
//! use relay_switch::hal::esp32::Esp32Mqtt;
//! use relay_switch::config::Config;
//! use relay_switch::traits::MqttClient;
//!
//! let config = Config::default();
//! let mut mqtt = Esp32Mqtt::new(&config.mqtt, config.device.name.as_str())?;
//! if mqtt.connect().is_ok() {
//!     mqtt.subscribe("cmnd/lswitch0/light")?;
//! }
//! ```

use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use esp_idf_svc::mqtt::client::{
    Details, EspMqttClient, EspMqttConnection, EventPayload, MqttClientConfiguration, QoS,
};
use log::{debug, warn};

use crate::config::MqttConfig;
use crate::session::{SessionFlag, SessionWatch};
use crate::traits::{MqttClient, MqttMessage};

const RECEIVER_STACK_BYTES: usize = 8 * 1024;

/// MQTT session on the ESP-IDF client.
pub struct Esp32Mqtt {
    client: EspMqttClient<'static>,
    message_rx: Receiver<MqttMessage>,
    session: SessionWatch,
    url: String,
}

impl Esp32Mqtt {
    /// Create the client and start its receiver thread.
    ///
    /// The broker connection is made in the background;
    /// [`connect`](MqttClient::connect) picks it up once it is there.
    ///
    /// # Errors
    ///
    /// Returns an error if the client or the receiver thread cannot be
    /// created.
    pub fn new(config: &MqttConfig, client_id: &str) -> anyhow::Result<Self> {
        let url = format!("mqtt://{}:{}", config.host.as_str(), config.port);

        let mqtt_config = MqttClientConfiguration {
            client_id: Some(client_id),
            keep_alive_interval: Some(Duration::from_secs(config.keep_alive_secs as u64)),
            username: config.has_auth().then(|| config.username.as_str()),
            password: config.has_auth().then(|| config.password.as_str()),
            network_timeout: Duration::from_millis(config.connect_timeout_ms as u64),
            ..Default::default()
        };

        let (client, connection) = EspMqttClient::new(&url, &mqtt_config)?;

        let flag = Arc::new(SessionFlag::new());
        let (message_tx, message_rx) = channel::<MqttMessage>();

        let events = Arc::clone(&flag);
        thread::Builder::new()
            .name("mqtt-rx".into())
            .stack_size(RECEIVER_STACK_BYTES)
            .spawn(move || handle_mqtt_events(connection, events, message_tx))?;

        Ok(Self {
            client,
            message_rx,
            session: SessionWatch::new(flag),
            url,
        })
    }

    /// Broker URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

// ============================================================================
// MqttClient Trait Implementation
// ============================================================================

/// Error type for ESP32 MQTT operations.
#[derive(Debug)]
pub struct Esp32MqttError(pub String);

impl core::fmt::Display for Esp32MqttError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "MQTT error: {}", self.0)
    }
}

impl std::error::Error for Esp32MqttError {}

impl MqttClient for Esp32Mqtt {
    type Error = Esp32MqttError;

    fn connect(&mut self) -> Result<(), Self::Error> {
        if self.session.adopt() {
            Ok(())
        } else {
            Err(Esp32MqttError(format!("no session with {} yet", self.url)))
        }
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error> {
        self.client
            .publish(topic, QoS::AtMostOnce, retain, payload)
            .map_err(|e| Esp32MqttError(format!("{:?}", e)))?;
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error> {
        self.client
            .subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| Esp32MqttError(format!("{:?}", e)))?;
        Ok(())
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
    mut connection: EspMqttConnection,
    session: Arc<SessionFlag>,
    message_tx: Sender<MqttMessage>,
) {
    loop {
        match connection.next() {
            Err(e) => {
                session.mark_down();
                warn!("mqtt event loop error: {:?}", e);
                thread::sleep(Duration::from_secs(1));
            }
            Ok(event) => match event.payload() {
                EventPayload::Connected(_) => {
                    debug!("mqtt connected");
                    session.mark_up();
                }
                EventPayload::Disconnected => {
                    debug!("mqtt disconnected");
                    session.mark_down();
                }
                EventPayload::Received {
                    topic: Some(topic),
                    data,
                    details: Details::Complete,
                    ..
                } => {
                    let msg = MqttMessage::new(topic, data);
                    if message_tx.send(msg).is_err() {
                        // session object dropped
                        return;
                    }
                }
                _ => {}
            },
        }
    }
}
