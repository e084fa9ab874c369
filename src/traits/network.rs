//! Network abstraction traits for the message-bus session, the underlying
//! link, and the update-transport collaborator.
//!
//! # Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`MqttClient`] | Session capability: connect, subscribe, publish, poll |
//! | [`NetworkLink`] | Underlying connectivity (Wi-Fi association, host network) |
//! | [`UpdateService`] | Periodic non-blocking hook of the firmware-update transport |
//!
//! # Topics
//!
//! ```text
//! cmnd/{NAME}/light    - device command ("1"/"0"/"on"/"off"/"toggle")
//! cmnd/group/lights    - group broadcast command (same payloads)
//! status/{NAME}/light  - realized relay state ("1"/"0"), one per transition
//! ```

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;

// ============================================================================
// MQTT Session Trait (Sync-First Design)
// ============================================================================

/// MQTT session trait for pub/sub messaging.
///
/// This trait uses a **sync-first design** that works on both ESP32 (blocking I/O)
/// and desktop. The control loop depends only on this abstraction, so any
/// transport (or a test double) can sit behind it.
///
/// # Implementation Notes
///
/// - `connect` must return within a bounded time
/// - `try_recv` is non-blocking for polling patterns
/// - `publish` is fire-and-forget from the caller's point of view; the
///   result only reports whether the request was accepted
///
/// # Example
///
/// ```rust,ignore
/// use relay_switch::traits::MqttClient;
///
/// fn announce<M: MqttClient>(client: &mut M) {
///     let _ = client.publish("status/lswitch0/light", b"1", false);
/// }
/// ```
pub trait MqttClient {
    /// Error type for MQTT operations.
    type Error;

    /// (Re)establish the session with the broker.
    ///
    /// Returns `Ok(())` once the session is up. On failure the error
    /// carries the transport's status.
    fn connect(&mut self) -> Result<(), Self::Error>;

    /// Publish a message to a topic.
    ///
    /// # Arguments
    /// - `topic`: MQTT topic path
    /// - `payload`: Message bytes
    /// - `retain`: If true, broker keeps message for new subscribers
    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error>;

    /// Subscribe to a topic.
    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error>;

    /// Try to receive the next message (non-blocking).
    ///
    /// Returns `None` if no message is available. This should never block.
    fn try_recv(&mut self) -> Option<MqttMessage>;

    /// Check if the session is established.
    fn is_connected(&self) -> bool;
}

/// An MQTT message received from a subscription.
///
/// Contains the topic and payload of a published message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MqttMessage {
    /// Topic the message was published to.
    pub topic: String,
    /// Message payload as raw bytes.
    pub payload: Vec<u8>,
}

impl MqttMessage {
    /// Create a new MQTT message.
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    /// Returns the payload as a UTF-8 string, if valid.
    pub fn payload_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.payload).ok()
    }
}

// ============================================================================
// Link and Update Collaborators
// ============================================================================

/// Underlying network connectivity, distinct from the MQTT session.
pub trait NetworkLink {
    /// Returns true if the link is usable.
    ///
    /// Takes `&mut self` so implementations may kick off a non-blocking
    /// reassociation when they find the link down.
    fn is_link_up(&mut self) -> bool;
}

/// An absent link (for example, no Wi-Fi credentials) is never up.
impl<L: NetworkLink> NetworkLink for Option<L> {
    fn is_link_up(&mut self) -> bool {
        self.as_mut().is_some_and(|link| link.is_link_up())
    }
}

/// Periodic service hook of the firmware-update transport.
///
/// Called once per control-loop tick. Implementations must not block.
pub trait UpdateService {
    /// Give the update transport a chance to make progress.
    fn service(&mut self);
}

/// No update transport.
impl UpdateService for () {
    fn service(&mut self) {}
}

/// Two hooks serviced in order.
impl<A: UpdateService, B: UpdateService> UpdateService for (A, B) {
    fn service(&mut self) {
        self.0.service();
        self.1.service();
    }
}

impl<U: UpdateService + ?Sized> UpdateService for &mut U {
    fn service(&mut self) {
        (**self).service();
    }
}
