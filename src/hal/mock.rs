//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware and network traits,
//! enabling development and testing on desktop without a device.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockRelay`] | [`RelayOutput`] | Tracks relay writes, can be made to fail |
//! | [`MockIndicator`] | [`StatusIndicator`] | Tracks the indicator level |
//! | [`MockButton`] | [`ButtonInput`] | Settable button level |
//! | [`MockClock`] | [`Clock`] | Controllable time source |
//! | [`MockMqtt`] | [`MqttClient`] | Captures pub/sub operations, scripted failures |
//! | [`MockLink`] | [`NetworkLink`] | Switchable link state |
//! | [`MockUpdater`] | [`UpdateService`] | Counts service calls |
//!
//! # Example
//!
//! ```rust
//! use relay_switch::{DesiredState, RelayState, StateReconciler};
//! use relay_switch::hal::{MockMqtt, MockRelay};
//!
//! let desired = DesiredState::new(RelayState::On);
//! let mut mqtt = MockMqtt::new();
//! let mut reconciler = StateReconciler::new(MockRelay::new(), "status/lswitch0/light").unwrap();
//!
//! reconciler.reconcile(&desired, &mut mqtt).unwrap();
//! assert_eq!(reconciler.relay().state, RelayState::On);
//! assert_eq!(mqtt.published_to("status/lswitch0/light")[0].1, b"1");
//! ```
//!
//! [`RelayOutput`]: crate::traits::RelayOutput
//! [`StatusIndicator`]: crate::traits::StatusIndicator
//! [`ButtonInput`]: crate::traits::ButtonInput
//! [`Clock`]: crate::traits::Clock
//! [`MqttClient`]: crate::traits::MqttClient
//! [`NetworkLink`]: crate::traits::NetworkLink
//! [`UpdateService`]: crate::traits::UpdateService

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;

use crate::traits::{
    ButtonInput, Clock, MqttClient, MqttMessage, NetworkLink, RelayOutput, RelayState,
    StatusIndicator, UpdateService,
};

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock relay output for testing.
///
/// Records the driven state and the number of writes. Set `fail` to make
/// writes return an error without touching `state`.
///
/// # Example
///
/// ```rust
/// use relay_switch::hal::MockRelay;
/// use relay_switch::traits::{RelayOutput, RelayState};
///
/// let mut relay = MockRelay::new();
/// relay.set_state(RelayState::On).unwrap();
/// assert_eq!(relay.state, RelayState::On);
/// assert_eq!(relay.write_count, 1);
///
/// relay.fail = true;
/// assert!(relay.set_state(RelayState::Off).is_err());
/// assert_eq!(relay.state, RelayState::On);
/// ```
#[derive(Debug, Default)]
pub struct MockRelay {
    /// Last state successfully written.
    pub state: RelayState,
    /// Number of successful writes.
    pub write_count: usize,
    /// When true, writes fail.
    pub fail: bool,
}

impl MockRelay {
    /// Creates a new mock relay, off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock relay whose writes fail.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl RelayOutput for MockRelay {
    type Error = ();

    fn set_state(&mut self, state: RelayState) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.state = state;
        self.write_count += 1;
        Ok(())
    }
}

/// Mock status indicator.
#[derive(Debug, Default)]
pub struct MockIndicator {
    /// Current indicator level.
    pub lit: bool,
    /// Every level written, in order.
    pub history: Vec<bool>,
}

impl MockIndicator {
    /// Creates a new, dark indicator.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusIndicator for MockIndicator {
    fn set_lit(&mut self, lit: bool) {
        self.lit = lit;
        self.history.push(lit);
    }
}

/// Mock push button.
///
/// # Example
///
/// ```rust
/// use relay_switch::hal::MockButton;
/// use relay_switch::traits::{ButtonInput, Edge};
///
/// let mut button = MockButton::new();
/// assert_eq!(button.current_edge(), Edge::Released);
///
/// button.press();
/// assert!(button.is_pressed());
/// assert_eq!(button.current_edge(), Edge::Pressed);
/// ```
#[derive(Debug, Default)]
pub struct MockButton {
    /// Whether the button is held down.
    pub pressed: bool,
}

impl MockButton {
    /// Creates a released button.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold the button down.
    pub fn press(&mut self) {
        self.pressed = true;
    }

    /// Let go of the button.
    pub fn release(&mut self) {
        self.pressed = false;
    }
}

impl ButtonInput for MockButton {
    fn is_pressed(&self) -> bool {
        self.pressed
    }
}

/// Mock clock for testing.
///
/// Provides a controllable time source for testing time-dependent behavior.
///
/// # Example
///
/// ```rust
/// use relay_switch::hal::MockClock;
/// use relay_switch::traits::Clock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.set(1000);
/// assert_eq!(clock.now_ms(), 1000);
///
/// clock.advance(500);
/// assert_eq!(clock.now_ms(), 1500);
/// ```
#[derive(Debug, Default)]
pub struct MockClock {
    current_ms: u64,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self { current_ms: 0 }
    }

    /// Sets the current time in milliseconds.
    pub fn set(&mut self, ms: u64) {
        self.current_ms = ms;
    }

    /// Advances the clock by the given duration.
    pub fn advance(&mut self, ms: u64) {
        self.current_ms = self.current_ms.wrapping_add(ms);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms
    }
}

// ============================================================================
// Network Mocks
// ============================================================================

/// Mock MQTT session for testing.
///
/// Records all publish/subscribe operations and allows injecting
/// incoming messages. The `fail_*` flags script transport failures; a
/// failed call records nothing.
///
/// # Example
///
/// ```rust
/// use relay_switch::hal::MockMqtt;
/// use relay_switch::traits::MqttClient;
///
/// let mut mqtt = MockMqtt::disconnected();
/// assert!(!mqtt.is_connected());
///
/// mqtt.connect().unwrap();
/// assert!(mqtt.is_connected());
/// assert_eq!(mqtt.connect_attempts, 1);
///
/// mqtt.queue_message("cmnd/lswitch0/light", "on");
/// assert_eq!(mqtt.try_recv().unwrap().payload, b"on");
/// assert!(mqtt.try_recv().is_none());
/// ```
#[derive(Debug, Default)]
pub struct MockMqtt {
    /// Messages that have been published (topic, payload, retain).
    pub published: Vec<(String, Vec<u8>, bool)>,
    /// Topics that have been subscribed to.
    pub subscriptions: Vec<String>,
    /// Queue of incoming messages to be returned by `try_recv()`.
    pub incoming: Vec<MqttMessage>,
    /// Whether the session is up.
    pub connected: bool,
    /// Number of `connect()` calls.
    pub connect_attempts: u32,
    /// When true, `connect()` fails.
    pub fail_connect: bool,
    /// When true, `subscribe()` fails.
    pub fail_subscribe: bool,
    /// When true, `publish()` fails.
    pub fail_publish: bool,
}

impl MockMqtt {
    /// Creates a new mock session in connected state.
    pub fn new() -> Self {
        Self {
            connected: true,
            ..Default::default()
        }
    }

    /// Creates a new mock session with no session up.
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Queue an incoming message
    pub fn queue_message(&mut self, topic: impl Into<String>, payload: impl Into<Vec<u8>>) {
        self.incoming.push(MqttMessage::new(topic, payload));
    }

    /// Check if a topic was subscribed to
    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions.iter().any(|t| t == topic)
    }

    /// Get published messages for a topic
    pub fn published_to(&self, topic: &str) -> Vec<&(String, Vec<u8>, bool)> {
        self.published
            .iter()
            .filter(|(t, _, _)| t == topic)
            .collect()
    }

    /// Payloads published to a topic, as strings
    pub fn payloads_to(&self, topic: &str) -> Vec<String> {
        self.published_to(topic)
            .into_iter()
            .map(|(_, payload, _)| String::from_utf8_lossy(payload).into_owned())
            .collect()
    }
}

impl MqttClient for MockMqtt {
    type Error = ();

    fn connect(&mut self) -> Result<(), ()> {
        self.connect_attempts += 1;
        if self.fail_connect {
            self.connected = false;
            return Err(());
        }
        self.connected = true;
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), ()> {
        if self.fail_publish {
            return Err(());
        }
        self.published.push((topic.into(), payload.to_vec(), retain));
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), ()> {
        if self.fail_subscribe {
            return Err(());
        }
        self.subscriptions.push(topic.into());
        Ok(())
    }

    fn try_recv(&mut self) -> Option<MqttMessage> {
        if self.incoming.is_empty() {
            None
        } else {
            Some(self.incoming.remove(0))
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Mock network link.
#[derive(Debug, Default)]
pub struct MockLink {
    /// Whether the link is up.
    pub up: bool,
    /// Number of `is_link_up()` queries.
    pub queries: u32,
}

impl MockLink {
    /// A link that is up.
    pub fn up() -> Self {
        Self { up: true, queries: 0 }
    }

    /// A link that is down.
    pub fn down() -> Self {
        Self::default()
    }

    /// Change the link state.
    pub fn set_up(&mut self, up: bool) {
        self.up = up;
    }
}

impl NetworkLink for MockLink {
    fn is_link_up(&mut self) -> bool {
        self.queries += 1;
        self.up
    }
}

/// Mock update transport hook.
#[derive(Debug, Default)]
pub struct MockUpdater {
    /// Number of `service()` calls.
    pub calls: u32,
}

impl MockUpdater {
    /// Creates a new counter at zero.
    pub fn new() -> Self {
        Self::default()
    }
}

impl UpdateService for MockUpdater {
    fn service(&mut self) {
        self.calls += 1;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_relay_counts_writes() {
        let mut relay = MockRelay::new();
        relay.set_state(RelayState::On).unwrap();
        relay.set_state(RelayState::On).unwrap();
        assert_eq!(relay.write_count, 2);
    }

    #[test]
    fn mock_relay_failing_keeps_state() {
        let mut relay = MockRelay::new().failing();
        assert!(relay.set_state(RelayState::On).is_err());
        assert_eq!(relay.state, RelayState::Off);
        assert_eq!(relay.write_count, 0);
    }

    #[test]
    fn mock_indicator_history() {
        let mut led = MockIndicator::new();
        led.set_lit(true);
        led.set_lit(false);
        assert!(!led.lit);
        assert_eq!(led.history, vec![true, false]);
    }

    #[test]
    fn mock_button_release() {
        let mut button = MockButton::new();
        button.press();
        button.release();
        assert!(!button.is_pressed());
    }

    #[test]
    fn mock_mqtt_connect_failure() {
        let mut mqtt = MockMqtt::disconnected();
        mqtt.fail_connect = true;
        assert!(mqtt.connect().is_err());
        assert!(!mqtt.is_connected());
        assert_eq!(mqtt.connect_attempts, 1);
    }

    #[test]
    fn mock_mqtt_failures_record_nothing() {
        let mut mqtt = MockMqtt::new();
        mqtt.fail_publish = true;
        mqtt.fail_subscribe = true;
        assert!(mqtt.publish("t", b"1", false).is_err());
        assert!(mqtt.subscribe("t").is_err());
        assert!(mqtt.published.is_empty());
        assert!(mqtt.subscriptions.is_empty());
    }

    #[test]
    fn mock_mqtt_fifo_and_payloads() {
        let mut mqtt = MockMqtt::new();
        mqtt.queue_message("a", "1");
        mqtt.queue_message("b", "2");
        assert_eq!(mqtt.try_recv().unwrap().topic, "a");
        assert_eq!(mqtt.try_recv().unwrap().topic, "b");

        mqtt.publish("s", b"1", false).unwrap();
        mqtt.publish("s", b"0", false).unwrap();
        assert_eq!(mqtt.payloads_to("s"), vec!["1", "0"]);
    }

    #[test]
    fn mock_link_counts_queries() {
        let mut link = MockLink::down();
        assert!(!link.is_link_up());
        link.set_up(true);
        assert!(link.is_link_up());
        assert_eq!(link.queries, 2);
    }

    #[test]
    fn mock_updater_counts() {
        let mut updater = MockUpdater::new();
        updater.service();
        assert_eq!(updater.calls, 1);
    }
}
