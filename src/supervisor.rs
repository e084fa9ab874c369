//! Message-bus session supervision.
//!
//! [`ConnectionSupervisor`] keeps the session alive on a fixed period
//! (5000 ms by default). Each check walks the same ladder:
//!
//! ```text
//! link down?            -> Disconnected, indicator off, no session attempt
//! session not up?       -> connect(); on failure indicator off
//! fresh session?        -> subscribe cmnd/{NAME}/light and cmnd/group/lights
//! otherwise             -> Connected, indicator lit
//! ```
//!
//! There is no backoff and no retry limit; a failed check is simply
//! repeated one period later. The indicator is lit exactly when the last
//! check ended with an established, subscribed session.
//!
//! # Example
//!
//! ```rust
//! use relay_switch::config::Config;
//! use relay_switch::hal::{MockIndicator, MockLink, MockMqtt};
//! use relay_switch::supervisor::{ConnectionState, ConnectionSupervisor, SessionStatus};
//!
//! let mut supervisor = ConnectionSupervisor::new(&Config::default());
//! let mut link = MockLink::up();
//! let mut mqtt = MockMqtt::disconnected();
//! let mut led = MockIndicator::new();
//!
//! let status = supervisor.check(0, &mut link, &mut mqtt, &mut led).unwrap();
//! assert_eq!(status, SessionStatus::Established);
//! assert_eq!(supervisor.state(), ConnectionState::Connected);
//! assert!(mqtt.is_subscribed("cmnd/lswitch0/light"));
//! assert!(led.lit);
//!
//! assert!(!supervisor.is_due(4_999));
//! assert!(supervisor.is_due(5_000));
//! ```

use log::info;

use crate::config::{long_string, Config, Topics};
use crate::error::ConnectionError;
use crate::traits::{MqttClient, NetworkLink, StatusIndicator};

/// Session state as last observed by the supervisor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No usable session (initial state).
    #[default]
    Disconnected,
    /// Session established and command topics subscribed.
    Connected,
}

/// Successful outcome of a connection check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    /// The session was already up, nothing was done.
    Healthy,
    /// A new session was set up and subscribed during this check.
    Established,
}

/// Periodic session health check.
#[derive(Clone, Debug)]
pub struct ConnectionSupervisor {
    topics: Topics,
    period_ms: u64,
    last_check_ms: u64,
    state: ConnectionState,
    attempts: u32,
}

impl ConnectionSupervisor {
    /// Create a supervisor for the configured device and check period.
    pub fn new(config: &Config) -> Self {
        Self::with_period(config.topics(), config.timing.connection_check_ms)
    }

    /// Create a supervisor with explicit topics and period.
    pub fn with_period(topics: Topics, period_ms: u32) -> Self {
        Self {
            topics,
            period_ms: period_ms as u64,
            last_check_ms: 0,
            state: ConnectionState::Disconnected,
            attempts: 0,
        }
    }

    /// Whether a full period has passed since the last check.
    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms.wrapping_sub(self.last_check_ms) >= self.period_ms
    }

    /// Run one connection check.
    ///
    /// Restarts the period timer regardless of the outcome.
    ///
    /// # Errors
    ///
    /// - [`ConnectionError::LinkDown`] if the network link is down.
    /// - [`ConnectionError::Establish`] if the session handshake failed.
    /// - [`ConnectionError::Subscribe`] if a command topic subscription
    ///   failed; the next check subscribes again.
    pub fn check<L, C, I>(
        &mut self,
        now_ms: u64,
        link: &mut L,
        client: &mut C,
        indicator: &mut I,
    ) -> Result<SessionStatus, ConnectionError<C::Error>>
    where
        L: NetworkLink,
        C: MqttClient,
        I: StatusIndicator,
    {
        self.last_check_ms = now_ms;

        if !link.is_link_up() {
            self.state = ConnectionState::Disconnected;
            indicator.set_lit(false);
            return Err(ConnectionError::LinkDown);
        }

        if !client.is_connected() {
            self.state = ConnectionState::Disconnected;
            self.attempts = self.attempts.wrapping_add(1);
            if let Err(e) = client.connect() {
                indicator.set_lit(false);
                return Err(ConnectionError::Establish(e));
            }
        }

        // A session the transport brought back by itself lost its
        // subscriptions too.
        let fresh = self.state == ConnectionState::Disconnected;
        if fresh {
            for topic in self.topics.command_topics() {
                if let Err(error) = client.subscribe(topic) {
                    indicator.set_lit(false);
                    return Err(ConnectionError::Subscribe {
                        topic: long_string(topic),
                        error,
                    });
                }
            }
            info!(
                "session up, subscribed to {} and {}",
                self.topics.command, self.topics.group
            );
        }

        self.state = ConnectionState::Connected;
        indicator.set_lit(true);
        Ok(if fresh {
            SessionStatus::Established
        } else {
            SessionStatus::Healthy
        })
    }

    /// Run a check only if one is due.
    pub fn check_if_due<L, C, I>(
        &mut self,
        now_ms: u64,
        link: &mut L,
        client: &mut C,
        indicator: &mut I,
    ) -> Option<Result<SessionStatus, ConnectionError<C::Error>>>
    where
        L: NetworkLink,
        C: MqttClient,
        I: StatusIndicator,
    {
        if self.is_due(now_ms) {
            Some(self.check(now_ms, link, client, indicator))
        } else {
            None
        }
    }

    /// Session state after the last check.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether the last check ended with a subscribed session.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Number of session establishment attempts so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Time of the last check.
    pub fn last_check_ms(&self) -> u64 {
        self.last_check_ms
    }

    /// Check period in milliseconds.
    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }
}
