//! Session status shared between a transport's event thread and the
//! [`MqttClient`](crate::traits::MqttClient) adapter in front of it.
//!
//! Both MQTT transports (ESP-IDF and rumqttc) run their connection in the
//! background and reconnect on their own. The event thread reports what it
//! sees on a [`SessionFlag`]; the adapter reads it through a
//! [`SessionWatch`] without ever waiting.
//!
//! Every acknowledged connection starts a new epoch. A watch only counts
//! the session it adopted as connected, so a reconnect that happened
//! between two supervisor checks still shows up as "not connected" once.
//! The supervisor then adopts the new session and subscribes again, which
//! a clean broker session requires.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use relay_switch::session::{SessionFlag, SessionWatch};
//!
//! let flag = Arc::new(SessionFlag::new());
//! let mut watch = SessionWatch::new(Arc::clone(&flag));
//!
//! assert!(!watch.adopt());
//!
//! flag.mark_up();
//! assert!(watch.adopt());
//! assert!(watch.is_current());
//!
//! // transport dropped and reconnected by itself
//! flag.mark_down();
//! flag.mark_up();
//! assert!(!watch.is_current());
//! ```

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// Written by the transport's event thread.
#[derive(Debug, Default)]
pub struct SessionFlag {
    up: AtomicBool,
    epoch: AtomicU32,
}

impl SessionFlag {
    /// A flag with no session.
    pub const fn new() -> Self {
        Self {
            up: AtomicBool::new(false),
            epoch: AtomicU32::new(0),
        }
    }

    /// The broker acknowledged a new connection.
    pub fn mark_up(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.up.store(true, Ordering::Release);
    }

    /// The connection is gone.
    pub fn mark_down(&self) {
        self.up.store(false, Ordering::Release);
    }

    /// Whether a connection is up right now.
    pub fn is_up(&self) -> bool {
        self.up.load(Ordering::Acquire)
    }

    /// Number of connections acknowledged so far.
    pub fn epoch(&self) -> u32 {
        self.epoch.load(Ordering::Acquire)
    }
}

/// Adapter-side view of a [`SessionFlag`].
#[derive(Debug)]
pub struct SessionWatch {
    flag: Arc<SessionFlag>,
    adopted: Option<u32>,
}

impl SessionWatch {
    /// Watch `flag`, with no session adopted yet.
    pub fn new(flag: Arc<SessionFlag>) -> Self {
        Self {
            flag,
            adopted: None,
        }
    }

    /// Adopt the live connection, if there is one. Never waits.
    pub fn adopt(&mut self) -> bool {
        if self.flag.is_up() {
            self.adopted = Some(self.flag.epoch());
            true
        } else {
            false
        }
    }

    /// Whether the adopted connection is still the live one.
    pub fn is_current(&self) -> bool {
        self.flag.is_up() && self.adopted == Some(self.flag.epoch())
    }

    /// The shared flag.
    pub fn flag(&self) -> &Arc<SessionFlag> {
        &self.flag
    }
}
