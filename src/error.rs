//! Error types for session supervision.
//!
//! Hardware and session traits carry their own associated `Error` types;
//! this module only adds the failure taxonomy of the connection check.
//! None of these are fatal: the control loop logs them and retries on the
//! next check period.

use core::fmt;

use crate::config::LongString;

/// Why a connection check did not end with a healthy session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError<E> {
    /// The underlying network link is down, no session attempt was made.
    LinkDown,
    /// The link is up but the session handshake failed.
    Establish(E),
    /// The session came up but a command topic subscription failed.
    Subscribe {
        /// Topic that could not be subscribed.
        topic: LongString,
        /// Transport error.
        error: E,
    },
}

impl<E> ConnectionError<E> {
    /// Whether the failure happened below the session (link level).
    pub fn is_link_down(&self) -> bool {
        matches!(self, ConnectionError::LinkDown)
    }
}

impl<E: fmt::Debug> fmt::Display for ConnectionError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::LinkDown => write!(f, "network link down"),
            ConnectionError::Establish(e) => write!(f, "session establish failed: {:?}", e),
            ConnectionError::Subscribe { topic, error } => {
                write!(f, "subscribe to {} failed: {:?}", topic, error)
            }
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug> std::error::Error for ConnectionError<E> {}
