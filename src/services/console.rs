//! Host stand-ins for the device hardware.
//!
//! Used by the desktop demo: the relay and LED are log lines, the link is
//! the host network (always up) and time comes from [`Instant`].

use std::convert::Infallible;
use std::time::Instant;

use log::info;

use crate::traits::{Clock, NetworkLink, RelayOutput, RelayState, StatusIndicator};

/// The host network, treated as always up.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostLink;

impl NetworkLink for HostLink {
    fn is_link_up(&mut self) -> bool {
        true
    }
}

/// Relay that logs every write.
#[derive(Debug, Default)]
pub struct ConsoleRelay {
    state: RelayState,
}

impl ConsoleRelay {
    /// Creates a relay, off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last state written.
    pub fn state(&self) -> RelayState {
        self.state
    }
}

impl RelayOutput for ConsoleRelay {
    type Error = Infallible;

    fn set_state(&mut self, state: RelayState) -> Result<(), Infallible> {
        info!("[relay] {}", state);
        self.state = state;
        Ok(())
    }
}

/// LED that logs level changes.
#[derive(Debug, Default)]
pub struct ConsoleIndicator {
    lit: Option<bool>,
}

impl ConsoleIndicator {
    /// Creates an indicator in an unknown state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the LED is lit.
    pub fn is_lit(&self) -> bool {
        self.lit.unwrap_or(false)
    }
}

impl StatusIndicator for ConsoleIndicator {
    fn set_lit(&mut self, lit: bool) {
        if self.lit != Some(lit) {
            info!("[led] {}", if lit { "lit" } else { "dark" });
        }
        self.lit = Some(lit);
    }
}

/// Milliseconds since construction.
#[derive(Debug, Clone, Copy)]
pub struct HostClock {
    start: Instant,
}

impl HostClock {
    /// Start counting from now.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for HostClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for HostClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_link_is_up() {
        assert!(HostLink.is_link_up());
    }

    #[test]
    fn console_relay_tracks_state() {
        let mut relay = ConsoleRelay::new();
        relay.set_state(RelayState::On).unwrap();
        assert_eq!(relay.state(), RelayState::On);
    }

    #[test]
    fn console_indicator_tracks_level() {
        let mut led = ConsoleIndicator::new();
        assert!(!led.is_lit());
        led.set_lit(true);
        assert!(led.is_lit());
    }

    #[test]
    fn host_clock_is_monotonic() {
        let clock = HostClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
