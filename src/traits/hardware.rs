//! Hardware abstraction traits for the relay, button, and status indicator.
//!
//! This module defines the core hardware interfaces that allow relay-switch to
//! run on different platforms (ESP32, desktop mocks, etc.).
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`RelayOutput`] | Single binary output driving the mains relay |
//! | [`StatusIndicator`] | Visible session-health indicator (LED) |
//! | [`ButtonInput`] | Single binary input for the momentary button |
//! | [`Clock`] | Time source for `no_std` environments |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For ESP32 hardware, use the
//! implementations from `hal::esp32` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use relay_switch::traits::{RelayOutput, RelayState};
//! use relay_switch::hal::MockRelay;
//!
//! let mut relay = MockRelay::new();
//! relay.set_state(RelayState::On).unwrap();
//! assert_eq!(relay.state, RelayState::On);
//! ```

/// Logical state of the relay.
///
/// # Default
///
/// Defaults to [`Off`](Self::Off): the relay is de-energised at boot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RelayState {
    /// Relay de-energised, load unpowered.
    #[default]
    Off,
    /// Relay energised, load powered.
    On,
}

impl RelayState {
    /// Builds a state from a boolean (`true` = on).
    #[inline]
    pub const fn from_bool(on: bool) -> Self {
        if on {
            RelayState::On
        } else {
            RelayState::Off
        }
    }

    /// Returns `true` for [`On`](Self::On).
    #[inline]
    pub const fn is_on(&self) -> bool {
        matches!(self, RelayState::On)
    }

    /// Returns the opposite state.
    #[inline]
    pub const fn toggled(&self) -> Self {
        match self {
            RelayState::Off => RelayState::On,
            RelayState::On => RelayState::Off,
        }
    }

    /// Returns the status payload announced for this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use relay_switch::RelayState;
    ///
    /// assert_eq!(RelayState::On.payload(), "1");
    /// assert_eq!(RelayState::Off.payload(), "0");
    /// ```
    #[inline]
    pub const fn payload(&self) -> &'static str {
        match self {
            RelayState::Off => "0",
            RelayState::On => "1",
        }
    }

    /// Returns the state as a lowercase word, for logs.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            RelayState::Off => "off",
            RelayState::On => "on",
        }
    }
}

impl From<bool> for RelayState {
    fn from(on: bool) -> Self {
        RelayState::from_bool(on)
    }
}

impl core::fmt::Display for RelayState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a button edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    /// The button went down.
    Pressed,
    /// The button came back up.
    Released,
}

impl Edge {
    /// Maps a sampled pin level to an edge direction.
    ///
    /// For an active-low button (pull-up, switch to ground) a high level
    /// means the button has been released.
    ///
    /// ```
    /// use relay_switch::traits::Edge;
    ///
    /// assert_eq!(Edge::from_level(true, true), Edge::Released);
    /// assert_eq!(Edge::from_level(false, true), Edge::Pressed);
    /// assert_eq!(Edge::from_level(true, false), Edge::Pressed);
    /// ```
    #[inline]
    pub const fn from_level(level_high: bool, active_low: bool) -> Self {
        if level_high == active_low {
            Edge::Released
        } else {
            Edge::Pressed
        }
    }
}

/// Relay output trait - the physical-output write primitive.
///
/// # Implementation Notes
///
/// - A write either fully applies or returns an error; callers treat an
///   error as "state not applied" and retry later.
/// - Polarity (active-high or active-low drive) is the implementation's
///   concern, callers only speak [`RelayState`].
pub trait RelayOutput {
    /// Error type for output writes.
    type Error;

    /// Drive the relay to the given state.
    fn set_state(&mut self, state: RelayState) -> Result<(), Self::Error>;
}

/// Visible indicator reflecting session health.
///
/// Writes are best-effort: an indicator that cannot be driven must not
/// stop the device from switching.
pub trait StatusIndicator {
    /// Assert (`true`) or de-assert the indicator.
    fn set_lit(&mut self, lit: bool);
}

/// Button input trait - the physical-input read primitive.
///
/// Implementations must be cheap and safe to call from interrupt context.
pub trait ButtonInput {
    /// Returns true if the button is currently held down.
    fn is_pressed(&self) -> bool;

    /// Returns the edge implied by the current level.
    ///
    /// Called right after an edge interrupt fires: the level read then
    /// tells which way the button moved.
    fn current_edge(&self) -> Edge {
        if self.is_pressed() {
            Edge::Pressed
        } else {
            Edge::Released
        }
    }
}

/// Time source trait for `no_std` compatibility.
///
/// Provides monotonic time in milliseconds. On desktop, this can wrap
/// `std::time::Instant`. On embedded, use a hardware timer.
///
/// # Example
///
/// ```rust
/// use relay_switch::traits::Clock;
/// use relay_switch::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}
