//! Button press classification.
//!
//! [`PressClassifier`] runs in the button's edge interrupt. Each edge
//! carries a timestamp and a direction; only a release edge is classified,
//! by the time elapsed since the previous edge:
//!
//! | Elapsed since previous edge | Class |
//! |-----------------------------|-------|
//! | `<= debounce_ms` (100 ms)   | [`PressClass::NoAction`] (contact bounce) |
//! | `<= long_press_ms` (500 ms) | [`PressClass::ShortPress`] |
//! | longer                      | [`PressClass::LongPress`] |
//!
//! Both short and long presses toggle the desired relay state. The two
//! classes are kept apart so a later revision can give long presses their
//! own action.
//!
//! # Interrupt Safety
//!
//! [`PressClassifier::handle_edge`] is constant time: a subtraction, two
//! comparisons and at most one atomic read-modify-write. It never logs,
//! allocates or blocks.
//!
//! # Example
//!
//! ```rust
//! use relay_switch::{DesiredState, RelayState};
//! use relay_switch::press::{PressClass, PressClassifier, PressEvent};
//! use relay_switch::config::TimingConfig;
//!
//! let desired = DesiredState::new(RelayState::On);
//! let mut classifier = PressClassifier::new(&TimingConfig::default());
//!
//! classifier.handle_edge(PressEvent::pressed(1_000), &desired);
//! let class = classifier.handle_edge(PressEvent::released(1_700), &desired);
//!
//! assert_eq!(class, PressClass::LongPress);
//! assert_eq!(desired.get(), RelayState::Off);
//! ```

use crate::config::TimingConfig;
use crate::state::DesiredState;
use crate::traits::{ButtonInput, Edge};

/// A single button edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PressEvent {
    /// Time of the edge in milliseconds.
    pub timestamp_ms: u64,
    /// Which way the button moved.
    pub edge: Edge,
}

impl PressEvent {
    /// Create an event.
    pub const fn new(timestamp_ms: u64, edge: Edge) -> Self {
        Self { timestamp_ms, edge }
    }

    /// A press (button down) edge.
    pub const fn pressed(timestamp_ms: u64) -> Self {
        Self::new(timestamp_ms, Edge::Pressed)
    }

    /// A release (button up) edge.
    pub const fn released(timestamp_ms: u64) -> Self {
        Self::new(timestamp_ms, Edge::Released)
    }
}

/// Result of classifying an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PressClass {
    /// Press edge, or a release too soon after the previous edge.
    NoAction,
    /// Released within the long-press threshold.
    ShortPress,
    /// Held past the long-press threshold.
    LongPress,
}

impl PressClass {
    /// Whether this class toggles the desired relay state.
    #[inline]
    pub const fn toggles(&self) -> bool {
        match self {
            PressClass::NoAction => false,
            PressClass::ShortPress | PressClass::LongPress => true,
        }
    }
}

/// Edge-driven press classifier.
///
/// Owns the press window start; nothing outside the interrupt context
/// reads or writes it.
#[derive(Clone, Debug)]
pub struct PressClassifier {
    window_start_ms: u64,
    debounce_ms: u64,
    long_press_ms: u64,
}

impl PressClassifier {
    /// Create a classifier using the thresholds from `timing`.
    pub fn new(timing: &TimingConfig) -> Self {
        Self::with_thresholds(timing.debounce_ms, timing.long_press_ms)
    }

    /// Create a classifier with explicit thresholds in milliseconds.
    pub const fn with_thresholds(debounce_ms: u32, long_press_ms: u32) -> Self {
        Self {
            window_start_ms: 0,
            debounce_ms: debounce_ms as u64,
            long_press_ms: long_press_ms as u64,
        }
    }

    /// Timestamp of the most recent edge.
    #[inline]
    pub fn window_start_ms(&self) -> u64 {
        self.window_start_ms
    }

    /// Classify an edge and start a new window at its timestamp.
    pub fn on_edge(&mut self, event: PressEvent) -> PressClass {
        let class = match event.edge {
            Edge::Pressed => PressClass::NoAction,
            Edge::Released => {
                let held_ms = event.timestamp_ms.wrapping_sub(self.window_start_ms);
                if held_ms > self.long_press_ms {
                    PressClass::LongPress
                } else if held_ms > self.debounce_ms {
                    PressClass::ShortPress
                } else {
                    PressClass::NoAction
                }
            }
        };
        self.window_start_ms = event.timestamp_ms;
        class
    }

    /// Classify an edge and toggle `desired` on a qualifying press.
    pub fn handle_edge(&mut self, event: PressEvent, desired: &DesiredState) -> PressClass {
        let class = self.on_edge(event);
        if class.toggles() {
            desired.toggle();
        }
        class
    }

    /// Entry point for an edge interrupt: read which way `button` moved
    /// and handle the edge at `now_ms`.
    pub fn handle_input<B: ButtonInput + ?Sized>(
        &mut self,
        button: &B,
        now_ms: u64,
        desired: &DesiredState,
    ) -> PressClass {
        self.handle_edge(PressEvent::new(now_ms, button.current_edge()), desired)
    }
}

impl Default for PressClassifier {
    fn default() -> Self {
        Self::new(&TimingConfig::default())
    }
}
