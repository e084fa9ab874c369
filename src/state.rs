//! The desired relay state, shared between the button interrupt and the
//! control loop.
//!
//! [`DesiredState`] is a single atomic cell. The button handler writes it
//! from interrupt context, the command parser writes it from the loop, and
//! only the reconciler reads it. Every access is one machine-atomic
//! operation, so neither side can observe a torn or half-applied value and
//! no lock is needed.
//!
//! # Example
//!
//! ```rust
//! use relay_switch::{DesiredState, RelayState};
//!
//! static DESIRED: DesiredState = DesiredState::new(RelayState::Off);
//!
//! DESIRED.set(RelayState::On);
//! assert_eq!(DESIRED.toggle(), RelayState::Off);
//! assert_eq!(DESIRED.get(), RelayState::Off);
//! ```

use core::sync::atomic::{AtomicBool, Ordering};

use crate::commands::RelayCommand;
use crate::traits::RelayState;

/// Atomic cell holding the relay state that should be realized.
#[derive(Debug, Default)]
pub struct DesiredState {
    on: AtomicBool,
}

impl DesiredState {
    /// Create a cell holding `initial`.
    pub const fn new(initial: RelayState) -> Self {
        Self {
            on: AtomicBool::new(initial.is_on()),
        }
    }

    /// Current desired state.
    #[inline]
    pub fn get(&self) -> RelayState {
        RelayState::from_bool(self.on.load(Ordering::Acquire))
    }

    /// Request `state`.
    #[inline]
    pub fn set(&self, state: RelayState) {
        self.on.store(state.is_on(), Ordering::Release);
    }

    /// Invert the desired state and return the new value.
    ///
    /// A single read-modify-write, so a toggle racing another writer is
    /// never lost.
    #[inline]
    pub fn toggle(&self) -> RelayState {
        let previous = self.on.fetch_xor(true, Ordering::AcqRel);
        RelayState::from_bool(!previous)
    }

    /// Apply a parsed command and return the resulting desired state.
    pub fn apply(&self, command: RelayCommand) -> RelayState {
        match command {
            RelayCommand::Set(state) => {
                self.set(state);
                state
            }
            RelayCommand::Toggle => self.toggle(),
        }
    }
}
