//! Drives the relay toward the desired state and announces each change.
//!
//! [`StateReconciler`] owns the actual relay state. Once per tick it
//! compares that with the shared [`DesiredState`]; on a mismatch it writes
//! the relay, records the new actual state and publishes exactly one status
//! message (`"1"` or `"0"`) on `status/{NAME}/light`.
//!
//! # Failure Semantics
//!
//! | Failure | Effect |
//! |---------|--------|
//! | Relay write | Actual state unchanged, nothing published, retried next tick |
//! | Status publish | Transition still counts, not retried, logged |
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
//! let transition = reconciler.reconcile(&desired, &mut mqtt).unwrap();
//! assert_eq!(transition.map(|t| t.state), Some(RelayState::On));
//! assert_eq!(mqtt.published_to("status/lswitch0/light").len(), 1);
//!
//! // Nothing to do until the desired state moves again
//! assert!(reconciler.reconcile(&desired, &mut mqtt).unwrap().is_none());
//! ```

use log::{info, warn};

use crate::config::{long_string, LongString};
use crate::state::DesiredState;
use crate::traits::{MqttClient, RelayOutput, RelayState};

/// One change of the actual relay state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    /// New actual state.
    pub state: RelayState,
    /// Whether the session accepted the status publish.
    pub published: bool,
}

/// Realizes the desired state on the relay output.
pub struct StateReconciler<R: RelayOutput> {
    relay: R,
    actual: RelayState,
    status_topic: LongString,
    transitions: u32,
}

impl<R: RelayOutput> StateReconciler<R> {
    /// Create a reconciler and drive the relay off.
    ///
    /// # Errors
    ///
    /// Returns the relay's error if the initial write fails.
    pub fn new(mut relay: R, status_topic: &str) -> Result<Self, R::Error> {
        relay.set_state(RelayState::Off)?;
        Ok(Self {
            relay,
            actual: RelayState::Off,
            status_topic: long_string(status_topic),
            transitions: 0,
        })
    }

    /// Apply the desired state if it differs from the actual state.
    ///
    /// Returns `Ok(None)` when nothing changed.
    ///
    /// # Errors
    ///
    /// Returns the relay's error if the output write fails. The actual
    /// state is left as it was so the next call tries again.
    pub fn reconcile<C: MqttClient>(
        &mut self,
        desired: &DesiredState,
        client: &mut C,
    ) -> Result<Option<Transition>, R::Error> {
        let target = desired.get();
        if target == self.actual {
            return Ok(None);
        }

        self.relay.set_state(target)?;
        self.actual = target;
        self.transitions = self.transitions.wrapping_add(1);
        info!("relay {}", target);

        let published = client
            .publish(self.status_topic.as_str(), target.payload().as_bytes(), false)
            .is_ok();
        if !published {
            warn!(
                "status publish on {} failed, relay is {}",
                self.status_topic, target
            );
        }

        Ok(Some(Transition {
            state: target,
            published,
        }))
    }

    /// Current actual relay state.
    pub fn actual(&self) -> RelayState {
        self.actual
    }

    /// Number of transitions applied since construction.
    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    /// Topic the status is published on.
    pub fn status_topic(&self) -> &str {
        self.status_topic.as_str()
    }

    /// Access the relay output.
    pub fn relay(&self) -> &R {
        &self.relay
    }

    /// Mutable access to the relay output.
    pub fn relay_mut(&mut self) -> &mut R {
        &mut self.relay
    }
}
