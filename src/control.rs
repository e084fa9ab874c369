//! The cooperative control loop.
//!
//! [`ControlLoop`] owns every main-context collaborator and runs one fixed
//! cycle per tick:
//!
//! 1. Connection check, when the check period has elapsed.
//! 2. Drain pending bus messages into the command parser.
//! 3. Service the update transport hook.
//! 4. Reconcile the relay with the desired state.
//!
//! The caller then waits one tick period (50 ms) and repeats. A command
//! received during tick N is therefore on the relay, and announced, by the
//! end of tick N.
//!
//! The button interrupt never touches the loop; it only writes the shared
//! [`DesiredState`] the loop borrows.
//!
//! # Example
//!
//! ```rust
//! use relay_switch::{ControlLoop, DesiredState, RelayState};
//! use relay_switch::config::Config;
//! use relay_switch::hal::{MockIndicator, MockLink, MockMqtt, MockRelay};
//!
//! let desired = DesiredState::default();
//! let mut control = ControlLoop::new(
//!     &Config::default(),
//!     &desired,
//!     MockMqtt::disconnected(),
//!     MockLink::up(),
//!     MockRelay::new(),
//!     MockIndicator::new(),
//!     (),
//! )
//! .unwrap();
//!
//! control.start(0).unwrap();
//! control.client_mut().queue_message("cmnd/lswitch0/light", "toggle");
//!
//! let report = control.tick(50);
//! assert_eq!(report.dispatched, 1);
//! assert_eq!(control.actual(), RelayState::On);
//! assert_eq!(control.client().published_to("status/lswitch0/light").len(), 1);
//! ```

use core::fmt::Debug;

use log::{info, warn};

use crate::commands::CommandParser;
use crate::config::Config;
use crate::error::ConnectionError;
use crate::reconciler::{StateReconciler, Transition};
use crate::state::DesiredState;
use crate::supervisor::{ConnectionSupervisor, SessionStatus};
use crate::traits::{
    Clock, MqttClient, NetworkLink, RelayOutput, RelayState, StatusIndicator, UpdateService,
};

/// Upper bound on bus messages handled in one tick.
///
/// Keeps a flooding broker from starving reconciliation.
pub const MAX_MESSAGES_PER_TICK: usize = 32;

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport<E> {
    /// Outcome of the connection check, if one was due.
    pub connection: Option<Result<SessionStatus, ConnectionError<E>>>,
    /// Messages that changed the desired state.
    pub dispatched: usize,
    /// Messages that were ignored (foreign topic or unknown payload).
    pub ignored: usize,
    /// Relay transition applied by this tick.
    pub transition: Option<Transition>,
    /// The relay write failed and will be retried.
    pub relay_fault: bool,
}

impl<E> Default for TickReport<E> {
    fn default() -> Self {
        Self {
            connection: None,
            dispatched: 0,
            ignored: 0,
            transition: None,
            relay_fault: false,
        }
    }
}

/// Main-context scheduler for one relay switch.
///
/// # Type Parameters
///
/// - `C`: message-bus session ([`MqttClient`])
/// - `L`: network link ([`NetworkLink`])
/// - `R`: relay output ([`RelayOutput`])
/// - `I`: session health indicator ([`StatusIndicator`])
/// - `U`: update transport hook ([`UpdateService`]), `()` for none
pub struct ControlLoop<'a, C, L, R, I, U = ()>
where
    C: MqttClient,
    L: NetworkLink,
    R: RelayOutput,
    I: StatusIndicator,
    U: UpdateService,
{
    desired: &'a DesiredState,
    client: C,
    link: L,
    indicator: I,
    updater: U,
    parser: CommandParser,
    supervisor: ConnectionSupervisor,
    reconciler: StateReconciler<R>,
    tick_ms: u32,
}

impl<'a, C, L, R, I, U> ControlLoop<'a, C, L, R, I, U>
where
    C: MqttClient,
    C::Error: Debug,
    L: NetworkLink,
    R: RelayOutput,
    R::Error: Debug,
    I: StatusIndicator,
    U: UpdateService,
{
    /// Assemble the loop. The relay is driven off and the indicator
    /// cleared before this returns.
    ///
    /// # Errors
    ///
    /// Returns the relay's error if the initial off write fails.
    pub fn new(
        config: &Config,
        desired: &'a DesiredState,
        client: C,
        link: L,
        relay: R,
        mut indicator: I,
        updater: U,
    ) -> Result<Self, R::Error> {
        let topics = config.topics();
        let reconciler = StateReconciler::new(relay, topics.status.as_str())?;
        indicator.set_lit(false);

        Ok(Self {
            desired,
            client,
            link,
            indicator,
            updater,
            parser: CommandParser::new(&topics),
            supervisor: ConnectionSupervisor::new(config),
            reconciler,
            tick_ms: config.timing.tick_ms,
        })
    }

    /// Run the startup connection check, before the first tick.
    pub fn start(&mut self, now_ms: u64) -> Result<SessionStatus, ConnectionError<C::Error>> {
        let result = self.supervisor.check(
            now_ms,
            &mut self.link,
            &mut self.client,
            &mut self.indicator,
        );
        log_connection(&result);
        result
    }

    /// Run one cycle.
    pub fn tick(&mut self, now_ms: u64) -> TickReport<C::Error> {
        let mut report = TickReport::default();

        report.connection = self.supervisor.check_if_due(
            now_ms,
            &mut self.link,
            &mut self.client,
            &mut self.indicator,
        );
        if let Some(result) = &report.connection {
            log_connection(result);
        }

        for _ in 0..MAX_MESSAGES_PER_TICK {
            let Some(message) = self.client.try_recv() else {
                break;
            };
            if self.parser.dispatch(&message, self.desired).is_some() {
                report.dispatched += 1;
            } else {
                report.ignored += 1;
            }
        }

        self.updater.service();

        match self.reconciler.reconcile(self.desired, &mut self.client) {
            Ok(transition) => report.transition = transition,
            Err(e) => {
                warn!("relay write failed, retrying next tick: {:?}", e);
                report.relay_fault = true;
            }
        }

        report
    }

    /// Run forever: startup check, then tick and sleep `tick_ms` between
    /// ticks.
    pub fn run<K: Clock>(&mut self, clock: &K, mut sleep: impl FnMut(u32)) -> ! {
        let _ = self.start(clock.now_ms());
        loop {
            self.tick(clock.now_ms());
            sleep(self.tick_ms);
        }
    }

    /// The shared desired state.
    pub fn desired(&self) -> RelayState {
        self.desired.get()
    }

    /// The relay state last applied.
    pub fn actual(&self) -> RelayState {
        self.reconciler.actual()
    }

    /// Delay between ticks.
    pub fn tick_ms(&self) -> u32 {
        self.tick_ms
    }

    /// The connection supervisor.
    pub fn supervisor(&self) -> &ConnectionSupervisor {
        &self.supervisor
    }

    /// The reconciler (and through it, the relay).
    pub fn reconciler(&self) -> &StateReconciler<R> {
        &self.reconciler
    }

    /// Mutable access to the relay output.
    pub fn relay_mut(&mut self) -> &mut R {
        self.reconciler.relay_mut()
    }

    /// The message-bus session.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Mutable access to the message-bus session.
    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    /// Mutable access to the network link.
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// The status indicator.
    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    /// Mutable access to the update hook.
    pub fn updater_mut(&mut self) -> &mut U {
        &mut self.updater
    }
}

fn log_connection<E: Debug>(result: &Result<SessionStatus, ConnectionError<E>>) {
    match result {
        Ok(SessionStatus::Established) => info!("session established"),
        Ok(SessionStatus::Healthy) => {}
        Err(e) => warn!("connection check: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockIndicator, MockLink, MockMqtt, MockRelay, MockUpdater};

    type TestLoop<'a> = ControlLoop<'a, MockMqtt, MockLink, MockRelay, MockIndicator, MockUpdater>;

    fn control(desired: &DesiredState) -> TestLoop<'_> {
        ControlLoop::new(
            &Config::default(),
            desired,
            MockMqtt::disconnected(),
            MockLink::up(),
            MockRelay::new(),
            MockIndicator::new(),
            MockUpdater::new(),
        )
        .unwrap()
    }

    #[test]
    fn new_starts_dark_and_off() {
        let desired = DesiredState::default();
        let control = control(&desired);
        assert_eq!(control.actual(), RelayState::Off);
        assert!(!control.indicator().lit);
        assert_eq!(control.tick_ms(), 50);
    }

    #[test]
    fn start_connects_synchronously() {
        let desired = DesiredState::default();
        let mut control = control(&desired);
        assert_eq!(control.start(0), Ok(SessionStatus::Established));
        assert!(control.indicator().lit);
        assert!(control.client().is_subscribed("cmnd/group/lights"));
    }

    #[test]
    fn tick_checks_connection_only_when_due() {
        let desired = DesiredState::default();
        let mut control = control(&desired);
        control.start(0).unwrap();

        assert!(control.tick(50).connection.is_none());
        assert!(control.tick(4950).connection.is_none());
        assert_eq!(
            control.tick(5000).connection,
            Some(Ok(SessionStatus::Healthy))
        );
        assert!(control.tick(5050).connection.is_none());
    }

    #[test]
    fn tick_check_restarts_period() {
        let desired = DesiredState::default();
        let mut control = control(&desired);
        control.start(0).unwrap();

        control.tick(5000);
        assert_eq!(control.supervisor().last_check_ms(), 5000);
        control.tick(9950);
        assert_eq!(control.supervisor().last_check_ms(), 5000);
        assert!(control.tick(10_000).connection.is_some());
    }

    #[test]
    fn tick_services_updater_every_time() {
        let desired = DesiredState::default();
        let mut control = control(&desired);
        control.start(0).unwrap();
        for i in 1..=5 {
            control.tick(i * 50);
        }
        assert_eq!(control.updater_mut().calls, 5);
    }

    #[test]
    fn message_reaches_relay_in_same_tick() {
        let desired = DesiredState::default();
        let mut control = control(&desired);
        control.start(0).unwrap();

        control.client_mut().queue_message("cmnd/group/lights", "on");
        let report = control.tick(50);
        assert_eq!(report.dispatched, 1);
        assert_eq!(
            report.transition.map(|t| t.state),
            Some(RelayState::On)
        );
        assert_eq!(control.relay_mut().state, RelayState::On);
    }

    #[test]
    fn ignored_messages_are_counted() {
        let desired = DesiredState::default();
        let mut control = control(&desired);
        control.start(0).unwrap();

        control.client_mut().queue_message("cmnd/other/light", "on");
        control.client_mut().queue_message("cmnd/lswitch0/light", "dim");
        let report = control.tick(50);
        assert_eq!(report.dispatched, 0);
        assert_eq!(report.ignored, 2);
        assert!(report.transition.is_none());
    }

    #[test]
    fn message_budget_per_tick() {
        let desired = DesiredState::default();
        let mut control = control(&desired);
        control.start(0).unwrap();

        for _ in 0..(MAX_MESSAGES_PER_TICK + 3) {
            control.client_mut().queue_message("cmnd/lswitch0/light", "1");
        }
        assert_eq!(control.tick(50).dispatched, MAX_MESSAGES_PER_TICK);
        assert_eq!(control.tick(100).dispatched, 3);
    }

    #[test]
    fn relay_fault_is_reported_and_retried() {
        let desired = DesiredState::new(RelayState::On);
        let mut control = control(&desired);
        control.start(0).unwrap();

        control.relay_mut().fail = true;
        let report = control.tick(50);
        assert!(report.relay_fault);
        assert_eq!(control.actual(), RelayState::Off);

        control.relay_mut().fail = false;
        let report = control.tick(100);
        assert!(!report.relay_fault);
        assert_eq!(control.actual(), RelayState::On);
    }

    #[test]
    fn desired_reflects_shared_cell() {
        let desired = DesiredState::default();
        let control = control(&desired);
        desired.toggle();
        assert_eq!(control.desired(), RelayState::On);
    }
}
