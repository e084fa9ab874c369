//! Desktop adapters for running the switch against a real broker.
//!
//! Enabled by the `mqtt` feature:
//! - `rumqtt`: [`RumqttSession`], the session trait over `rumqttc`
//! - `console`: host link, clock, and logging relay/LED stand-ins
//!
//! ```ignore
//! use relay_switch::services::{ConsoleIndicator, ConsoleRelay, HostClock, HostLink, RumqttSession};
//!
//! let session = RumqttSession::new(&config.mqtt, config.device.name.as_str())?;
//! let mut control = ControlLoop::new(
//!     &config, &DESIRED, session, HostLink, ConsoleRelay::new(), ConsoleIndicator::new(), (),
//! )?;
//! control.run(&HostClock::new(), |ms| std::thread::sleep(Duration::from_millis(ms as u64)));
//! ```

pub mod console;
pub mod rumqtt;

pub use console::*;
pub use rumqtt::*;
