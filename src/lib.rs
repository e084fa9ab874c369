//! # relay-switch
//!
//! Firmware core for a networked single-relay wall switch: one momentary
//! push button, one mains relay, one status LED, and an MQTT session.
//!
//! ## Features
//!
//! - **Local control**: debounced button presses toggle the relay from an
//!   edge interrupt
//! - **Remote control**: `"1"`/`"0"`/`"on"`/`"off"`/`"toggle"` on a device
//!   topic or a group broadcast topic
//! - **Status**: exactly one `"1"`/`"0"` status publish per relay change
//! - **Self-healing session**: periodic link and session checks with
//!   resubscription, health shown on the LED
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware and network abstractions
//! - `state` - The desired-state cell shared with the button interrupt
//! - `press` - Edge-driven press classification
//! - `commands` - Bus command parsing
//! - `reconciler` - Relay drive and status announcement
//! - `supervisor` - Session health checks
//! - `session` - Session status shared with background transports
//! - `control` - The cooperative loop tying everything together
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Topics
//!
//! | Topic | Direction | Payload |
//! |-------|-----------|---------|
//! | `cmnd/{NAME}/light` | in | `1`, `0`, `on`, `off`, `toggle` |
//! | `cmnd/group/lights` | in | same |
//! | `status/{NAME}/light` | out | `1` or `0` |
//!
//! ## Example
//!
//! ```rust
//! use relay_switch::{ControlLoop, DesiredState, RelayState};
//! use relay_switch::config::Config;
//! use relay_switch::hal::{MockIndicator, MockLink, MockMqtt, MockRelay};
//! use relay_switch::press::{PressClassifier, PressEvent};
//!
//! static DESIRED: DesiredState = DesiredState::new(RelayState::Off);
//!
//! let config = Config::default();
//! let mut control = ControlLoop::new(
//!     &config,
//!     &DESIRED,
//!     MockMqtt::disconnected(),
//!     MockLink::up(),
//!     MockRelay::new(),
//!     MockIndicator::new(),
//!     (),
//! )
//! .unwrap();
//! control.start(0).unwrap();
//!
//! // The button interrupt classifies edges and writes the shared cell
//! let mut classifier = PressClassifier::new(&config.timing);
//! classifier.handle_edge(PressEvent::pressed(1_000), &DESIRED);
//! classifier.handle_edge(PressEvent::released(1_250), &DESIRED);
//!
//! // The next tick switches the relay and announces it
//! control.tick(1_300);
//! assert_eq!(control.actual(), RelayState::On);
//! assert_eq!(control.client().payloads_to("status/lswitch0/light"), vec!["1"]);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Bus command parsing.
pub mod commands;
/// The cooperative control loop.
pub mod control;
/// Error taxonomy for session supervision.
pub mod error;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Edge-driven press classification.
pub mod press;
/// Relay drive and status announcement.
pub mod reconciler;
/// Desired relay state shared with interrupt context.
pub mod state;
/// Session status shared with transport event threads.
#[cfg(feature = "std")]
pub mod session;
/// Periodic session health checks.
pub mod supervisor;
/// Core traits for hardware and network abstraction.
pub mod traits;

/// Shared configuration system for desktop and ESP32.
pub mod config;

/// Desktop adapters over rumqttc (feature-gated).
#[cfg(feature = "mqtt")]
pub mod services;

// Re-exports for convenience
pub use commands::{CommandChannel, CommandParser, Dispatch, RelayCommand};
pub use control::{ControlLoop, TickReport, MAX_MESSAGES_PER_TICK};
pub use error::ConnectionError;
pub use press::{PressClass, PressClassifier, PressEvent};
pub use reconciler::{StateReconciler, Transition};
pub use state::DesiredState;
pub use supervisor::{ConnectionState, ConnectionSupervisor, SessionStatus};
pub use traits::{
    // Hardware
    ButtonInput,
    Clock,
    Edge,
    // Network
    MqttClient,
    MqttMessage,
    NetworkLink,
    RelayOutput,
    RelayState,
    StatusIndicator,
    UpdateService,
};

// Config re-exports
pub use config::{Config, DeviceConfig, MqttConfig, TimingConfig, Topics, WifiConfig};
