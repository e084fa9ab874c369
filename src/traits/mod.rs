//! Trait definitions for hardware abstraction and networking.
//!
//! This module defines the core abstractions that allow relay-switch to:
//! - Run on different hardware (ESP32, desktop mock)
//! - Use different message-bus transports
//!
//! # Submodules
//!
//! - `hardware`: Relay output, status indicator, button input, clock
//! - `network`: MQTT session, network link and update-transport traits
//!
//! # Hardware Abstraction
//!
//! The key hardware traits are:
//!
//! - [`RelayOutput`]: Mains relay drive
//! - [`StatusIndicator`]: Session-health LED
//! - [`ButtonInput`]: Momentary push button
//! - [`Clock`]: Time source for `no_std` environments

pub mod hardware;
pub mod network;

pub use hardware::*;
pub use network::*;
