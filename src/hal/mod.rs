//! Hardware Abstraction Layer implementations.
//!
//! Concrete implementations of the traits in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `mock`: Recording stand-ins for tests and desktop development
//! - `esp32`: ESP32 relay board with a GPIO relay, status LED and push
//!   button; Wi-Fi, OTA and the ESP-IDF MQTT client behind further
//!   features (requires `esp32` feature)

pub mod mock;

#[cfg(feature = "esp32")]
pub mod esp32;

pub use mock::*;

#[cfg(feature = "esp32")]
pub use esp32::*;
