//! ESP32 hardware abstraction layer for a single-relay wall switch.
//!
//! # Hardware Configuration
//!
//! - **Relay**: mains relay driven through a transistor, active high
//! - **Button**: momentary touch/push button to ground, internal pull-up
//! - **LED**: status LED to 3.3V, active low
//!
//! # Pin Assignments
//!
//! See the [`pins`] module for GPIO assignments.

mod button;
mod clock;
mod relay;

pub use button::{ButtonLevel, Esp32Button};
pub use clock::Esp32Clock;
pub use relay::{GpioRelay, StatusLed};

#[cfg(feature = "wifi")]
mod ota;
#[cfg(feature = "wifi")]
mod wifi;
#[cfg(feature = "wifi")]
pub use ota::OtaSlotGuard;
#[cfg(feature = "wifi")]
pub use wifi::Esp32Wifi;

#[cfg(feature = "esp32-mqtt")]
mod mqtt;
#[cfg(feature = "esp32-mqtt")]
pub use mqtt::{Esp32Mqtt, Esp32MqttError};

/// Pin assignments for the switch board.
pub mod pins {
    /// Push button input (active low, pulled up)
    pub const BUTTON: i32 = 0;

    /// Relay drive output (high = energised)
    pub const RELAY: i32 = 12;

    /// Status LED output (low = lit)
    pub const LED: i32 = 13;
}
