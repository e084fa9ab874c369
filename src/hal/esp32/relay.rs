//! Relay and status LED outputs over `embedded-hal` output pins.
//!
//! Both work with any [`OutputPin`], including esp-idf-hal's
//! `PinDriver<_, Output>`.

use embedded_hal::digital::OutputPin;

use crate::traits::{RelayOutput, RelayState, StatusIndicator};

/// Relay driven by one GPIO, high = energised.
///
/// # Example
///
/// ```ignore
/// use esp_idf_hal::gpio::PinDriver;
/// use relay_switch::hal::esp32::GpioRelay;
///
/// let pin = PinDriver::output(peripherals.pins.gpio12)?;
/// let relay = GpioRelay::new(pin);
/// ```
pub struct GpioRelay<P: OutputPin> {
    pin: P,
}

impl<P: OutputPin> GpioRelay<P> {
    /// Wrap an output pin.
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Release the pin.
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> RelayOutput for GpioRelay<P> {
    type Error = P::Error;

    fn set_state(&mut self, state: RelayState) -> Result<(), P::Error> {
        match state {
            RelayState::On => self.pin.set_high(),
            RelayState::Off => self.pin.set_low(),
        }
    }
}

/// Session health LED, wired active low.
pub struct StatusLed<P: OutputPin> {
    pin: P,
    active_low: bool,
}

impl<P: OutputPin> StatusLed<P> {
    /// LED to supply, lit when the pin is low.
    pub fn active_low(pin: P) -> Self {
        Self {
            pin,
            active_low: true,
        }
    }

    /// LED to ground, lit when the pin is high.
    pub fn active_high(pin: P) -> Self {
        Self {
            pin,
            active_low: false,
        }
    }
}

impl<P: OutputPin> StatusIndicator for StatusLed<P> {
    fn set_lit(&mut self, lit: bool) {
        // best effort
        let _ = if lit != self.active_low {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
    }
}
