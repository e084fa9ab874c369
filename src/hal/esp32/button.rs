//! Interrupt-driven push button for ESP32.
//!
//! The pin is configured with an internal pull-up and an any-edge
//! interrupt. The handler reads the pin level through [`ButtonLevel`] and
//! the boot timer and runs [`PressClassifier::handle_input`], which may
//! toggle the shared [`DesiredState`]. Nothing else happens in interrupt
//! context.
//!
//! ESP-IDF disables a GPIO interrupt before running the handler. The
//! handler re-enables it as its last step so the release edge of a press
//! is seen even while the control loop is busy; the loop also re-arms it
//! every tick through the [`UpdateService`] hook in case that failed.
//!
//! # Wiring
//!
//! - Button → GPIO0 and GND (active low)

use esp_idf_hal::gpio::{Input, InputPin, InterruptType, OutputPin, PinDriver, Pull};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::sys::EspError;

use super::Esp32Clock;
use crate::config::TimingConfig;
use crate::press::PressClassifier;
use crate::state::DesiredState;
use crate::traits::{ButtonInput, Clock, Edge, UpdateService};

/// Momentary button feeding the press classifier from its edge interrupt.
///
/// # Example
///
/// ```ignore
/// use relay_switch::hal::esp32::Esp32Button;
/// use relay_switch::{DesiredState, RelayState};
///
/// static DESIRED: DesiredState = DesiredState::new(RelayState::Off);
///
/// let button = Esp32Button::new(peripherals.pins.gpio0, &config.timing, &DESIRED)?;
/// ```
pub struct Esp32Button<'d, P>
where
    P: InputPin + OutputPin,
{
    driver: PinDriver<'d, P, Input>,
}

impl<'d, P> Esp32Button<'d, P>
where
    P: InputPin + OutputPin,
{
    /// Configure the pin and install the edge handler.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO or interrupt setup fails.
    pub fn new(
        pin: impl Peripheral<P = P> + 'd,
        timing: &TimingConfig,
        desired: &'static DesiredState,
    ) -> Result<Self, EspError> {
        let mut driver = PinDriver::input(pin)?;
        driver.set_pull(Pull::Up)?;
        driver.set_interrupt_type(InterruptType::AnyEdge)?;

        let gpio = driver.pin();
        let level = ButtonLevel::active_low(gpio);
        let clock = Esp32Clock::new();
        let mut classifier = PressClassifier::new(timing);

        let on_edge = move || {
            classifier.handle_input(&level, clock.now_ms(), desired);
            // Safe: re-enabling the pin's own interrupt, ISR safe
            unsafe { esp_idf_hal::sys::gpio_intr_enable(gpio) };
        };

        // Safe: the handler only captures 'static and Copy data and does
        // constant-time, non-blocking work
        unsafe {
            driver.subscribe(on_edge)?;
        }
        driver.enable_interrupt()?;

        Ok(Self { driver })
    }

    /// Re-enable the edge interrupt.
    pub fn rearm(&mut self) -> Result<(), EspError> {
        self.driver.enable_interrupt()
    }
}

/// Raw level read of a button pin by number, usable from the interrupt
/// handler where the pin driver is out of reach.
#[derive(Clone, Copy, Debug)]
pub struct ButtonLevel {
    gpio: i32,
    active_low: bool,
}

impl ButtonLevel {
    /// Button to ground with a pull-up.
    pub const fn active_low(gpio: i32) -> Self {
        Self {
            gpio,
            active_low: true,
        }
    }
}

impl ButtonInput for ButtonLevel {
    fn is_pressed(&self) -> bool {
        // Safe: level read of a configured input, ISR safe
        let level_high = unsafe { esp_idf_hal::sys::gpio_get_level(self.gpio) } != 0;
        Edge::from_level(level_high, self.active_low) == Edge::Pressed
    }
}

impl<P> UpdateService for Esp32Button<'_, P>
where
    P: InputPin + OutputPin,
{
    fn service(&mut self) {
        if let Err(e) = self.rearm() {
            log::warn!("button interrupt re-arm failed: {:?}", e);
        }
    }
}
