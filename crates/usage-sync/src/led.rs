use embedded_hal::digital::{OutputPin, PinState};

/// A status LED driven by a digital output.
///
/// The LED tracks its own state, so it can be toggled on outputs which
/// cannot be read back.
pub struct StatusLed<P: OutputPin> {
    pin: P,
    active_low: bool,
    on: bool,
}

impl<P: OutputPin> StatusLed<P> {
    /// Creates a [`StatusLed`] for an LED lit by a high output.
    ///
    /// The LED is assumed off until the first command.
    #[must_use]
    pub const fn new(pin: P) -> Self {
        Self {
            pin,
            active_low: false,
            on: false,
        }
    }

    /// Sets the LED as lit by a low output.
    #[must_use]
    pub const fn active_low(mut self) -> Self {
        self.active_low = true;
        self
    }

    /// Turns the LED on.
    ///
    /// # Errors
    ///
    /// Failure to drive the output.
    pub fn on(&mut self) -> Result<(), P::Error> {
        self.set_state(true)
    }

    /// Turns the LED off.
    ///
    /// # Errors
    ///
    /// Failure to drive the output.
    pub fn off(&mut self) -> Result<(), P::Error> {
        self.set_state(false)
    }

    /// Toggles the LED.
    ///
    /// # Errors
    ///
    /// Failure to drive the output.
    pub fn toggle(&mut self) -> Result<(), P::Error> {
        self.set_state(!self.on)
    }

    /// Turns the LED on or off.
    ///
    /// # Errors
    ///
    /// Failure to drive the output.
    pub fn set_state(&mut self, on: bool) -> Result<(), P::Error> {
        self.pin
            .set_state(PinState::from(on != self.active_low))?;
        self.on = on;
        Ok(())
    }

    /// Whether the LED is on.
    #[must_use]
    pub const fn is_on(&self) -> bool {
        self.on
    }
}
