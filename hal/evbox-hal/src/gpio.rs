//! GPIO pin abstractions
//!
//! The driver only needs one digital output: the driver-enable (DE/RE)
//! line of an RS-485 transceiver. Chip HALs implement [`OutputPin`] for
//! whatever pin type they hand out.

/// Digital output pin
///
/// Implementations should handle the actual hardware register manipulation
/// for the specific chip.
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Set the pin to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the pin is currently set high
    fn is_set_high(&self) -> bool;
}

/// Output pin with configurable polarity
///
/// Transceiver boards differ in whether DE is active-high or active-low.
/// `ActiveLevel` lets the link speak in terms of "asserted" without caring
/// about the wiring.
#[derive(Debug)]
pub struct ActiveLevel<P> {
    pin: P,
    inverted: bool,
}

impl<P: OutputPin> ActiveLevel<P> {
    /// Wrap an active-high pin
    pub fn active_high(pin: P) -> Self {
        Self { pin, inverted: false }
    }

    /// Wrap an active-low pin
    pub fn active_low(pin: P) -> Self {
        Self { pin, inverted: true }
    }

    /// Wrap a pin with the given polarity
    pub fn new(pin: P, inverted: bool) -> Self {
        Self { pin, inverted }
    }

    /// Drive the pin to its active level
    pub fn assert(&mut self) {
        self.pin.set_state(!self.inverted);
    }

    /// Drive the pin to its inactive level
    pub fn deassert(&mut self) {
        self.pin.set_state(self.inverted);
    }

    /// Check if the pin is at its active level
    pub fn is_asserted(&self) -> bool {
        self.pin.is_set_high() != self.inverted
    }
}
