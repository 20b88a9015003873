//! Output pin adapter

use embedded_hal::digital::OutputPin as EhOutputPin;
use evbox_hal::gpio::OutputPin;

/// Wraps an embedded-hal output and remembers the level last driven
///
/// embedded-hal only reads back a pin state through `&mut self`, so the
/// level is shadowed here.
pub struct EhOutput<P> {
    pin: P,
    high: bool,
}

impl<P: EhOutputPin> EhOutput<P> {
    /// Wrap `pin`, driving it low
    pub fn new(mut pin: P) -> Self {
        // RP2040 GPIO writes cannot fail
        let _ = pin.set_low();
        Self { pin, high: false }
    }
}

impl<P: EhOutputPin> OutputPin for EhOutput<P> {
    fn set_high(&mut self) {
        let _ = self.pin.set_high();
        self.high = true;
    }

    fn set_low(&mut self) {
        let _ = self.pin.set_low();
        self.high = false;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}
