//! Config-driven pin lookup
//!
//! The flow-control pin number comes from `evbox.toml`, but embassy hands
//! out pins as distinct types. [`PinBank`] erases them to `AnyPin` so one
//! can be taken by number at runtime.

use embassy_rp::gpio::AnyPin;
use embassy_rp::Peri;

/// Number of GPIOs on the RP2040
pub const GPIO_COUNT: usize = 30;

/// Fill a [`PinBank`] from peripherals
///
/// Usage:
/// ```ignore
/// let mut bank = pin_bank!(p, [2 => PIN_2, 3 => PIN_3]);
/// let de = bank.take(config.pin)?;
/// ```
#[macro_export]
macro_rules! pin_bank {
    ($p:expr, [$($num:literal => $pin:ident),* $(,)?]) => {{
        let mut bank = $crate::pins::PinBank::empty();
        $(
            bank.insert($num, embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.$pin));
        )*
        bank
    }};
}

/// Error when requesting a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range (0-29 valid)
    InvalidPin,
    /// Pin already taken
    AlreadyTaken,
    /// Pin never placed in the bank (e.g. routed to the UART)
    Reserved,
}

/// Pins available for runtime assignment
pub struct PinBank {
    pins: [Option<Peri<'static, AnyPin>>; GPIO_COUNT],
    taken: [bool; GPIO_COUNT],
}

impl PinBank {
    /// A bank with no pins in it
    pub fn empty() -> Self {
        Self {
            pins: [const { None }; GPIO_COUNT],
            taken: [false; GPIO_COUNT],
        }
    }

    /// Make `pin` available as GPIO `num`
    pub fn insert(&mut self, num: u8, pin: Peri<'static, AnyPin>) {
        if let Some(slot) = self.pins.get_mut(num as usize) {
            *slot = Some(pin);
        }
    }

    /// Take a pin by number
    pub fn take(&mut self, num: u8) -> Result<Peri<'static, AnyPin>, PinError> {
        let idx = num as usize;
        if idx >= GPIO_COUNT {
            return Err(PinError::InvalidPin);
        }
        if self.taken[idx] {
            return Err(PinError::AlreadyTaken);
        }
        let pin = self.pins[idx].take().ok_or(PinError::Reserved)?;
        self.taken[idx] = true;
        Ok(pin)
    }
}
