//! Hardware configuration types
//!
//! These types define the pins and UART line the charge controller is
//! attached to.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Highest GPIO number on the RP2040
pub const MAX_GPIO: u8 = 29;

/// Pin configuration with optional inversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinConfig {
    /// GPIO pin number (0-29 for RP2040)
    pub pin: u8,
    /// Pin is active-low (inverted)
    pub inverted: bool,
}

impl PinConfig {
    /// Create a new pin config
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
        }
    }

    /// Create an inverted (active-low) pin
    pub const fn inverted(pin: u8) -> Self {
        Self {
            pin,
            inverted: true,
        }
    }
}

/// UART line to the charge controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UartHwConfig {
    /// TX pin (drives the transceiver's DI input)
    pub tx_pin: u8,
    /// RX pin (from the transceiver's RO output)
    pub rx_pin: u8,
    /// Baud rate
    pub baud_rate: u32,
}

impl Default for UartHwConfig {
    fn default() -> Self {
        Self {
            tx_pin: 0,
            rx_pin: 1,
            baud_rate: 38_400,
        }
    }
}
