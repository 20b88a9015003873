//! RP2040-specific HAL for the EVBox firmware
//!
//! Implements the `evbox-hal` traits on top of embassy-rp:
//!
//! - Buffered UART as a non-blocking [`evbox_hal::UartRx`] and a flushing
//!   [`evbox_hal::UartTx`]
//! - Any embedded-hal output as the RS-485 driver-enable line
//! - Config-driven pin lookup for the flow-control output

#![no_std]

pub mod gpio;
pub mod pins;
pub mod uart;

pub use gpio::EhOutput;
pub use pins::{PinBank, PinError};
pub use uart::RpUart;
