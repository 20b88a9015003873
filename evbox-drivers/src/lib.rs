//! Driver implementations
//!
//! This crate provides the concrete pieces behind the traits defined in
//! evbox-core:
//!
//! - RS-485 link over a HAL UART with an optional driver-enable pin
//! - The exchange state machine for an EVBox charge controller
//! - The bridge from decoded telemetry to the sensor cache and publisher
//! - The `EvBox` component that ties them together

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate std;

#[macro_use]
mod fmt;

pub mod evbox;
pub mod transport;

pub use evbox::{EvBox, SetpointStatus};
pub use transport::{NoPin, Rs485Link};
