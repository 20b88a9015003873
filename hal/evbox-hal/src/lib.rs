//! EVBox Hardware Abstraction Layer
//!
//! This crate defines the hardware traits the charge-controller driver is
//! written against. Chip-specific crates (currently `evbox-hal-rp2040`)
//! implement them, which keeps the protocol engine testable on the host.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  evbox-drivers (RS-485 link, EVBox)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  evbox-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ evbox-hal-    │       │  mock (host   │
//! │    rp2040     │       │   tests)      │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`] - Digital output (RS-485 driver enable)
//! - [`uart::UartTx`], [`uart::UartRx`] - Serial communication

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod uart;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export key traits at crate root for convenience
pub use gpio::OutputPin;
pub use uart::{Uart, UartConfig, UartError, UartRx, UartTx};
