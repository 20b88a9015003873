//! Byte links to the charge controller

pub mod rs485;

pub use rs485::{NoPin, Rs485Link};
