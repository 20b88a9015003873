//! Board-agnostic core logic for the EVBox driver
//!
//! This crate contains everything that does not depend on a specific
//! board or transport:
//!
//! - Configuration types, validation and the TOML subset parser
//! - Traits for the link, the component lifecycle and publishing
//! - The link state machine and the outstanding exchange
//! - The telemetry cache
//! - Error taxonomy and link statistics

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod sensor;
pub mod state;
pub mod stats;
pub mod traits;

pub use error::ExchangeError;
pub use stats::LinkStats;
