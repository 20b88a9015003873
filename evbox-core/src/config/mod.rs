//! Configuration types
//!
//! Board-agnostic configuration structures and the TOML subset they are
//! read from.

pub mod hardware;
pub mod parse;
pub mod types;

pub use hardware::*;
pub use parse::parse_config;
pub use types::*;
