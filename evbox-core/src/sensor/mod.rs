//! Telemetry value storage

pub mod cache;

pub use cache::{CacheUpdate, SensorCache};
