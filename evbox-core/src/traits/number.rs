//! Numeric control trait

use evbox_protocol::ValidationError;

/// A writable number with fixed bounds
pub trait NumberControl {
    /// Lowest accepted value
    fn min_value(&self) -> f32;

    /// Highest accepted value
    fn max_value(&self) -> f32;

    /// Increment between accepted values
    fn step(&self) -> f32;

    /// Request a new value
    ///
    /// Invalid values are refused synchronously and never take effect.
    fn set_value(&mut self, value: f32) -> Result<(), ValidationError>;
}
