//! Exchange error taxonomy
//!
//! None of these are fatal to the driver. Framing errors are resynced,
//! transport faults and timeouts are retried, validation errors never
//! reach the wire.

use evbox_protocol::{FrameError, NakReason, ValidationError};

use crate::traits::TransportFault;

/// Why an exchange or a request failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExchangeError {
    /// UART fault on the last attempt
    Transport(TransportFault),
    /// Last attempt was answered with garbage only
    Framing(FrameError),
    /// No reply within the window on any attempt
    Timeout,
    /// Controller refused the command
    Rejected(NakReason),
    /// Request refused before transmission
    Validation(ValidationError),
}

impl From<TransportFault> for ExchangeError {
    fn from(e: TransportFault) -> Self {
        ExchangeError::Transport(e)
    }
}

impl From<FrameError> for ExchangeError {
    fn from(e: FrameError) -> Self {
        ExchangeError::Framing(e)
    }
}

impl From<ValidationError> for ExchangeError {
    fn from(e: ValidationError) -> Self {
        ExchangeError::Validation(e)
    }
}
