//! Serial link trait
//!
//! This trait abstracts the half-duplex line to the charge controller. The
//! RS-485 transport in `evbox-drivers` implements it over the HAL UART and
//! an optional direction pin; tests implement it with a scripted bus.

/// Hardware faults on the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportFault {
    /// Writing bytes to the UART failed
    Write,
    /// Waiting for the transmitter to drain failed
    Flush,
    /// Reading received bytes failed (framing, parity, overrun...)
    Read,
}

/// Trait for the byte link to one controller
pub trait Link {
    /// Put the line into its idle (receive) state
    ///
    /// Called once before the first exchange.
    fn setup(&mut self) -> Result<(), TransportFault>;

    /// Transmit a complete frame
    ///
    /// Returns once the last byte has left the UART. Implementations must
    /// release the bus even when the write fails.
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportFault>;

    /// Copy bytes received since the last call into `buf`
    ///
    /// Never blocks; returns 0 when nothing is pending.
    fn poll(&mut self, buf: &mut [u8]) -> Result<usize, TransportFault>;
}
