//! UART serial communication abstractions
//!
//! The charge-controller link is polled from a cooperative tick, so the
//! receive side is non-blocking: it hands back whatever the peripheral has
//! buffered and returns immediately. The transmit side may block, but only
//! for the few milliseconds a short frame takes to shift out.

/// Error from UART operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartError {
    /// Framing error (bad stop bit)
    Framing,
    /// Noise detected on the line
    Noise,
    /// Receive FIFO overrun
    Overrun,
    /// Parity error
    Parity,
    /// Break condition
    Break,
    /// Other error
    Other,
}

/// UART transmitter
pub trait UartTx {
    /// Write data to the UART
    ///
    /// Blocks until all data has been handed to the peripheral or an error
    /// occurs.
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), UartError>;

    /// Wait until the last byte has left the shift register
    ///
    /// Returning early here would let a half-duplex caller release the bus
    /// while the stop bit of the final byte is still on the wire.
    fn flush(&mut self) -> Result<(), UartError>;
}

/// UART receiver
pub trait UartRx {
    /// Read whatever bytes are already buffered
    ///
    /// Never waits for data. Returns `Ok(0)` when nothing has arrived.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, UartError>;
}

/// Combined UART interface
///
/// For UARTs that provide both TX and RX on a single peripheral.
pub trait Uart: UartTx + UartRx {}

// Blanket implementation
impl<T: UartTx + UartRx> Uart for T {}

/// UART configuration
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    /// EVBox controllers talk 38400 8N1
    fn default() -> Self {
        Self {
            baudrate: 38_400,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl UartConfig {
    /// Create an 8N1 configuration at the given baud rate
    pub const fn with_baudrate(baudrate: u32) -> Self {
        Self {
            baudrate,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}
