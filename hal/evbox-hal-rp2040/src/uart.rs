//! Buffered UART adapter
//!
//! The embassy buffered UART fills a ring buffer from its interrupt
//! handler, which is what lets the driver tick read without waiting.

use embassy_rp::uart::{self, BufferedUartRx, BufferedUartTx};
use embedded_io::{Read, ReadReady, Write};
use evbox_hal::uart::{DataBits, Parity, StopBits, UartConfig, UartError, UartRx, UartTx};

/// Both halves of a split buffered UART
pub struct RpUart {
    tx: BufferedUartTx,
    rx: BufferedUartRx,
}

impl RpUart {
    pub fn new(tx: BufferedUartTx, rx: BufferedUartRx) -> Self {
        Self { tx, rx }
    }
}

impl UartTx for RpUart {
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), UartError> {
        self.tx.write_all(data).map_err(map_error)
    }

    fn flush(&mut self) -> Result<(), UartError> {
        // Drains the software buffer into the FIFO
        Write::flush(&mut self.tx).map_err(map_error)?;
        // Wait for the shift register
        while self.tx.busy() {}
        Ok(())
    }
}

impl UartRx for RpUart {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, UartError> {
        if buf.is_empty() || !self.rx.read_ready().map_err(map_error)? {
            return Ok(0);
        }
        self.rx.read(buf).map_err(map_error)
    }
}

fn map_error(error: uart::Error) -> UartError {
    match error {
        uart::Error::Overrun => UartError::Overrun,
        uart::Error::Break => UartError::Break,
        uart::Error::Parity => UartError::Parity,
        uart::Error::Framing => UartError::Framing,
        _ => UartError::Other,
    }
}

/// Convert a line configuration to the embassy one
pub fn to_embassy_config(config: &UartConfig) -> uart::Config {
    let mut out = uart::Config::default();
    out.baudrate = config.baudrate;
    out.data_bits = match config.data_bits {
        DataBits::Seven => uart::DataBits::DataBits7,
        DataBits::Eight => uart::DataBits::DataBits8,
    };
    out.parity = match config.parity {
        Parity::None => uart::Parity::ParityNone,
        Parity::Even => uart::Parity::ParityEven,
        Parity::Odd => uart::Parity::ParityOdd,
    };
    out.stop_bits = match config.stop_bits {
        StopBits::One => uart::StopBits::STOP1,
        StopBits::Two => uart::StopBits::STOP2,
    };
    out
}
