//! Half-duplex RS-485 link
//!
//! The transceiver's driver-enable line (DE, usually tied to /RE) is raised
//! for the duration of a frame and dropped once the UART has shifted out
//! the last stop bit. Dropping it early clips the frame; holding it too long
//! collides with the controller's reply.

use evbox_core::traits::{Link, TransportFault};
use evbox_hal::gpio::{ActiveLevel, OutputPin};
use evbox_hal::uart::Uart;

/// Placeholder pin for transceivers with automatic direction control
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPin;

impl OutputPin for NoPin {
    fn set_high(&mut self) {}

    fn set_low(&mut self) {}

    fn is_set_high(&self) -> bool {
        false
    }
}

/// Link to the charge controller over a UART and optional DE pin
pub struct Rs485Link<U, P> {
    uart: U,
    flow_control: Option<ActiveLevel<P>>,
}

impl<U: Uart> Rs485Link<U, NoPin> {
    /// Link without a direction pin
    pub fn without_flow_control(uart: U) -> Self {
        Self {
            uart,
            flow_control: None,
        }
    }
}

impl<U: Uart, P: OutputPin> Rs485Link<U, P> {
    /// Link with an optional direction pin
    pub fn new(uart: U, flow_control: Option<ActiveLevel<P>>) -> Self {
        Self { uart, flow_control }
    }

    /// Link with a direction pin; `inverted` for an active-low enable
    pub fn with_flow_control(uart: U, pin: P, inverted: bool) -> Self {
        Self::new(uart, Some(ActiveLevel::new(pin, inverted)))
    }

    /// Whether the transceiver is currently driving the bus
    pub fn is_transmitting(&self) -> bool {
        self.flow_control
            .as_ref()
            .is_some_and(|pin| pin.is_asserted())
    }

    fn write_frame(&mut self, bytes: &[u8]) -> Result<(), TransportFault> {
        self.uart.write_blocking(bytes).map_err(|e| {
            warn!("rs485: write failed: {}", e);
            TransportFault::Write
        })?;
        // Wait for the shift register, not just the FIFO
        self.uart.flush().map_err(|e| {
            warn!("rs485: flush failed: {}", e);
            TransportFault::Flush
        })
    }
}

impl<U: Uart, P: OutputPin> Link for Rs485Link<U, P> {
    fn setup(&mut self) -> Result<(), TransportFault> {
        if let Some(pin) = &mut self.flow_control {
            pin.deassert();
            debug!("rs485: flow control pin set to receive");
        }
        Ok(())
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportFault> {
        if let Some(pin) = &mut self.flow_control {
            pin.assert();
        }

        let result = self.write_frame(bytes);

        // Always hand the bus back, even after a failed write
        if let Some(pin) = &mut self.flow_control {
            pin.deassert();
        }
        result
    }

    fn poll(&mut self, buf: &mut [u8]) -> Result<usize, TransportFault> {
        self.uart.read_available(buf).map_err(|e| {
            debug!("rs485: read failed: {}", e);
            TransportFault::Read
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evbox_hal::mock::{BusEvent, MockBus};
    use evbox_hal::uart::UartError;

    #[test]
    fn test_setup_puts_line_in_receive() {
        let bus = MockBus::new();
        let mut link = Rs485Link::with_flow_control(bus.uart(), bus.pin(), false);
        link.setup().unwrap();
        assert_eq!(bus.events(), vec![BusEvent::PinLow]);
        assert!(!link.is_transmitting());
    }

    #[test]
    fn test_send_brackets_frame_with_enable() {
        let bus = MockBus::new();
        let mut link = Rs485Link::with_flow_control(bus.uart(), bus.pin(), false);
        link.send(b"\x0280A069\x03").unwrap();

        assert_eq!(
            bus.events(),
            vec![
                BusEvent::PinHigh,
                BusEvent::Write(b"\x0280A069\x03".to_vec()),
                BusEvent::Flush,
                BusEvent::PinLow,
            ]
        );
    }

    #[test]
    fn test_inverted_enable() {
        let bus = MockBus::new();
        let mut link = Rs485Link::with_flow_control(bus.uart(), bus.pin(), true);
        link.setup().unwrap();
        assert!(bus.pin_is_high());

        link.send(b"x").unwrap();
        assert_eq!(bus.events()[1], BusEvent::PinLow);
        assert!(bus.pin_is_high());
    }

    #[test]
    fn test_enable_released_after_write_failure() {
        let bus = MockBus::new();
        let mut link = Rs485Link::with_flow_control(bus.uart(), bus.pin(), false);
        bus.fail_next_write(UartError::Other);

        assert_eq!(link.send(b"abc"), Err(TransportFault::Write));
        assert_eq!(bus.events(), vec![BusEvent::PinHigh, BusEvent::PinLow]);
        assert!(!bus.pin_is_high());
    }

    #[test]
    fn test_plain_write_without_pin() {
        let bus = MockBus::new();
        let mut link = Rs485Link::without_flow_control(bus.uart());
        link.setup().unwrap();
        link.send(b"abc").unwrap();
        assert_eq!(
            bus.events(),
            vec![BusEvent::Write(b"abc".to_vec()), BusEvent::Flush]
        );
    }

    #[test]
    fn test_poll_is_non_blocking() {
        let bus = MockBus::new();
        let mut link = Rs485Link::without_flow_control(bus.uart());
        let mut buf = [0u8; 8];
        assert_eq!(link.poll(&mut buf), Ok(0));

        bus.inject_rx(b"hello");
        assert_eq!(link.poll(&mut buf), Ok(5));
        assert_eq!(&buf[..5], b"hello");

        bus.fail_next_read(UartError::Overrun);
        assert_eq!(link.poll(&mut buf), Err(TransportFault::Read));
    }
}
