//! In-memory UART and pin doubles for host tests
//!
//! [`MockBus`] hands out a [`MockUart`] and a [`MockPin`] that share one
//! event log, so tests can check the order in which the driver-enable line
//! and the UART were touched.

extern crate std;

use core::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use crate::gpio::OutputPin;
use crate::uart::{UartError, UartRx, UartTx};

/// Something that happened on the mock bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    /// Driver-enable pin went high
    PinHigh,
    /// Driver-enable pin went low
    PinLow,
    /// Bytes written to the UART
    Write(Vec<u8>),
    /// UART flushed to the wire
    Flush,
}

#[derive(Debug, Default)]
struct BusState {
    events: Vec<BusEvent>,
    rx: VecDeque<u8>,
    pin_high: bool,
    fail_write: Option<UartError>,
    fail_read: Option<UartError>,
}

/// Shared mock bus
#[derive(Debug, Clone, Default)]
pub struct MockBus {
    state: Rc<RefCell<BusState>>,
}

impl MockBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// A UART attached to this bus
    pub fn uart(&self) -> MockUart {
        MockUart {
            state: Rc::clone(&self.state),
        }
    }

    /// A driver-enable pin attached to this bus
    pub fn pin(&self) -> MockPin {
        MockPin {
            state: Rc::clone(&self.state),
        }
    }

    /// Queue bytes for the UART to receive
    pub fn inject_rx(&self, data: &[u8]) {
        self.state.borrow_mut().rx.extend(data.iter().copied());
    }

    /// Make the next write fail with `error`
    pub fn fail_next_write(&self, error: UartError) {
        self.state.borrow_mut().fail_write = Some(error);
    }

    /// Make the next read fail with `error`
    pub fn fail_next_read(&self, error: UartError) {
        self.state.borrow_mut().fail_read = Some(error);
    }

    /// Everything that happened so far
    pub fn events(&self) -> Vec<BusEvent> {
        self.state.borrow().events.clone()
    }

    /// All bytes written, concatenated
    pub fn written(&self) -> Vec<u8> {
        self.state
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                BusEvent::Write(data) => Some(data.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Current level of the driver-enable pin
    pub fn pin_is_high(&self) -> bool {
        self.state.borrow().pin_high
    }

    /// Forget recorded events
    pub fn clear_events(&self) {
        self.state.borrow_mut().events.clear();
    }
}

/// Mock UART
#[derive(Debug)]
pub struct MockUart {
    state: Rc<RefCell<BusState>>,
}

impl UartTx for MockUart {
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), UartError> {
        let mut state = self.state.borrow_mut();
        if let Some(error) = state.fail_write.take() {
            return Err(error);
        }
        state.events.push(BusEvent::Write(data.to_vec()));
        Ok(())
    }

    fn flush(&mut self) -> Result<(), UartError> {
        self.state.borrow_mut().events.push(BusEvent::Flush);
        Ok(())
    }
}

impl UartRx for MockUart {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, UartError> {
        let mut state = self.state.borrow_mut();
        if let Some(error) = state.fail_read.take() {
            return Err(error);
        }
        let n = buf.len().min(state.rx.len());
        for slot in buf.iter_mut().take(n) {
            // n is bounded by rx.len()
            *slot = state.rx.pop_front().unwrap_or_default();
        }
        Ok(n)
    }
}

/// Mock output pin
#[derive(Debug)]
pub struct MockPin {
    state: Rc<RefCell<BusState>>,
}

impl OutputPin for MockPin {
    fn set_high(&mut self) {
        let mut state = self.state.borrow_mut();
        state.pin_high = true;
        state.events.push(BusEvent::PinHigh);
    }

    fn set_low(&mut self) {
        let mut state = self.state.borrow_mut();
        state.pin_high = false;
        state.events.push(BusEvent::PinLow);
    }

    fn is_set_high(&self) -> bool {
        self.state.borrow().pin_high
    }
}
