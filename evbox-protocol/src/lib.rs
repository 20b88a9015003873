//! EVBox Charge Controller Protocol
//!
//! This crate defines the serial protocol spoken between a bus master (the
//! firmware) and an EVBox charge controller over half-duplex RS-485. The
//! master sends a charge current limit; the controller answers with a
//! status report carrying the phase currents and the energy meter.
//!
//! # Protocol Overview
//!
//! Frames are ASCII hex between two control bytes:
//! ```text
//! ┌─────┬─────┬─────┬─────┬──────────────┬─────┬─────┬─────┐
//! │ STX │ SRC │ DST │ TAG │ PAYLOAD      │ SUM │ XOR │ ETX │
//! │ 1B  │ 2C  │ 2C  │ 2C  │ 2C per byte  │ 2C  │ 2C  │ 1B  │
//! └─────┴─────┴─────┴─────┴──────────────┴─────┴─────┴─────┘
//! ```
//!
//! Payload length is fixed per sender and tag, so a known frame is
//! recognised from its header alone. The master sends `80A069` followed by
//! the limit in tenths of an amp for each phase; the controller replies
//! with `A08069` and a 23-byte status payload. Decoding is resumable: partial frames wait for more bytes
//! and garbage is skipped one byte at a time.

#![no_std]
#![deny(unsafe_code)]

pub mod buffer;
pub mod codec;
pub mod frame;
pub mod messages;

pub use buffer::{RxBuffer, RX_BUFFER_SIZE};
pub use codec::{encode, try_decode, Decoded};
pub use frame::{
    Frame, FrameError, RawFrame, ADDR_CONTROLLER, ADDR_MASTER, ETX, MAX_FRAME_SIZE,
    MAX_PAYLOAD_SIZE, STX,
};
pub use messages::{
    ChargeCurrent, CommandFrame, CurrentReading, EnergyReading, NakReason, RawField,
    StatusReport, TelemetryFrame, ValidationError, MAX_CHARGE_CURRENT, MIN_CHARGE_CURRENT,
};
