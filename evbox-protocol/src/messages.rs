//! Message types for the EVBox protocol
//!
//! Both directions share one tag:
//! - Master → Controller: the current limit, repeated for all three phases
//! - Controller → Master: a status report with phase currents and the meter
//!
//! Acknowledgements and rejections are accepted as well, for controllers
//! that send them.

use crate::frame::{write_hex, Frame, FrameError, ADDR_CONTROLLER, ADDR_MASTER, MAX_PAYLOAD_SIZE};
use heapless::Vec;

/// Current limit from the master, status report from the controller
pub const TAG_SET_CURRENT_LIMIT: u8 = 0x69;
pub const TAG_ACK: u8 = 0x06;
pub const TAG_NAK: u8 = 0x15;

/// Three phase limits and four timeout fields
pub const SET_CURRENT_PAYLOAD_LEN: usize = 14;

/// Status report payload
pub const STATUS_PAYLOAD_LEN: usize = 23;

/// Value of the four trailing fields of a current limit command
const LIMIT_TRAILER: u16 = 0x003C;

// Status report field offsets, in payload bytes
const L1_OFFSET: usize = 7;
const L2_OFFSET: usize = 9;
const L3_OFFSET: usize = 11;
const ENERGY_OFFSET: usize = 19;

/// Lowest charge current the controller accepts, in amps
pub const MIN_CHARGE_CURRENT: u8 = 9;

/// Highest charge current the controller accepts, in amps
pub const MAX_CHARGE_CURRENT: u8 = 32;

/// Hex characters of one reading as they appeared on the wire
pub type RawField = Vec<u8, 8>;

/// Payload length in bytes for every sender and tag with a fixed layout
///
/// Anything else returns `None` and is delimited by ETX alone.
pub const fn payload_len(src: u8, tag: u8) -> Option<usize> {
    match (src, tag) {
        (ADDR_MASTER, TAG_SET_CURRENT_LIMIT) => Some(SET_CURRENT_PAYLOAD_LEN),
        (ADDR_CONTROLLER, TAG_SET_CURRENT_LIMIT) => Some(STATUS_PAYLOAD_LEN),
        (_, TAG_ACK) => Some(1),
        (_, TAG_NAK) => Some(2),
        _ => None,
    }
}

/// Reasons a charge current is refused before it reaches the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValidationError {
    /// Outside the controller's 9..=32 A range
    OutOfRange,
    /// Not a whole number of amps, or between configured steps
    NotInteger,
}

/// A validated charge current limit in whole amps
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChargeCurrent(u8);

impl ChargeCurrent {
    /// Validate a whole-amp value
    pub const fn new(amps: u8) -> Result<Self, ValidationError> {
        if amps < MIN_CHARGE_CURRENT || amps > MAX_CHARGE_CURRENT {
            return Err(ValidationError::OutOfRange);
        }
        Ok(Self(amps))
    }

    /// Validate a value coming from a numeric control
    pub fn from_f32(value: f32) -> Result<Self, ValidationError> {
        if value.is_nan() {
            return Err(ValidationError::NotInteger);
        }
        if value < MIN_CHARGE_CURRENT as f32 || value > MAX_CHARGE_CURRENT as f32 {
            return Err(ValidationError::OutOfRange);
        }
        let whole = value as u8;
        if whole as f32 != value {
            return Err(ValidationError::NotInteger);
        }
        Self::new(whole)
    }

    /// Validate a value in tenths of an amp, as carried on the wire
    pub fn from_deci_amps(deci_amps: u16) -> Result<Self, ValidationError> {
        if deci_amps % 10 != 0 {
            return Err(ValidationError::NotInteger);
        }
        let amps = u8::try_from(deci_amps / 10).map_err(|_| ValidationError::OutOfRange)?;
        Self::new(amps)
    }

    /// Current in whole amps
    pub const fn amps(self) -> u8 {
        self.0
    }

    /// Current in tenths of an amp
    pub const fn deci_amps(self) -> u16 {
        self.0 as u16 * 10
    }
}

/// Why the controller rejected a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NakReason {
    /// Controller saw a corrupted frame
    Checksum,
    /// Controller refused the value
    Rejected,
    /// Controller is busy; try again
    Busy,
    /// Reason code we do not know
    Other(u8),
}

impl NakReason {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x01 => NakReason::Checksum,
            0x02 => NakReason::Rejected,
            0x03 => NakReason::Busy,
            other => NakReason::Other(other),
        }
    }

    pub fn to_code(self) -> u8 {
        match self {
            NakReason::Checksum => 0x01,
            NakReason::Rejected => 0x02,
            NakReason::Busy => 0x03,
            NakReason::Other(code) => code,
        }
    }

    /// Whether resending the same command can succeed
    pub fn is_retryable(self) -> bool {
        matches!(self, NakReason::Checksum | NakReason::Busy)
    }
}

/// Commands sent by the master
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandFrame {
    /// Set the maximum charge current on all three phases
    SetCurrentLimit(ChargeCurrent),
}

impl CommandFrame {
    /// Tag this command is sent with
    pub fn tag(&self) -> u8 {
        match self {
            CommandFrame::SetCurrentLimit(_) => TAG_SET_CURRENT_LIMIT,
        }
    }

    /// Encode this command into a frame addressed to the controller
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match self {
            CommandFrame::SetCurrentLimit(current) => {
                let mut payload = [0u8; SET_CURRENT_PAYLOAD_LEN];
                let (phases, trailer) = payload.split_at_mut(6);
                for field in phases.chunks_exact_mut(2) {
                    field.copy_from_slice(&current.deci_amps().to_be_bytes());
                }
                for field in trailer.chunks_exact_mut(2) {
                    field.copy_from_slice(&LIMIT_TRAILER.to_be_bytes());
                }
                Frame::new(ADDR_MASTER, ADDR_CONTROLLER, TAG_SET_CURRENT_LIMIT, &payload)
            }
        }
    }

    /// Parse a command from a frame
    ///
    /// The three phase limits must agree; this driver never sends them apart.
    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        if frame.tag != TAG_SET_CURRENT_LIMIT || frame.payload.len() != SET_CURRENT_PAYLOAD_LEN {
            return Err(FrameError::InvalidPayload);
        }
        let l1 = read_u16(&frame.payload, 0)?;
        if read_u16(&frame.payload, 2)? != l1 || read_u16(&frame.payload, 4)? != l1 {
            return Err(FrameError::InvalidPayload);
        }
        let current = ChargeCurrent::from_deci_amps(l1).map_err(|_| FrameError::InvalidPayload)?;
        Ok(CommandFrame::SetCurrentLimit(current))
    }
}

/// A phase current reading
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CurrentReading {
    /// Current in tenths of an amp
    pub deci_amps: u16,
    /// Field characters as received
    pub raw: RawField,
}

impl CurrentReading {
    /// Current in amps
    pub fn amps(&self) -> f32 {
        self.deci_amps as f32 * 0.1
    }
}

/// An energy meter reading
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EnergyReading {
    /// Meter value in watt-hours
    pub watt_hours: u32,
    /// Field characters as received
    pub raw: RawField,
}

impl EnergyReading {
    /// Meter value in kilowatt-hours
    pub fn kilowatt_hours(&self) -> f32 {
        // Split so large meter values keep their fractional part in f32
        (self.watt_hours / 1000) as f32 + (self.watt_hours % 1000) as f32 * 0.001
    }
}

/// Periodic status report from the controller
///
/// Only the phase currents and the meter are interpreted; the rest of the
/// payload is kept as received.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusReport {
    pub l1: CurrentReading,
    pub l2: CurrentReading,
    pub l3: CurrentReading,
    pub energy: EnergyReading,
    pub payload: Vec<u8, STATUS_PAYLOAD_LEN>,
}

impl StatusReport {
    /// Build a report with the given readings and every other field zero
    pub fn new(l1: u16, l2: u16, l3: u16, watt_hours: u32) -> Self {
        let mut payload = [0u8; STATUS_PAYLOAD_LEN];
        payload[L1_OFFSET..L1_OFFSET + 2].copy_from_slice(&l1.to_be_bytes());
        payload[L2_OFFSET..L2_OFFSET + 2].copy_from_slice(&l2.to_be_bytes());
        payload[L3_OFFSET..L3_OFFSET + 2].copy_from_slice(&l3.to_be_bytes());
        payload[ENERGY_OFFSET..].copy_from_slice(&watt_hours.to_be_bytes());
        let current = |deci_amps: u16, at: usize| CurrentReading {
            deci_amps,
            raw: raw_field(&payload[at..at + 2]),
        };
        Self {
            l1: current(l1, L1_OFFSET),
            l2: current(l2, L2_OFFSET),
            l3: current(l3, L3_OFFSET),
            energy: EnergyReading {
                watt_hours,
                raw: raw_field(&payload[ENERGY_OFFSET..]),
            },
            // Exactly STATUS_PAYLOAD_LEN bytes
            payload: Vec::from_slice(&payload).unwrap_or_default(),
        }
    }

    /// Parse a status payload
    pub fn from_payload(payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() != STATUS_PAYLOAD_LEN {
            return Err(FrameError::InvalidPayload);
        }
        let current = |at: usize| -> Result<CurrentReading, FrameError> {
            Ok(CurrentReading {
                deci_amps: read_u16(payload, at)?,
                raw: raw_field(&payload[at..at + 2]),
            })
        };
        Ok(Self {
            l1: current(L1_OFFSET)?,
            l2: current(L2_OFFSET)?,
            l3: current(L3_OFFSET)?,
            energy: EnergyReading {
                watt_hours: read_u32(payload, ENERGY_OFFSET)?,
                raw: raw_field(&payload[ENERGY_OFFSET..ENERGY_OFFSET + 4]),
            },
            payload: Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLarge)?,
        })
    }

    /// The four readings, in publishing order
    pub fn readings(&self) -> [TelemetryFrame; 4] {
        [
            TelemetryFrame::L1Current(self.l1.clone()),
            TelemetryFrame::L2Current(self.l2.clone()),
            TelemetryFrame::L3Current(self.l3.clone()),
            TelemetryFrame::TotalEnergy(self.energy.clone()),
        ]
    }
}

/// Frames sent by the controller
///
/// The per-phase variants are split out of a [`StatusReport`]; the
/// controller never sends them on their own.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TelemetryFrame {
    L1Current(CurrentReading),
    L2Current(CurrentReading),
    L3Current(CurrentReading),
    TotalEnergy(EnergyReading),
    Status(StatusReport),
    /// Command with this tag was accepted
    Ack { tag: u8 },
    /// Command with this tag was refused
    Nak { tag: u8, reason: NakReason },
    /// Valid frame with a tag we do not interpret
    Unknown { tag: u8, payload: Vec<u8, MAX_PAYLOAD_SIZE> },
}

impl TelemetryFrame {
    /// Parse a controller frame
    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        match frame.tag {
            TAG_SET_CURRENT_LIMIT => {
                StatusReport::from_payload(&frame.payload).map(TelemetryFrame::Status)
            }
            TAG_ACK => match frame.payload.as_slice() {
                [tag] => Ok(TelemetryFrame::Ack { tag: *tag }),
                _ => Err(FrameError::InvalidPayload),
            },
            TAG_NAK => match frame.payload.as_slice() {
                [tag, code] => Ok(TelemetryFrame::Nak {
                    tag: *tag,
                    reason: NakReason::from_code(*code),
                }),
                _ => Err(FrameError::InvalidPayload),
            },
            tag => Ok(TelemetryFrame::Unknown {
                tag,
                payload: frame.payload.clone(),
            }),
        }
    }

    /// Encode this reply into a frame addressed to the master
    ///
    /// Used by bus simulators and tests; the driver never sends these. A
    /// single reading has no frame of its own.
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        let reply = |tag, payload: &[u8]| Frame::new(ADDR_CONTROLLER, ADDR_MASTER, tag, payload);
        match self {
            TelemetryFrame::Status(report) => reply(TAG_SET_CURRENT_LIMIT, &report.payload),
            TelemetryFrame::Ack { tag } => reply(TAG_ACK, &[*tag]),
            TelemetryFrame::Nak { tag, reason } => reply(TAG_NAK, &[*tag, reason.to_code()]),
            TelemetryFrame::Unknown { tag, payload } => reply(*tag, payload),
            TelemetryFrame::L1Current(_)
            | TelemetryFrame::L2Current(_)
            | TelemetryFrame::L3Current(_)
            | TelemetryFrame::TotalEnergy(_) => Err(FrameError::InvalidPayload),
        }
    }

    /// Whether this frame answers the command sent with `tag`
    ///
    /// A current limit is answered by its acknowledgement or rejection, or
    /// by the status report the controller sends back.
    pub fn answers(&self, tag: u8) -> bool {
        match self {
            TelemetryFrame::Ack { tag: t } | TelemetryFrame::Nak { tag: t, .. } => *t == tag,
            TelemetryFrame::Status(_) => tag == TAG_SET_CURRENT_LIMIT,
            _ => false,
        }
    }
}

fn raw_field(bytes: &[u8]) -> RawField {
    let mut raw = RawField::new();
    for byte in bytes {
        let mut pair = [0u8; 2];
        write_hex(&mut pair, *byte);
        // At most four bytes per field, which fits
        let _ = raw.extend_from_slice(&pair);
    }
    raw
}

fn read_u16(payload: &[u8], at: usize) -> Result<u16, FrameError> {
    match payload.get(at..at + 2) {
        Some([hi, lo]) => Ok(u16::from_be_bytes([*hi, *lo])),
        _ => Err(FrameError::InvalidPayload),
    }
}

fn read_u32(payload: &[u8], at: usize) -> Result<u32, FrameError> {
    let bytes: [u8; 4] = payload
        .get(at..at + 4)
        .and_then(|b| b.try_into().ok())
        .ok_or(FrameError::InvalidPayload)?;
    Ok(u32::from_be_bytes(bytes))
}
