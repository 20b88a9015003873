//! Frame encoding and decoding for the EVBox serial protocol.
//!
//! Frame format (everything between STX and ETX is uppercase ASCII hex):
//! - STX (1 byte): 0x02
//! - SRC (2 chars): sender address
//! - DST (2 chars): receiver address
//! - TAG (2 chars): message type identifier
//! - PAYLOAD (2 chars per byte): type-specific data, length fixed per
//!   sender and tag
//! - SUM (2 chars): 8-bit wrapping sum of every body character (SRC..PAYLOAD)
//! - XOR (2 chars): 8-bit XOR of every body character
//! - ETX (1 byte): 0x03
//!
//! Hex digits can never be STX or ETX, so a receiver that loses sync can
//! always find the next frame boundary again.

use heapless::Vec;

use crate::messages::payload_len;

/// Start-of-frame byte
pub const STX: u8 = 0x02;

/// End-of-frame byte
pub const ETX: u8 = 0x03;

/// Address of the bus master (this driver)
pub const ADDR_MASTER: u8 = 0x80;

/// Address of the charge controller
pub const ADDR_CONTROLLER: u8 = 0xA0;

/// Maximum payload size in bytes (before hex expansion), the status reply
pub const MAX_PAYLOAD_SIZE: usize = 23;

/// SRC + DST + TAG characters
const HEADER_CHARS: usize = 6;

/// SUM + XOR characters
const CHECKSUM_CHARS: usize = 4;

/// Length of a frame with an empty payload, and the shortest possible frame
pub const MIN_FRAME_SIZE: usize = 1 + HEADER_CHARS + CHECKSUM_CHARS + 1;

/// Maximum complete frame size
pub const MAX_FRAME_SIZE: usize = frame_len(MAX_PAYLOAD_SIZE);

/// Raw bytes of one frame as it appeared on the wire
pub type RawFrame = Vec<u8, MAX_FRAME_SIZE>;

const HEX_CHARS: [u8; 16] = *b"0123456789ABCDEF";

/// Total on-wire length of a frame carrying `payload_len` bytes
pub const fn frame_len(payload_len: usize) -> usize {
    MIN_FRAME_SIZE + 2 * payload_len
}

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Byte at the head of the buffer is not STX
    MissingStart,
    /// Non-hex character inside the frame body
    InvalidHex,
    /// ETX missing where the tag says the frame ends
    InvalidLength,
    /// Checksum mismatch
    InvalidChecksum,
    /// Frame is well formed but its payload makes no sense for its tag
    InvalidPayload,
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    /// Source address
    pub src: u8,
    /// Destination address
    pub dst: u8,
    /// Message type identifier
    pub tag: u8,
    /// Payload data (decoded from hex)
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Create a new frame
    pub fn new(src: u8, dst: u8, tag: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let payload = Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self {
            src,
            dst,
            tag,
            payload,
        })
    }

    /// Length of this frame on the wire
    pub fn encoded_len(&self) -> usize {
        frame_len(self.payload.len())
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let frame_len = self.encoded_len();
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        buffer[0] = STX;
        let mut pos = 1;
        for byte in [self.src, self.dst, self.tag]
            .iter()
            .chain(self.payload.iter())
        {
            write_hex(&mut buffer[pos..pos + 2], *byte);
            pos += 2;
        }

        let (sum, xor) = checksum(&buffer[1..pos]);
        write_hex(&mut buffer[pos..pos + 2], sum);
        write_hex(&mut buffer[pos + 2..pos + 4], xor);
        buffer[pos + 4] = ETX;

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<RawFrame, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| FrameError::BufferTooSmall)
    }
}

/// Sum and XOR checksum over the body characters
pub fn checksum(body: &[u8]) -> (u8, u8) {
    body.iter()
        .fold((0u8, 0u8), |(sum, xor), &c| (sum.wrapping_add(c), xor ^ c))
}

/// Outcome of one decode attempt at the head of a buffer
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameDecode {
    /// A complete, checksum-valid frame
    Frame(Frame),
    /// The buffer holds the start of a frame; wait for more bytes
    Incomplete,
    /// The head of the buffer cannot start a valid frame
    Invalid(FrameError),
}

/// Try to decode one frame at the start of `buf`
///
/// Returns the outcome and the number of bytes it consumed:
/// - a frame consumes exactly its own length
/// - `Incomplete` consumes nothing
/// - `Invalid` consumes exactly one byte, so the caller re-scans from the
///   next byte and never loses a valid frame that follows garbage
pub fn try_decode_frame(buf: &[u8]) -> (FrameDecode, usize) {
    match decode_at_head(buf) {
        Ok(Some((frame, len))) => (FrameDecode::Frame(frame), len),
        Ok(None) => (FrameDecode::Incomplete, 0),
        Err(e) => (FrameDecode::Invalid(e), 1),
    }
}

fn decode_at_head(buf: &[u8]) -> Result<Option<(Frame, usize)>, FrameError> {
    let Some(&first) = buf.first() else {
        return Ok(None);
    };
    if first != STX {
        return Err(FrameError::MissingStart);
    }

    let header_end = 1 + HEADER_CHARS;
    if buf.len() < header_end {
        check_hex(&buf[1..])?;
        return Ok(None);
    }

    check_hex(&buf[1..header_end])?;
    let src = parse_hex(&buf[1..3])?;
    let tag = parse_hex(&buf[5..7])?;
    let len = match payload_len(src, tag) {
        Some(payload) => frame_len(payload),
        None => match find_unknown_frame_end(buf)? {
            Some(len) => len,
            None => return Ok(None),
        },
    };

    if buf.len() < len {
        // Reject early if what we have so far cannot be part of a frame
        check_hex(&buf[1..])?;
        return Ok(None);
    }

    let raw = &buf[..len];
    let body_end = len - 1 - CHECKSUM_CHARS;
    check_hex(&raw[1..len - 1])?;
    if raw[len - 1] != ETX {
        return Err(FrameError::InvalidLength);
    }

    let (sum, xor) = checksum(&raw[1..body_end]);
    let sent_sum = parse_hex(&raw[body_end..body_end + 2])?;
    let sent_xor = parse_hex(&raw[body_end + 2..body_end + 4])?;
    if sum != sent_sum || xor != sent_xor {
        return Err(FrameError::InvalidChecksum);
    }

    let mut payload = Vec::new();
    for pair in raw[header_end..body_end].chunks_exact(2) {
        payload
            .push(parse_hex(pair)?)
            .map_err(|_| FrameError::PayloadTooLarge)?;
    }

    let frame = Frame {
        src,
        dst: parse_hex(&raw[3..5])?,
        tag,
        payload,
    };
    Ok(Some((frame, len)))
}

/// Locate the ETX of a frame whose tag we do not know
///
/// Returns the frame length, `None` if more bytes are needed, or an error
/// once the search window is exhausted.
fn find_unknown_frame_end(buf: &[u8]) -> Result<Option<usize>, FrameError> {
    let window = &buf[..buf.len().min(MAX_FRAME_SIZE)];
    match window.iter().skip(1).position(|&b| b == ETX) {
        Some(pos) => {
            let len = pos + 2;
            let body = len.saturating_sub(2 + CHECKSUM_CHARS);
            if len < MIN_FRAME_SIZE || body % 2 != 0 {
                return Err(FrameError::InvalidLength);
            }
            Ok(Some(len))
        }
        None if window.len() < MAX_FRAME_SIZE => {
            check_hex(&window[1..])?;
            Ok(None)
        }
        None => Err(FrameError::InvalidLength),
    }
}

fn check_hex(chars: &[u8]) -> Result<(), FrameError> {
    if chars.iter().all(|&c| hex_value(c).is_some()) {
        Ok(())
    } else {
        Err(FrameError::InvalidHex)
    }
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

fn parse_hex(pair: &[u8]) -> Result<u8, FrameError> {
    match pair {
        [hi, lo] => match (hex_value(*hi), hex_value(*lo)) {
            (Some(hi), Some(lo)) => Ok((hi << 4) | lo),
            _ => Err(FrameError::InvalidHex),
        },
        _ => Err(FrameError::InvalidLength),
    }
}

pub(crate) fn write_hex(out: &mut [u8], byte: u8) {
    out[0] = HEX_CHARS[(byte >> 4) as usize];
    out[1] = HEX_CHARS[(byte & 0x0F) as usize];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{TAG_ACK, TAG_SET_CURRENT_LIMIT};

    /// Status reply captured from a controller: 16.0 / 15.9 / 16.1 A, 123.456 kWh
    const STATUS_REPLY: &[u8] =
        b"\x02A08069023E00E600E60000A0009F00A10010002000300001E2409C0E\x03";

    #[test]
    fn test_frame_encode_empty_payload() {
        let frame = Frame::new(ADDR_CONTROLLER, ADDR_MASTER, 0x42, &[]).unwrap();
        let mut buffer = [0u8; 16];
        let len = frame.encode(&mut buffer).unwrap();

        assert_eq!(len, MIN_FRAME_SIZE);
        assert_eq!(buffer[0], STX);
        assert_eq!(&buffer[1..7], b"A08042");
        assert_eq!(buffer[11], ETX);
    }

    #[test]
    fn test_checksum_matches_evbox_scheme() {
        // Sum and xor over the ASCII characters, not the decoded bytes
        let (sum, xor) = checksum(b"80A06900A000A000A0003C003C003C003C");
        assert_eq!((sum, xor), (0x13, 0x07));
    }

    #[test]
    fn test_decode_controller_status() {
        let (decoded, used) = try_decode_frame(STATUS_REPLY);
        assert_eq!(used, STATUS_REPLY.len());
        assert_eq!(used, MAX_FRAME_SIZE);
        match decoded {
            FrameDecode::Frame(frame) => {
                assert_eq!(frame.src, ADDR_CONTROLLER);
                assert_eq!(frame.dst, ADDR_MASTER);
                assert_eq!(frame.tag, TAG_SET_CURRENT_LIMIT);
                assert_eq!(frame.payload.len(), MAX_PAYLOAD_SIZE);
                assert_eq!(&frame.payload[7..9], &[0x00, 0xA0]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_frame_roundtrip() {
        let payload = [
            0x00, 0xA0, 0x00, 0xA0, 0x00, 0xA0, 0x00, 0x3C, 0x00, 0x3C, 0x00, 0x3C, 0x00, 0x3C,
        ];
        let frame =
            Frame::new(ADDR_MASTER, ADDR_CONTROLLER, TAG_SET_CURRENT_LIMIT, &payload).unwrap();
        let encoded = frame.encode_to_vec().unwrap();

        let (decoded, used) = try_decode_frame(&encoded);
        assert_eq!(used, encoded.len());
        assert_eq!(decoded, FrameDecode::Frame(frame));
    }

    #[test]
    fn test_sender_decides_payload_length() {
        // Same tag, but a master frame is 14 bytes and a controller frame 23
        let mut bytes = STATUS_REPLY.to_vec();
        bytes[1..5].copy_from_slice(b"80A0");
        let (decoded, used) = try_decode_frame(&bytes);
        assert_eq!(decoded, FrameDecode::Invalid(FrameError::InvalidLength));
        assert_eq!(used, 1);
    }

    #[test]
    fn test_incomplete_frame_consumes_nothing() {
        for cut in 1..STATUS_REPLY.len() {
            let (decoded, used) = try_decode_frame(&STATUS_REPLY[..cut]);
            assert_eq!(decoded, FrameDecode::Incomplete, "cut at {}", cut);
            assert_eq!(used, 0);
        }
    }

    #[test]
    fn test_parser_invalid_checksum() {
        let frame = Frame::new(ADDR_CONTROLLER, ADDR_MASTER, TAG_ACK, &[0x69]).unwrap();
        let mut encoded = frame.encode_to_vec().unwrap();
        // Corrupt the xor checksum, keeping it a hex digit
        let idx = encoded.len() - 2;
        encoded[idx] = if encoded[idx] == b'0' { b'1' } else { b'0' };

        let (decoded, used) = try_decode_frame(&encoded);
        assert_eq!(decoded, FrameDecode::Invalid(FrameError::InvalidChecksum));
        assert_eq!(used, 1);
    }

    #[test]
    fn test_garbage_byte_consumes_one() {
        let (decoded, used) = try_decode_frame(&[0x00, STX, b'A']);
        assert_eq!(decoded, FrameDecode::Invalid(FrameError::MissingStart));
        assert_eq!(used, 1);
    }

    #[test]
    fn test_stray_start_followed_by_frame_resyncs() {
        let frame = Frame::new(ADDR_CONTROLLER, ADDR_MASTER, TAG_ACK, &[0x69]).unwrap();
        let encoded = frame.encode_to_vec().unwrap();

        let mut data = Vec::<u8, 32>::new();
        data.push(STX).unwrap();
        data.extend_from_slice(&encoded).unwrap();

        let (decoded, used) = try_decode_frame(&data);
        assert_eq!(decoded, FrameDecode::Invalid(FrameError::InvalidHex));
        assert_eq!(used, 1);

        let (decoded, used) = try_decode_frame(&data[1..]);
        assert_eq!(decoded, FrameDecode::Frame(frame));
        assert_eq!(used, encoded.len());
    }

    #[test]
    fn test_missing_etx_is_length_error() {
        let mut encoded = STATUS_REPLY.to_vec();
        let last = encoded.len() - 1;
        encoded[last] = b'0';

        let (decoded, used) = try_decode_frame(&encoded);
        assert_eq!(decoded, FrameDecode::Invalid(FrameError::InvalidLength));
        assert_eq!(used, 1);
    }

    #[test]
    fn test_unknown_tag_is_delimited_by_etx() {
        let frame = Frame::new(ADDR_CONTROLLER, ADDR_MASTER, 0x42, &[1, 2, 3]).unwrap();
        let encoded = frame.encode_to_vec().unwrap();

        let (decoded, used) = try_decode_frame(&encoded);
        assert_eq!(decoded, FrameDecode::Frame(frame));
        assert_eq!(used, encoded.len());
    }

    #[test]
    fn test_lowercase_hex_rejected() {
        let (decoded, used) = try_decode_frame(b"\x02a08069");
        assert_eq!(decoded, FrameDecode::Invalid(FrameError::InvalidHex));
        assert_eq!(used, 1);
    }

    #[test]
    fn test_payload_too_large() {
        let large_payload = [0u8; MAX_PAYLOAD_SIZE + 1];
        let result = Frame::new(ADDR_MASTER, ADDR_CONTROLLER, 0x42, &large_payload);
        assert_eq!(result, Err(FrameError::PayloadTooLarge));
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let frame = Frame::new(ADDR_MASTER, ADDR_CONTROLLER, 0x42, &[]).unwrap();
        let mut buffer = [0u8; MIN_FRAME_SIZE - 1];
        assert_eq!(frame.encode(&mut buffer), Err(FrameError::BufferTooSmall));
    }
}
