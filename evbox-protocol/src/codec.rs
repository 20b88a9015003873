//! Message-level encode and decode on top of the framing layer

use crate::frame::{try_decode_frame, FrameDecode, FrameError, RawFrame, ADDR_MASTER};
use crate::messages::{CommandFrame, TelemetryFrame};

/// Outcome of decoding at the head of a receive buffer
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Decoded {
    /// Frame carrying a controller message
    Telemetry { src: u8, frame: TelemetryFrame },
    /// Frame carrying a master command, normally our own echo
    Command { src: u8, command: CommandFrame },
    /// More bytes are needed
    Incomplete,
    /// Head of the buffer is not a usable frame
    Invalid(FrameError),
}

/// Encode a command ready for transmission
pub fn encode(command: &CommandFrame) -> Result<RawFrame, FrameError> {
    command.to_frame()?.encode_to_vec()
}

/// Decode one message at the start of `buf`
///
/// Same consumption rules as [`try_decode_frame`]: a message consumes its
/// frame, `Incomplete` consumes nothing, `Invalid` consumes one byte. A
/// well-framed message whose payload is nonsense for its tag is `Invalid`
/// too, so resync restarts one byte in.
///
/// Frames from the master address are commands, anything else is telemetry.
pub fn try_decode(buf: &[u8]) -> (Decoded, usize) {
    let (frame, used) = match try_decode_frame(buf) {
        (FrameDecode::Frame(frame), used) => (frame, used),
        (FrameDecode::Incomplete, used) => return (Decoded::Incomplete, used),
        (FrameDecode::Invalid(e), used) => return (Decoded::Invalid(e), used),
    };

    let decoded = if frame.src == ADDR_MASTER {
        CommandFrame::from_frame(&frame).map(|command| Decoded::Command {
            src: frame.src,
            command,
        })
    } else {
        TelemetryFrame::from_frame(&frame).map(|telemetry| Decoded::Telemetry {
            src: frame.src,
            frame: telemetry,
        })
    };

    match decoded {
        Ok(decoded) => (decoded, used),
        Err(e) => (Decoded::Invalid(e), 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Frame, ADDR_CONTROLLER, STX};
    use crate::messages::{ChargeCurrent, TAG_ACK, TAG_SET_CURRENT_LIMIT};

    #[test]
    fn test_encode_set_current_limit_matches_controller_format() {
        let cmd = CommandFrame::SetCurrentLimit(ChargeCurrent::new(16).unwrap());
        let bytes = encode(&cmd).unwrap();
        assert_eq!(
            bytes.as_slice(),
            b"\x0280A06900A000A000A0003C003C003C003C1307\x03"
        );
    }

    #[test]
    fn test_encode_keeps_full_deci_amp_value() {
        let cmd = CommandFrame::SetCurrentLimit(ChargeCurrent::new(32).unwrap());
        let bytes = encode(&cmd).unwrap();
        assert_eq!(bytes.len(), 40);
        assert_eq!(bytes[0], STX);
        assert_eq!(&bytes[7..19], b"014001400140"); // 320 deci-amps
    }

    #[test]
    fn test_controller_status_decodes() {
        let bytes = b"\x02A08069023E00E600E60000A0009F00A10010002000300001E2409C0E\x03";
        match try_decode(bytes) {
            (
                Decoded::Telemetry {
                    src: ADDR_CONTROLLER,
                    frame: TelemetryFrame::Status(report),
                },
                58,
            ) => {
                assert_eq!(report.l1.deci_amps, 160);
                assert_eq!(report.l2.deci_amps, 159);
                assert_eq!(report.l3.deci_amps, 161);
                assert_eq!(report.energy.watt_hours, 123_456);
                // Raw spans are the field characters as they sat in the frame
                assert_eq!(report.l1.raw.as_slice(), &bytes[21..25]);
                assert_eq!(report.l2.raw.as_slice(), &bytes[25..29]);
                assert_eq!(report.l3.raw.as_slice(), &bytes[29..33]);
                assert_eq!(report.energy.raw.as_slice(), &bytes[45..53]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_echo_decodes_as_command() {
        let cmd = CommandFrame::SetCurrentLimit(ChargeCurrent::new(10).unwrap());
        let bytes = encode(&cmd).unwrap();

        let (decoded, used) = try_decode(&bytes);
        assert_eq!(used, bytes.len());
        assert_eq!(
            decoded,
            Decoded::Command {
                src: ADDR_MASTER,
                command: cmd
            }
        );
    }

    #[test]
    fn test_bad_payload_consumes_one_byte() {
        let bytes = Frame::new(ADDR_CONTROLLER, ADDR_MASTER, TAG_ACK, &[0x00])
            .unwrap()
            .encode_to_vec()
            .unwrap();
        let (decoded, used) = try_decode(&bytes);
        assert!(matches!(decoded, Decoded::Telemetry { .. }));
        assert_eq!(used, 14);

        // 8.0 A on every phase is below the controller's range
        let mut payload = [0u8; 14];
        for phase in 0..3 {
            payload[2 * phase + 1] = 80;
        }
        let bytes = Frame::new(ADDR_MASTER, ADDR_CONTROLLER, TAG_SET_CURRENT_LIMIT, &payload)
            .unwrap()
            .encode_to_vec()
            .unwrap();
        let (decoded, used) = try_decode(&bytes);
        assert_eq!(decoded, Decoded::Invalid(FrameError::InvalidPayload));
        assert_eq!(used, 1);
    }
}
