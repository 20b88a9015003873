//! Property tests for frame decoding and resynchronisation

use evbox_protocol::frame::{try_decode_frame, FrameDecode};
use evbox_protocol::messages::{TAG_ACK, TAG_NAK, TAG_SET_CURRENT_LIMIT};
use evbox_protocol::{
    encode, try_decode, ChargeCurrent, CommandFrame, Decoded, Frame, RawFrame, RxBuffer,
    StatusReport, TelemetryFrame, ADDR_CONTROLLER, ADDR_MASTER,
};
use proptest::prelude::*;

fn controller_frame() -> impl Strategy<Value = Frame> {
    prop_oneof![
        (any::<u16>(), any::<u16>(), any::<u16>(), any::<u32>()).prop_map(|(l1, l2, l3, wh)| {
            TelemetryFrame::Status(StatusReport::new(l1, l2, l3, wh))
                .to_frame()
                .unwrap()
        }),
        // Fields the driver does not interpret may hold anything
        prop::collection::vec(any::<u8>(), 23).prop_map(|payload| {
            Frame::new(ADDR_CONTROLLER, ADDR_MASTER, TAG_SET_CURRENT_LIMIT, &payload).unwrap()
        }),
        any::<u8>().prop_map(|tag| {
            Frame::new(ADDR_CONTROLLER, ADDR_MASTER, TAG_ACK, &[tag]).unwrap()
        }),
        (any::<u8>(), any::<u8>()).prop_map(|(tag, code)| {
            Frame::new(ADDR_CONTROLLER, ADDR_MASTER, TAG_NAK, &[tag, code]).unwrap()
        }),
        (9u8..=32).prop_map(|amps| {
            CommandFrame::SetCurrentLimit(ChargeCurrent::new(amps).unwrap())
                .to_frame()
                .unwrap()
        }),
        // Tags outside the known set are delimited by ETX alone
        (0x30u8..0x40, prop::collection::vec(any::<u8>(), 0..8)).prop_map(|(tag, payload)| {
            Frame::new(ADDR_CONTROLLER, ADDR_MASTER, tag, &payload).unwrap()
        }),
    ]
}

fn encoded(frame: &Frame) -> RawFrame {
    frame.encode_to_vec().unwrap()
}

proptest! {
    /// Every encoded frame decodes back to itself and consumes exactly its bytes
    #[test]
    fn encoded_frames_decode(frame in controller_frame()) {
        let bytes = encoded(&frame);
        let (decoded, used) = try_decode_frame(&bytes);
        prop_assert_eq!(used, bytes.len());
        prop_assert_eq!(decoded, FrameDecode::Frame(frame));
    }

    /// Any valid current limit survives the trip through the codec unchanged
    #[test]
    fn current_limits_decode_to_the_same_command(amps in 9u8..=32) {
        let cmd = CommandFrame::SetCurrentLimit(ChargeCurrent::new(amps).unwrap());
        let bytes = encode(&cmd).unwrap();

        let (decoded, used) = try_decode(&bytes);
        prop_assert_eq!(used, bytes.len());
        match decoded {
            Decoded::Command { src, command } => {
                prop_assert_eq!(src, ADDR_MASTER);
                prop_assert_eq!(command, cmd);
            }
            other => prop_assert!(false, "unexpected {:?}", other),
        }
    }

    /// Corrupting any one byte is detected at the head, costs one byte, and
    /// never hides the frame that follows
    #[test]
    fn single_byte_corruption_resyncs(
        first in controller_frame(),
        second in controller_frame(),
        index in any::<prop::sample::Index>(),
        replacement in any::<u8>(),
    ) {
        let mut bytes = encoded(&first).to_vec();
        let pos = index.index(bytes.len());
        prop_assume!(bytes[pos] != replacement);
        bytes[pos] = replacement;
        bytes.extend_from_slice(&encoded(&second));

        let (decoded, used) = try_decode_frame(&bytes);
        prop_assert!(matches!(decoded, FrameDecode::Invalid(_)), "got {:?}", decoded);
        prop_assert_eq!(used, 1);

        let mut rx = RxBuffer::new();
        rx.extend(&bytes);
        let mut last = None;
        loop {
            match rx.next_decoded() {
                Decoded::Incomplete => break,
                Decoded::Invalid(_) => {}
                other => last = Some(other),
            }
        }
        let expected = try_decode(&encoded(&second)).0;
        prop_assert_eq!(last, Some(expected));
        prop_assert!(rx.is_empty());
    }

    /// A frame delivered in arbitrary chunks decodes once all bytes arrive
    #[test]
    fn chunked_delivery(frame in controller_frame(), cut in any::<prop::sample::Index>()) {
        let bytes = encoded(&frame);
        let cut = cut.index(bytes.len());

        let mut rx = RxBuffer::new();
        rx.extend(&bytes[..cut]);
        prop_assert_eq!(rx.next_decoded(), Decoded::Incomplete);
        rx.extend(&bytes[cut..]);
        prop_assert!(!matches!(rx.next_decoded(), Decoded::Incomplete | Decoded::Invalid(_)));
    }
}
