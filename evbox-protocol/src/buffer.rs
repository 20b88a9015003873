//! Receive accumulation buffer

use heapless::Vec;

use crate::codec::{try_decode, Decoded};

/// Receive buffer capacity; several maximum-size frames fit
pub const RX_BUFFER_SIZE: usize = 128;

/// Accumulates received bytes and yields decoded messages
///
/// Bytes that arrive while the buffer is full are dropped.
#[derive(Debug, Clone, Default)]
pub struct RxBuffer {
    buf: Vec<u8, RX_BUFFER_SIZE>,
}

impl RxBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append received bytes
    ///
    /// Returns how many bytes were dropped for lack of space.
    pub fn extend(&mut self, bytes: &[u8]) -> usize {
        let room = RX_BUFFER_SIZE - self.buf.len();
        let take = bytes.len().min(room);
        // Cannot fail: `take` fits in the remaining capacity
        let _ = self.buf.extend_from_slice(&bytes[..take]);
        bytes.len() - take
    }

    /// Decode the next item at the head of the buffer
    ///
    /// Consumed bytes are removed. Returns `Decoded::Incomplete` once the
    /// buffer holds nothing more that can be decoded yet.
    pub fn next_decoded(&mut self) -> Decoded {
        let (decoded, used) = try_decode(&self.buf);
        self.consume(used);
        decoded
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Discard everything, e.g. a stale partial frame
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    fn consume(&mut self, used: usize) {
        let used = used.min(self.buf.len());
        let remaining = self.buf.len() - used;
        self.buf.copy_within(used.., 0);
        self.buf.truncate(remaining);
    }
}
