//! Literal error frames for encoder failures
//!
//! When a reply cannot be encoded, the node still has to tell the host.
//! These frames are assembled byte by byte without going through
//! [`crate::codec::encode`], so building one can never fail.

use crate::codec::{hex_byte, NODE_ID_CAPACITY};
use crate::frame::{FIELD_DELIMITER, FRAME_END, FRAME_START};
use crate::messages::{ErrorReason, MessageType};

/// Storage for a literal frame
///
/// STX + `ERR|` + NODE (15) + `|SEQ` (4) + `|REASON` (13) + `|CHK` (3) + ETX
pub const LITERAL_FRAME_CAPACITY: usize = 48;

/// A pre-built `ERR` frame
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LiteralFrame {
    bytes: [u8; LITERAL_FRAME_CAPACITY],
    len: usize,
}

impl LiteralFrame {
    /// Build `STX ERR|NODE|[SEQ|]REASON|CHK ETX`
    ///
    /// NODE is cut to [`NODE_ID_CAPACITY`] bytes. Usable in `const` context.
    pub const fn error(node: &str, seq: Option<u8>, reason: ErrorReason) -> Self {
        let node = node.as_bytes();
        let node_len = if node.len() > NODE_ID_CAPACITY {
            NODE_ID_CAPACITY
        } else {
            node.len()
        };

        let mut frame = Self {
            bytes: [0; LITERAL_FRAME_CAPACITY],
            len: 0,
        };
        frame = frame.with_byte(FRAME_START);
        frame = frame.with_bytes(MessageType::Error.as_wire().as_bytes(), usize::MAX);
        frame = frame.with_byte(FIELD_DELIMITER);
        frame = frame.with_bytes(node, node_len);
        frame = frame.with_byte(FIELD_DELIMITER);
        if let Some(seq) = seq {
            frame = frame.with_decimal(seq);
            frame = frame.with_byte(FIELD_DELIMITER);
        }
        frame = frame.with_bytes(reason.as_wire().as_bytes(), usize::MAX);

        // Checksum covers everything after STX
        let mut checksum = 0u8;
        let mut i = 1;
        while i < frame.len {
            checksum ^= frame.bytes[i];
            i += 1;
        }

        let hex = hex_byte(checksum);
        frame = frame.with_byte(FIELD_DELIMITER);
        frame = frame.with_byte(hex[0]);
        frame = frame.with_byte(hex[1]);
        frame.with_byte(FRAME_END)
    }

    /// Frame bytes, delimiters included
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    const fn with_byte(mut self, byte: u8) -> Self {
        if self.len < LITERAL_FRAME_CAPACITY {
            self.bytes[self.len] = byte;
            self.len += 1;
        }
        self
    }

    const fn with_bytes(mut self, bytes: &[u8], limit: usize) -> Self {
        let mut i = 0;
        while i < bytes.len() && i < limit {
            self = self.with_byte(bytes[i]);
            i += 1;
        }
        self
    }

    const fn with_decimal(self, value: u8) -> Self {
        if value >= 100 {
            self.with_byte(b'0' + value / 100)
                .with_byte(b'0' + value / 10 % 10)
                .with_byte(b'0' + value % 10)
        } else if value >= 10 {
            self.with_byte(b'0' + value / 10).with_byte(b'0' + value % 10)
        } else {
            self.with_byte(b'0' + value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;

    const TX_TOO_LONG: LiteralFrame = LiteralFrame::error("BUS01", None, ErrorReason::TxTooLong);

    #[test]
    fn test_const_literal_matches_encoder() {
        let encoded = encode("ERR", "BUS01", None, "TX_TOO_LONG").unwrap();
        assert_eq!(TX_TOO_LONG.as_bytes(), encoded.as_slice());
    }

    #[test]
    fn test_literal_with_seq_matches_encoder() {
        for seq in [0u8, 7, 42, 255] {
            let literal = LiteralFrame::error("BUS01", Some(seq), ErrorReason::FrameTooLong);
            let encoded = encode("ERR", "BUS01", Some(seq), "FRM_TOO_LONG").unwrap();
            assert_eq!(literal.as_bytes(), encoded.as_slice());
        }
    }

    #[cfg(feature = "defmt")]
    #[test]
    fn test_literal_is_loggable() {
        fn loggable<T: defmt::Format>() {}
        loggable::<LiteralFrame>();
    }

    #[test]
    fn test_long_node_is_cut() {
        let literal = LiteralFrame::error(
            "NODE-NAME-THAT-IS-FAR-TOO-LONG",
            Some(255),
            ErrorReason::FrameTooLong,
        );
        let encoded = encode("ERR", "NODE-NAME-THAT-", Some(255), "FRM_TOO_LONG").unwrap();
        assert_eq!(literal.as_bytes(), encoded.as_slice());
        assert_eq!(literal.as_bytes().last(), Some(&FRAME_END));
    }
}
