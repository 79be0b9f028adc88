//! Frame assembly for the wayline protocol.
//!
//! Frame format on the wire:
//! - START (1 byte): 0x02 (STX)
//! - BODY (0-191 bytes): `TYPE|NODE|[SEQ|]DATA|CHK`
//! - END (1 byte): 0x03 (ETX)
//!
//! The assembler only delimits frames. Checksum validation and field
//! splitting belong to [`crate::codec`].

use heapless::Vec;

/// Frame start delimiter (STX)
pub const FRAME_START: u8 = 0x02;

/// Frame end delimiter (ETX)
pub const FRAME_END: u8 = 0x03;

/// Field separator inside a frame body
pub const FIELD_DELIMITER: u8 = b'|';

/// Maximum body length the assembler will buffer between START and END
pub const RX_CAPACITY: usize = 191;

/// A complete frame body, without its delimiters
pub type RawFrame = Vec<u8, RX_CAPACITY>;

/// Errors reported while assembling frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Body exceeded [`RX_CAPACITY`]; the partial frame was discarded
    Overflow,
}

/// Byte-at-a-time frame assembler
///
/// Owns the receive buffer exclusively. A START byte always restarts the
/// frame, silently discarding anything buffered so far. Bytes outside a
/// frame are ignored, which lets the assembler resync after line noise.
#[derive(Debug, Clone)]
pub struct FrameAssembler {
    receiving: bool,
    buffer: RawFrame,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAssembler {
    /// Create an idle assembler
    pub const fn new() -> Self {
        Self {
            receiving: false,
            buffer: Vec::new(),
        }
    }

    /// Drop any partial frame and wait for the next START byte
    pub fn reset(&mut self) {
        self.receiving = false;
        self.buffer.clear();
    }

    /// True while between a START byte and its END byte
    pub fn is_receiving(&self) -> bool {
        self.receiving
    }

    /// Number of body bytes buffered for the frame in progress
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Feed a single byte to the assembler
    ///
    /// Returns `Ok(Some(frame))` when an END byte completes a frame,
    /// `Ok(None)` when more bytes are needed, or `Err(FrameError::Overflow)`
    /// when the body outgrew the buffer. After an overflow the assembler is
    /// idle and the next START byte begins a fresh frame.
    pub fn on_byte(&mut self, byte: u8) -> Result<Option<RawFrame>, FrameError> {
        if byte == FRAME_START {
            self.buffer.clear();
            self.receiving = true;
            return Ok(None);
        }

        if !self.receiving {
            return Ok(None);
        }

        if byte == FRAME_END {
            self.receiving = false;
            return Ok(Some(core::mem::take(&mut self.buffer)));
        }

        if self.buffer.push(byte).is_err() {
            self.reset();
            return Err(FrameError::Overflow);
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// First complete frame in `bytes`
    fn first_frame(
        assembler: &mut FrameAssembler,
        bytes: &[u8],
    ) -> Result<Option<RawFrame>, FrameError> {
        for &byte in bytes {
            if let Some(frame) = assembler.on_byte(byte)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }

    fn framed(body: &[u8]) -> std::vec::Vec<u8> {
        let mut bytes = std::vec![FRAME_START];
        bytes.extend_from_slice(body);
        bytes.push(FRAME_END);
        bytes
    }

    #[test]
    fn test_assemble_simple_frame() {
        let mut assembler = FrameAssembler::new();
        let frame = first_frame(&mut assembler, &framed(b"CMD|HOST|7|PING|4A"))
            .unwrap()
            .unwrap();

        assert_eq!(frame.as_slice(), b"CMD|HOST|7|PING|4A");
        assert!(!assembler.is_receiving());
        assert_eq!(assembler.buffered(), 0);
    }

    #[test]
    fn test_bytes_outside_frame_are_ignored() {
        let mut assembler = FrameAssembler::new();
        let mut data = std::vec![0x00, b'x', FRAME_END, 0xFF];
        data.extend_from_slice(&framed(b"HB|BUS01|OK|00"));

        let frame = first_frame(&mut assembler, &data).unwrap().unwrap();
        assert_eq!(frame.as_slice(), b"HB|BUS01|OK|00");
    }

    #[test]
    fn test_start_mid_frame_restarts() {
        let mut assembler = FrameAssembler::new();
        let mut data = std::vec![FRAME_START];
        data.extend_from_slice(b"garbage|half");
        data.extend_from_slice(&framed(b"ACK|BUS01|PONG|11"));

        let frame = first_frame(&mut assembler, &data).unwrap().unwrap();
        assert_eq!(frame.as_slice(), b"ACK|BUS01|PONG|11");
    }

    #[test]
    fn test_empty_frame() {
        let mut assembler = FrameAssembler::new();
        let frame = first_frame(&mut assembler, &[FRAME_START, FRAME_END]).unwrap().unwrap();
        assert!(frame.is_empty());
    }

    #[test]
    fn test_exact_capacity_fits() {
        let body = [b'A'; RX_CAPACITY];
        let mut assembler = FrameAssembler::new();
        let frame = first_frame(&mut assembler, &framed(&body)).unwrap().unwrap();
        assert_eq!(frame.len(), RX_CAPACITY);
    }

    #[test]
    fn test_overflow_by_one_byte() {
        let mut assembler = FrameAssembler::new();
        assert_eq!(assembler.on_byte(FRAME_START), Ok(None));
        for _ in 0..RX_CAPACITY {
            assert_eq!(assembler.on_byte(b'A'), Ok(None));
        }

        assert_eq!(assembler.on_byte(b'A'), Err(FrameError::Overflow));
        assert!(!assembler.is_receiving());
        assert_eq!(assembler.buffered(), 0);

        // Tail of the oversized frame is discarded, including its END
        assert_eq!(assembler.on_byte(b'B'), Ok(None));
        assert_eq!(assembler.on_byte(FRAME_END), Ok(None));

        // Ready for a fresh frame immediately
        let frame = first_frame(&mut assembler, &framed(b"CMD|HOST|1|PING|00")).unwrap().unwrap();
        assert_eq!(frame.as_slice(), b"CMD|HOST|1|PING|00");
    }

    proptest! {
        #[test]
        fn prop_any_body_reassembles(body in proptest::collection::vec(0x04u8..=0xFF, 0..=RX_CAPACITY)) {
            let mut assembler = FrameAssembler::new();
            let frame = first_frame(&mut assembler, &framed(&body)).unwrap().unwrap();
            prop_assert_eq!(frame.as_slice(), body.as_slice());
        }
    }
}
