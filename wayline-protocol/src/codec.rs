//! Message encoding and decoding for the wayline protocol.
//!
//! Decoding is a non-destructive scan over the frame body: the returned
//! [`Message`] borrows its fields from the frame, which stays intact for
//! diagnostics after a failed parse.
//!
//! Checksum rules:
//! - input is the exact text `TYPE|NODE|[SEQ|]DATA`
//! - the checksum field and the STX/ETX delimiters are excluded
//! - the value is the XOR of every input byte, sent as two uppercase hex digits

use core::fmt::Write;

use heapless::{String, Vec};

use crate::frame::{FIELD_DELIMITER, FRAME_END, FRAME_START};

/// Maximum length of the joined `TYPE|NODE|[SEQ|]DATA` text
pub const PAYLOAD_CAPACITY: usize = 255;

/// Maximum length of an encoded frame, delimiters included
pub const TX_FRAME_CAPACITY: usize = 255;

/// Maximum length of a NODE identifier
pub const NODE_ID_CAPACITY: usize = 15;

/// An encoded frame ready for the transport
pub type OutFrame = Vec<u8, TX_FRAME_CAPACITY>;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Wire protocol revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProtocolVersion {
    /// `TYPE|NODE|DATA|CHK`, no sequence numbers
    Legacy,
    /// `TYPE|NODE|SEQ|DATA|CHK`
    #[default]
    Sequenced,
}

impl ProtocolVersion {
    /// Whether frames of this revision carry a SEQ field
    pub fn has_seq(self) -> bool {
        matches!(self, ProtocolVersion::Sequenced)
    }

    /// Number of fields before the checksum
    pub fn field_count(self) -> usize {
        if self.has_seq() {
            4
        } else {
            3
        }
    }

    /// Parse a revision name as used in configuration
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "legacy" => Some(ProtocolVersion::Legacy),
            "sequenced" => Some(ProtocolVersion::Sequenced),
            _ => None,
        }
    }

    /// Configuration name of this revision
    pub fn name(self) -> &'static str {
        match self {
            ProtocolVersion::Legacy => "legacy",
            ProtocolVersion::Sequenced => "sequenced",
        }
    }
}

/// Errors that can occur while decoding a frame body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Missing delimiter, too few fields, bad SEQ, or non-UTF-8 text
    Format,
    /// Received checksum does not match the recomputed one
    ChecksumMismatch { expected: u8, received: u8 },
}

/// Errors that can occur while encoding a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Joined fields exceed [`PAYLOAD_CAPACITY`]
    PayloadTooLarge,
    /// Framed output exceeds [`TX_FRAME_CAPACITY`]
    FrameTooLarge,
}

/// A decoded message borrowing its fields from the frame body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Message<'a> {
    /// Message type (`CMD`, `ACK`, `HB`, ...)
    pub msg_type: &'a str,
    /// Sender node identifier
    pub node: &'a str,
    /// Sequence number, present only in the sequenced revision
    pub seq: Option<u8>,
    /// Free-form data, may contain `|`
    pub data: &'a str,
    /// Checksum as received
    pub checksum: u8,
}

/// XOR of every byte in `bytes`
pub fn checksum_xor(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |chk, &b| chk ^ b)
}

/// Parse a checksum field as base-16, keeping the low 8 bits
///
/// Accepts what `strtoul(field, NULL, 16)` accepts: leading whitespace,
/// one optional `+`/`-` sign and an optional `0x` prefix, then hex digits
/// up to the first non-hex byte. A minus sign negates modulo 256. A field
/// with no hex digits parses as 0.
pub fn parse_checksum(field: &[u8]) -> u8 {
    let field = field.trim_ascii_start();
    let (negative, field) = match field {
        [b'-', rest @ ..] => (true, rest),
        [b'+', rest @ ..] => (false, rest),
        _ => (false, field),
    };
    let field = match field {
        [b'0', b'x' | b'X', rest @ ..] => rest,
        _ => field,
    };

    let mut value: u8 = 0;
    for &byte in field {
        let digit = match (byte as char).to_digit(16) {
            Some(d) => d as u8,
            None => break,
        };
        value = (value << 4) | digit;
    }

    if negative {
        value.wrapping_neg()
    } else {
        value
    }
}

/// Decode a frame body (no STX/ETX) into a [`Message`]
///
/// The checksum is located from the last `|`, verified over everything
/// before it, and only then are the fields split. DATA keeps any embedded
/// delimiters.
pub fn decode(frame: &[u8], version: ProtocolVersion) -> Result<Message<'_>, DecodeError> {
    let split = frame
        .iter()
        .rposition(|&b| b == FIELD_DELIMITER)
        .ok_or(DecodeError::Format)?;
    let (input, checksum_field) = (&frame[..split], &frame[split + 1..]);

    let expected = checksum_xor(input);
    let received = parse_checksum(checksum_field);
    if expected != received {
        return Err(DecodeError::ChecksumMismatch { expected, received });
    }

    let text = core::str::from_utf8(input).map_err(|_| DecodeError::Format)?;
    let mut fields = text.splitn(version.field_count(), FIELD_DELIMITER as char);

    let msg_type = fields.next().ok_or(DecodeError::Format)?;
    let node = fields.next().ok_or(DecodeError::Format)?;
    let seq = if version.has_seq() {
        let field = fields.next().ok_or(DecodeError::Format)?;
        Some(field.parse::<u8>().map_err(|_| DecodeError::Format)?)
    } else {
        None
    };
    let data = fields.next().ok_or(DecodeError::Format)?;

    Ok(Message {
        msg_type,
        node,
        seq,
        data,
        checksum: received,
    })
}

/// Best-effort recovery of the SEQ field from a body that failed to decode
///
/// Used to correlate error replies with the host request.
pub fn peek_seq(frame: &[u8], version: ProtocolVersion) -> Option<u8> {
    if !version.has_seq() {
        return None;
    }
    let field = frame.split(|&b| b == FIELD_DELIMITER).nth(2)?;
    core::str::from_utf8(field).ok()?.parse().ok()
}

/// Encode fields into a complete frame
///
/// `seq` is written only when `Some`; pass `None` for the legacy revision.
pub fn encode(
    msg_type: &str,
    node: &str,
    seq: Option<u8>,
    data: &str,
) -> Result<OutFrame, EncodeError> {
    let mut payload = String::<PAYLOAD_CAPACITY>::new();
    let written = match seq {
        Some(seq) => write!(payload, "{}|{}|{}|{}", msg_type, node, seq, data),
        None => write!(payload, "{}|{}|{}", msg_type, node, data),
    };
    written.map_err(|_| EncodeError::PayloadTooLarge)?;

    let checksum = checksum_xor(payload.as_bytes());

    let mut frame = OutFrame::new();
    frame.push(FRAME_START).map_err(|_| EncodeError::FrameTooLarge)?;
    frame
        .extend_from_slice(payload.as_bytes())
        .map_err(|_| EncodeError::FrameTooLarge)?;
    frame
        .push(FIELD_DELIMITER)
        .map_err(|_| EncodeError::FrameTooLarge)?;
    frame
        .extend_from_slice(&hex_byte(checksum))
        .map_err(|_| EncodeError::FrameTooLarge)?;
    frame.push(FRAME_END).map_err(|_| EncodeError::FrameTooLarge)?;

    Ok(frame)
}

/// Two uppercase hex digits for `value`
pub(crate) const fn hex_byte(value: u8) -> [u8; 2] {
    [
        HEX_DIGITS[(value >> 4) as usize],
        HEX_DIGITS[(value & 0x0F) as usize],
    ]
}
