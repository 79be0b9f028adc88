//! Wayline Node ↔ Host Protocol
//!
//! This crate defines the UART text protocol spoken between a wayline node
//! (the on-vehicle controller) and its host. Frames are printable ASCII
//! wrapped in control delimiters and protected by a one-byte XOR checksum.
//!
//! # Frame Overview
//!
//! ```text
//! ┌──────┬──────┬───┬──────┬───┬───────┬───┬──────┬───┬─────┬──────┐
//! │ STX  │ TYPE │ | │ NODE │ | │ [SEQ] │ | │ DATA │ | │ CHK │ ETX  │
//! │ 0x02 │      │   │      │   │  0-255│   │      │   │ 2 hex│ 0x03 │
//! └──────┴──────┴───┴──────┴───┴───────┴───┴──────┴───┴─────┴──────┘
//! ```
//!
//! `CHK` is the XOR of every byte of `TYPE|NODE|[SEQ|]DATA`. `SEQ` is only
//! present in the sequenced protocol revision; the legacy revision omits it.
//! `DATA` may itself contain `|` since the checksum is always located from
//! the end of the frame.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod codec;
pub mod fallback;
pub mod frame;
pub mod messages;

pub use codec::{
    checksum_xor, decode, encode, parse_checksum, peek_seq, DecodeError, EncodeError, Message,
    OutFrame, ProtocolVersion, NODE_ID_CAPACITY, PAYLOAD_CAPACITY, TX_FRAME_CAPACITY,
};
pub use fallback::{LiteralFrame, LITERAL_FRAME_CAPACITY};
pub use frame::{
    FrameAssembler, FrameError, RawFrame, FIELD_DELIMITER, FRAME_END, FRAME_START, RX_CAPACITY,
};
pub use messages::{ErrorReason, MessageType};
