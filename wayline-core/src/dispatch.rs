//! Host command dispatch
//!
//! Commands arrive in the DATA field of `CMD` frames:
//!
//! | DATA              | Effect                | Reply                 |
//! |-------------------|-----------------------|-----------------------|
//! | `PING`            | none                  | `ACK PONG`            |
//! | `STATUS`          | none                  | `STATUS node=..,route=..,eta=..` |
//! | `SETROUTE=<text>` | route := text         | `ACK ROUTE_SET`       |
//! | `SETETA=<int>`    | eta := int            | `ACK ETA_SET`         |
//! | anything else     | none                  | `ERR UNKNOWN_CMD`     |

use core::fmt::Write;

use heapless::String;

use wayline_protocol::{ErrorReason, MessageType};

use crate::state::DeviceState;

/// Reply DATA capacity, enough for the longest STATUS text
pub const REPLY_DATA_CAPACITY: usize = 64;

/// A parsed host command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command<'a> {
    Ping,
    Status,
    /// New route text, uncut
    SetRoute(&'a str),
    /// Parsed ETA in minutes
    SetEta(i32),
    /// Unrecognized DATA
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    /// Parse a command from a `CMD` frame's DATA field
    pub fn parse(data: &'a str) -> Self {
        match data {
            "PING" => Command::Ping,
            "STATUS" => Command::Status,
            _ => {
                if let Some(route) = data.strip_prefix("SETROUTE=") {
                    Command::SetRoute(route)
                } else if let Some(eta) = data.strip_prefix("SETETA=") {
                    Command::SetEta(parse_eta(eta))
                } else {
                    Command::Unknown(data)
                }
            }
        }
    }
}

/// Reply to a dispatched command
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reply {
    /// `ACK`, `STATUS` or `ERR`
    pub msg_type: MessageType,
    /// Reply DATA
    pub data: String<REPLY_DATA_CAPACITY>,
}

impl Reply {
    fn new(msg_type: MessageType, text: &str) -> Self {
        let mut data = String::new();
        let _ = data.push_str(text);
        Self { msg_type, data }
    }

    /// `ERR` reply carrying `reason`
    pub fn error(reason: ErrorReason) -> Self {
        Self::new(MessageType::Error, reason.as_wire())
    }

    pub fn is_error(&self) -> bool {
        self.msg_type == MessageType::Error
    }
}

/// Execute a command against the device state and build its reply
pub fn dispatch(command: Command<'_>, state: &mut DeviceState) -> Reply {
    match command {
        Command::Ping => Reply::new(MessageType::Ack, "PONG"),
        Command::Status => {
            let mut reply = Reply::new(MessageType::Status, "");
            // Capacity covers 15-char ids and any i32
            let _ = write!(
                reply.data,
                "node={},route={},eta={}",
                state.node_id(),
                state.route_id(),
                state.eta_minutes()
            );
            reply
        }
        Command::SetRoute(route) => {
            state.set_route(route);
            Reply::new(MessageType::Ack, "ROUTE_SET")
        }
        Command::SetEta(minutes) => {
            state.set_eta(minutes);
            Reply::new(MessageType::Ack, "ETA_SET")
        }
        Command::Unknown(_) => Reply::error(ErrorReason::UnknownCommand),
    }
}

/// Lenient integer parse
///
/// Skips leading whitespace, accepts one sign, then reads digits up to the
/// first non-digit. No digits yields 0. Out-of-range values saturate.
fn parse_eta(text: &str) -> i32 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let mut value: i32 = 0;
    for byte in digits.bytes() {
        if !byte.is_ascii_digit() {
            break;
        }
        let digit = i32::from(byte - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(digit)
        } else {
            value.saturating_mul(10).saturating_add(digit)
        };
    }
    value
}
