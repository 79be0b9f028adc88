//! Message types for the wayline protocol
//!
//! Message types are divided into three categories:
//! - Host → Node: commands
//! - Node → Host: replies to commands
//! - Node → Host: unsolicited telemetry

/// TYPE field values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageType {
    /// Host command
    Command,
    /// Positive command reply
    Ack,
    /// Reply to a STATUS command
    Status,
    /// Error reply
    Error,
    /// Heartbeat telemetry
    Heartbeat,
    /// Arrival telemetry
    Arrival,
    /// Delay telemetry
    Delay,
}

impl MessageType {
    /// Parse a TYPE field
    pub fn from_wire(field: &str) -> Option<Self> {
        match field {
            "CMD" => Some(MessageType::Command),
            "ACK" => Some(MessageType::Ack),
            "STATUS" => Some(MessageType::Status),
            "ERR" => Some(MessageType::Error),
            "HB" => Some(MessageType::Heartbeat),
            "ARR" => Some(MessageType::Arrival),
            "DL" => Some(MessageType::Delay),
            _ => None,
        }
    }

    /// TYPE field text
    pub const fn as_wire(self) -> &'static str {
        match self {
            MessageType::Command => "CMD",
            MessageType::Ack => "ACK",
            MessageType::Status => "STATUS",
            MessageType::Error => "ERR",
            MessageType::Heartbeat => "HB",
            MessageType::Arrival => "ARR",
            MessageType::Delay => "DL",
        }
    }
}

/// DATA values carried by `ERR` replies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorReason {
    /// Missing delimiter or too few fields
    Format,
    /// Checksum mismatch
    Checksum,
    /// Command text not recognized
    UnknownCommand,
    /// Message type not handled by the node
    UnknownType,
    /// Receive buffer overflowed
    RxOverflow,
    /// Reply payload exceeded the payload capacity
    TxTooLong,
    /// Framed reply exceeded the transmit capacity
    FrameTooLong,
}

impl ErrorReason {
    /// DATA field text
    pub const fn as_wire(self) -> &'static str {
        match self {
            ErrorReason::Format => "FORMAT",
            ErrorReason::Checksum => "CHK",
            ErrorReason::UnknownCommand => "UNKNOWN_CMD",
            ErrorReason::UnknownType => "UNKNOWN_TYPE",
            ErrorReason::RxOverflow => "RX_OVERFLOW",
            ErrorReason::TxTooLong => "TX_TOO_LONG",
            ErrorReason::FrameTooLong => "FRM_TOO_LONG",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_wire_names() {
        let types = [
            MessageType::Command,
            MessageType::Ack,
            MessageType::Status,
            MessageType::Error,
            MessageType::Heartbeat,
            MessageType::Arrival,
            MessageType::Delay,
        ];

        for msg_type in types {
            assert_eq!(MessageType::from_wire(msg_type.as_wire()), Some(msg_type));
        }
        assert_eq!(MessageType::from_wire("cmd"), None);
        assert_eq!(MessageType::from_wire(""), None);
    }

    #[test]
    fn test_error_reason_text() {
        assert_eq!(ErrorReason::Checksum.as_wire(), "CHK");
        assert_eq!(ErrorReason::FrameTooLong.as_wire(), "FRM_TOO_LONG");
        assert_eq!(ErrorReason::RxOverflow.as_wire(), "RX_OVERFLOW");
    }
}
