//! Node context
//!
//! [`Node`] owns every piece of mutable protocol state (device record,
//! dedup watermark, outbound sequence counter, telemetry timers) and turns
//! inbound events into frames to transmit. Nothing is global: whoever owns
//! the `Node` is the only writer.
//!
//! Inbound pipeline per frame:
//! decode + checksum → type check → dedup → dispatch → encode reply.

use core::fmt::Write;

use heapless::{String, Vec};

use wayline_protocol::{
    decode, encode, peek_seq, DecodeError, EncodeError, ErrorReason, FrameError, LiteralFrame,
    MessageType, OutFrame, ProtocolVersion, RawFrame,
};

use crate::config::{NodeConfig, StopId, UnknownTypePolicy, DELAY_PAYLOAD_CAPACITY};
use crate::dedup::SequenceDeduplicator;
use crate::dispatch::{dispatch, Command, Reply};
use crate::state::{DeviceState, TxSequence};
use crate::telemetry::{TelemetryScheduler, TelemetryStream};

/// ARR payload capacity: `route=` + 15 + `,stop=` + 15 + `,eta=` + i32
const ARRIVAL_DATA_CAPACITY: usize = 64;

/// Events delivered to the node by the receive path
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Inbound {
    /// A complete frame body
    Frame(RawFrame),
    /// The receive buffer overflowed and the frame was discarded
    Overflow,
}

/// Protocol errors seen by the node
///
/// None of these are fatal. Each is turned into an `ERR` reply or a
/// silent drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NodeError {
    /// Missing delimiter or too few fields
    Format,
    /// Checksum did not match
    ChecksumMismatch { expected: u8, received: u8 },
    /// Command repeated the last accepted SEQ (no reply)
    DuplicateSequence(u8),
    /// Receive buffer overflowed
    BufferOverflow,
    /// Reply payload too large, literal frame sent instead
    PayloadTooLarge,
    /// Framed reply too large, literal frame sent instead
    FrameTooLarge,
    /// Command text not recognized
    UnknownCommand,
    /// Valid frame that is not a command
    UnknownType,
}

impl NodeError {
    /// `ERR` reason sent for this error, if any
    pub fn reason(self) -> Option<ErrorReason> {
        match self {
            NodeError::Format => Some(ErrorReason::Format),
            NodeError::ChecksumMismatch { .. } => Some(ErrorReason::Checksum),
            NodeError::DuplicateSequence(_) => None,
            NodeError::BufferOverflow => Some(ErrorReason::RxOverflow),
            NodeError::PayloadTooLarge => Some(ErrorReason::TxTooLong),
            NodeError::FrameTooLarge => Some(ErrorReason::FrameTooLong),
            NodeError::UnknownCommand => Some(ErrorReason::UnknownCommand),
            NodeError::UnknownType => Some(ErrorReason::UnknownType),
        }
    }
}

impl From<DecodeError> for NodeError {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::Format => NodeError::Format,
            DecodeError::ChecksumMismatch { expected, received } => {
                NodeError::ChecksumMismatch { expected, received }
            }
        }
    }
}

impl From<EncodeError> for NodeError {
    fn from(e: EncodeError) -> Self {
        match e {
            EncodeError::PayloadTooLarge => NodeError::PayloadTooLarge,
            EncodeError::FrameTooLarge => NodeError::FrameTooLarge,
        }
    }
}

impl From<FrameError> for NodeError {
    fn from(e: FrameError) -> Self {
        match e {
            FrameError::Overflow => NodeError::BufferOverflow,
        }
    }
}

/// Bytes ready for the transport
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transmit {
    /// Frame built by the encoder
    Encoded(OutFrame),
    /// Pre-built frame sent when the encoder failed
    Literal(LiteralFrame),
}

impl Transmit {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Transmit::Encoded(frame) => frame.as_slice(),
            Transmit::Literal(frame) => frame.as_bytes(),
        }
    }
}

/// Result of handling one inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// Command executed, reply ready
    Replied(Transmit),
    /// Event rejected, `ERR` reply ready
    Rejected { error: NodeError, reply: Transmit },
    /// Event dropped without a reply
    Dropped(NodeError),
    /// Valid non-command frame, no reply by policy
    Ignored,
}

impl Outcome {
    /// Frame to send, if any
    pub fn transmit(&self) -> Option<&Transmit> {
        match self {
            Outcome::Replied(frame) | Outcome::Rejected { reply: frame, .. } => Some(frame),
            Outcome::Dropped(_) | Outcome::Ignored => None,
        }
    }

    /// Error behind this outcome, if any
    pub fn error(&self) -> Option<NodeError> {
        match self {
            Outcome::Rejected { error, .. } | Outcome::Dropped(error) => Some(*error),
            Outcome::Replied(_) | Outcome::Ignored => None,
        }
    }
}

/// Protocol engine context
#[derive(Debug, Clone)]
pub struct Node {
    version: ProtocolVersion,
    unknown_type: UnknownTypePolicy,
    state: DeviceState,
    dedup: SequenceDeduplicator,
    tx_seq: TxSequence,
    telemetry: TelemetryScheduler,
    stop_id: StopId,
    delay_payload: String<DELAY_PAYLOAD_CAPACITY>,
    tx_too_long: LiteralFrame,
    frame_too_long: LiteralFrame,
}

impl Node {
    /// Create a node that booted at `now_ms`
    pub fn new(config: &NodeConfig, now_ms: u32) -> Self {
        let version = config.protocol;
        let literal_seq = version.has_seq().then_some(0);
        let node_id = config.node_id.as_str();

        Self {
            version,
            unknown_type: config.unknown_type_policy(),
            state: DeviceState::from_config(config),
            dedup: SequenceDeduplicator::new(),
            tx_seq: TxSequence::new(),
            telemetry: TelemetryScheduler::new(&config.telemetry, now_ms),
            stop_id: config.stop_id.clone(),
            delay_payload: config.telemetry.delay_payload.clone(),
            tx_too_long: LiteralFrame::error(node_id, literal_seq, ErrorReason::TxTooLong),
            frame_too_long: LiteralFrame::error(node_id, literal_seq, ErrorReason::FrameTooLong),
        }
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// SEQ the next node-originated frame will carry
    pub fn next_tx_seq(&self) -> u8 {
        self.tx_seq.peek()
    }

    /// Handle an event from the receive path
    pub fn handle(&mut self, inbound: &Inbound) -> Outcome {
        match inbound {
            Inbound::Frame(frame) => self.handle_frame(frame),
            Inbound::Overflow => self.handle_overflow(),
        }
    }

    /// Handle a receive buffer overflow
    pub fn handle_overflow(&mut self) -> Outcome {
        self.reject(NodeError::BufferOverflow, None)
    }

    /// Handle a complete frame body
    pub fn handle_frame(&mut self, frame: &[u8]) -> Outcome {
        let msg = match decode(frame, self.version) {
            Ok(msg) => msg,
            Err(e) => return self.reject(e.into(), peek_seq(frame, self.version)),
        };

        if MessageType::from_wire(msg.msg_type) != Some(MessageType::Command) {
            return match self.unknown_type {
                UnknownTypePolicy::Ignore => Outcome::Ignored,
                UnknownTypePolicy::Reply => self.reject(NodeError::UnknownType, msg.seq),
            };
        }

        if let Some(seq) = msg.seq {
            if !self.dedup.accept(MessageType::Command, seq) {
                return Outcome::Dropped(NodeError::DuplicateSequence(seq));
            }
        }

        let command = Command::parse(msg.data);
        let reply = dispatch(command, &mut self.state);
        let seq = self.reply_seq(msg.seq);

        match self.encode_reply(&reply, seq) {
            Ok(frame) if reply.is_error() => Outcome::Rejected {
                error: NodeError::UnknownCommand,
                reply: Transmit::Encoded(frame),
            },
            Ok(frame) => Outcome::Replied(Transmit::Encoded(frame)),
            Err(e) => Outcome::Rejected {
                error: e.into(),
                reply: self.fallback(e),
            },
        }
    }

    /// Build telemetry frames due at `now_ms`
    pub fn poll(&mut self, now_ms: u32) -> Vec<Transmit, 3> {
        let mut frames = Vec::new();
        for stream in self.telemetry.poll(now_ms) {
            let _ = frames.push(self.telemetry_frame(stream));
        }
        frames
    }

    fn telemetry_frame(&mut self, stream: TelemetryStream) -> Transmit {
        let seq = self.tx_seq.next();
        let mut data = String::<ARRIVAL_DATA_CAPACITY>::new();
        let text = match stream {
            TelemetryStream::Heartbeat => "OK",
            TelemetryStream::Arrival => {
                let _ = write!(
                    data,
                    "route={},stop={},eta={}",
                    self.state.route_id(),
                    self.stop_id,
                    self.state.eta_minutes()
                );
                data.as_str()
            }
            TelemetryStream::Delay => self.delay_payload.as_str(),
        };

        let node_id = self.state.node_id();
        match encode(
            stream.message_type().as_wire(),
            node_id,
            self.version.has_seq().then_some(seq),
            text,
        ) {
            Ok(frame) => Transmit::Encoded(frame),
            Err(e) => self.fallback(e),
        }
    }

    fn reject(&mut self, error: NodeError, host_seq: Option<u8>) -> Outcome {
        let reason = match error.reason() {
            Some(reason) => reason,
            None => return Outcome::Dropped(error),
        };

        let seq = self.reply_seq(host_seq);
        let reply = Reply::error(reason);
        let reply = match self.encode_reply(&reply, seq) {
            Ok(frame) => Transmit::Encoded(frame),
            Err(e) => self.fallback(e),
        };
        Outcome::Rejected { error, reply }
    }

    /// Echo the host SEQ when known, otherwise allocate one
    fn reply_seq(&mut self, host_seq: Option<u8>) -> Option<u8> {
        if !self.version.has_seq() {
            return None;
        }
        Some(host_seq.unwrap_or_else(|| self.tx_seq.next()))
    }

    fn encode_reply(&self, reply: &Reply, seq: Option<u8>) -> Result<OutFrame, EncodeError> {
        encode(reply.msg_type.as_wire(), self.state.node_id(), seq, &reply.data)
    }

    fn fallback(&self, error: EncodeError) -> Transmit {
        match error {
            EncodeError::PayloadTooLarge => Transmit::Literal(self.tx_too_long.clone()),
            EncodeError::FrameTooLarge => Transmit::Literal(self.frame_too_long.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayline_protocol::{checksum_xor, FIELD_DELIMITER};

    fn body(frame: &[u8]) -> &[u8] {
        &frame[1..frame.len() - 1]
    }

    fn command(seq: u8, data: &str) -> OutFrame {
        encode("CMD", "HOST", Some(seq), data).unwrap()
    }

    fn reply_of(outcome: &Outcome, version: ProtocolVersion) -> (std::string::String, Option<u8>, std::string::String) {
        let frame = outcome.transmit().expect("reply expected");
        let msg = decode(body(frame.as_bytes()), version).unwrap();
        (msg.msg_type.into(), msg.seq, msg.data.into())
    }

    #[test]
    fn test_ping_echoes_seq() {
        let mut node = Node::new(&NodeConfig::default(), 0);
        let outcome = node.handle_frame(body(&command(7, "PING")));

        assert!(matches!(outcome, Outcome::Replied(_)));
        let (msg_type, seq, data) = reply_of(&outcome, ProtocolVersion::Sequenced);
        assert_eq!(msg_type, "ACK");
        assert_eq!(seq, Some(7));
        assert_eq!(data, "PONG");
    }

    #[test]
    fn test_duplicate_dropped_silently() {
        let mut node = Node::new(&NodeConfig::default(), 0);
        let frame = command(4, "SETETA=9");

        assert!(node.handle_frame(body(&frame)).transmit().is_some());
        node.state.set_eta(1);

        let outcome = node.handle_frame(body(&frame));
        assert_eq!(outcome, Outcome::Dropped(NodeError::DuplicateSequence(4)));
        // Not re-executed
        assert_eq!(node.state().eta_minutes(), 1);
    }

    #[test]
    fn test_checksum_error_echoes_seq() {
        let mut node = Node::new(&NodeConfig::default(), 0);
        let outcome = node.handle_frame(b"CMD|HOST|12|PING|00");

        assert!(matches!(
            outcome.error(),
            Some(NodeError::ChecksumMismatch { received: 0, .. })
        ));
        let (msg_type, seq, data) = reply_of(&outcome, ProtocolVersion::Sequenced);
        assert_eq!(msg_type, "ERR");
        assert_eq!(seq, Some(12));
        assert_eq!(data, "CHK");
    }

    #[test]
    fn test_checksum_error_does_not_touch_watermark() {
        let mut node = Node::new(&NodeConfig::default(), 0);
        node.handle_frame(b"CMD|HOST|5|PING|00");

        let outcome = node.handle_frame(body(&command(5, "PING")));
        assert!(matches!(outcome, Outcome::Replied(_)));
    }

    #[test]
    fn test_format_error_without_seq_uses_tx_seq() {
        let mut node = Node::new(&NodeConfig::default(), 0);
        let outcome = node.handle_frame(b"GARBAGE");

        assert_eq!(outcome.error(), Some(NodeError::Format));
        let (msg_type, seq, data) = reply_of(&outcome, ProtocolVersion::Sequenced);
        assert_eq!(msg_type, "ERR");
        assert_eq!(seq, Some(0));
        assert_eq!(data, "FORMAT");
        assert_eq!(node.next_tx_seq(), 1);
    }

    #[test]
    fn test_overflow_reply() {
        let mut node = Node::new(&NodeConfig::default(), 0);
        let outcome = node.handle(&Inbound::Overflow);

        assert_eq!(outcome.error(), Some(NodeError::BufferOverflow));
        let (msg_type, _, data) = reply_of(&outcome, ProtocolVersion::Sequenced);
        assert_eq!(msg_type, "ERR");
        assert_eq!(data, "RX_OVERFLOW");
    }

    #[test]
    fn test_unknown_command() {
        let mut node = Node::new(&NodeConfig::default(), 0);
        let outcome = node.handle_frame(body(&command(1, "SELFDESTRUCT")));

        assert_eq!(outcome.error(), Some(NodeError::UnknownCommand));
        let (msg_type, seq, data) = reply_of(&outcome, ProtocolVersion::Sequenced);
        assert_eq!(msg_type, "ERR");
        assert_eq!(seq, Some(1));
        assert_eq!(data, "UNKNOWN_CMD");
    }

    #[test]
    fn test_non_command_ignored_by_default() {
        let mut node = Node::new(&NodeConfig::default(), 0);
        let frame = encode("HB", "HOST", Some(3), "OK").unwrap();
        assert_eq!(node.handle_frame(body(&frame)), Outcome::Ignored);

        // Unknown TYPE text is not a command either
        let frame = encode("XYZ", "HOST", Some(3), "OK").unwrap();
        assert_eq!(node.handle_frame(body(&frame)), Outcome::Ignored);
    }

    #[test]
    fn test_non_command_reply_policy() {
        let mut config = NodeConfig::default();
        config.unknown_type = Some(UnknownTypePolicy::Reply);
        let mut node = Node::new(&config, 0);

        let frame = encode("HB", "HOST", Some(3), "OK").unwrap();
        let outcome = node.handle_frame(body(&frame));
        assert_eq!(outcome.error(), Some(NodeError::UnknownType));
        let (_, seq, data) = reply_of(&outcome, ProtocolVersion::Sequenced);
        assert_eq!(seq, Some(3));
        assert_eq!(data, "UNKNOWN_TYPE");
    }

    #[test]
    fn test_legacy_revision() {
        let mut config = NodeConfig::default();
        config.protocol = ProtocolVersion::Legacy;
        let mut node = Node::new(&config, 0);

        let ping = encode("CMD", "HOST", None, "PING").unwrap();
        let outcome = node.handle_frame(body(&ping));
        let (msg_type, seq, data) = reply_of(&outcome, ProtocolVersion::Legacy);
        assert_eq!((msg_type.as_str(), seq, data.as_str()), ("ACK", None, "PONG"));

        // No dedup without SEQ
        assert!(matches!(node.handle_frame(body(&ping)), Outcome::Replied(_)));

        // Legacy default answers non-commands
        let hb = encode("HB", "HOST", None, "OK").unwrap();
        let outcome = node.handle_frame(body(&hb));
        assert_eq!(outcome.error(), Some(NodeError::UnknownType));
    }

    #[test]
    fn test_telemetry_frames() {
        let mut node = Node::new(&NodeConfig::default(), 100);
        assert!(node.poll(5099).is_empty());

        let frames = node.poll(10_100);
        assert_eq!(frames.len(), 2);

        let hb = decode(body(frames[0].as_bytes()), ProtocolVersion::Sequenced).unwrap();
        assert_eq!((hb.msg_type, hb.node, hb.seq, hb.data), ("HB", "BUS01", Some(0), "OK"));

        let arr = decode(body(frames[1].as_bytes()), ProtocolVersion::Sequenced).unwrap();
        assert_eq!(arr.msg_type, "ARR");
        assert_eq!(arr.seq, Some(1));
        assert_eq!(arr.data, "route=25B,stop=STOP12,eta=3");

        let frames = node.poll(30_100);
        let dl = decode(body(frames[2].as_bytes()), ProtocolVersion::Sequenced).unwrap();
        assert_eq!(dl.msg_type, "DL");
        assert_eq!(dl.data, "+5MIN");
    }

    #[test]
    fn test_arrival_reflects_commands() {
        let mut node = Node::new(&NodeConfig::default(), 0);
        node.handle_frame(body(&command(1, "SETROUTE=12A")));
        node.handle_frame(body(&command(2, "SETETA=7")));

        let frames = node.poll(10_000);
        let arr = decode(body(frames[1].as_bytes()), ProtocolVersion::Sequenced).unwrap();
        assert_eq!(arr.data, "route=12A,stop=STOP12,eta=7");
    }

    #[test]
    fn test_tx_seq_wraps_after_256_emissions() {
        let mut config = NodeConfig::default();
        config.telemetry.arrival_ms = u32::MAX;
        config.telemetry.delay_ms = u32::MAX;
        let mut node = Node::new(&config, 0);

        let initial = node.next_tx_seq();
        for i in 1..=256u32 {
            assert_eq!(node.poll(i * 5000).len(), 1);
        }
        assert_eq!(node.next_tx_seq(), initial);
    }

    #[test]
    fn test_fallback_literals_are_valid_frames() {
        let node = Node::new(&NodeConfig::default(), 0);
        for error in [EncodeError::PayloadTooLarge, EncodeError::FrameTooLarge] {
            let literal = node.fallback(error);
            let raw = body(literal.as_bytes());
            let msg = decode(raw, ProtocolVersion::Sequenced).unwrap();
            assert_eq!(msg.msg_type, "ERR");
            assert_eq!(msg.seq, Some(0));

            let split = raw.iter().rposition(|&b| b == FIELD_DELIMITER).unwrap();
            assert_eq!(msg.checksum, checksum_xor(&raw[..split]));
        }
        assert!(matches!(
            node.fallback(EncodeError::FrameTooLarge),
            Transmit::Literal(ref f) if f.as_bytes().windows(12).any(|w| w == b"FRM_TOO_LONG")
        ));
    }

    #[cfg(feature = "defmt")]
    #[test]
    fn test_node_events_are_loggable() {
        fn loggable<T: defmt::Format>() {}
        loggable::<Inbound>();
        loggable::<Transmit>();
        loggable::<Outcome>();
        loggable::<NodeError>();
    }

    #[test]
    fn test_error_conversions() {
        assert_eq!(NodeError::from(DecodeError::Format), NodeError::Format);
        assert_eq!(NodeError::from(FrameError::Overflow), NodeError::BufferOverflow);
        assert_eq!(NodeError::from(EncodeError::FrameTooLarge), NodeError::FrameTooLarge);
        assert_eq!(NodeError::DuplicateSequence(1).reason(), None);
    }
}
