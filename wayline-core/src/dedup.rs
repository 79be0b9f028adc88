//! Host command deduplication
//!
//! The host retries a command when its reply does not arrive in time. A
//! retry reuses the command's SEQ, so a repeat of the last accepted SEQ is
//! a duplicate and must not be executed twice.
//!
//! Only the most recent SEQ is remembered. A duplicate older than the
//! previous command is not detected, and after 256 commands an old SEQ
//! aliases a new one.

use wayline_protocol::MessageType;

/// One-deep sequence watermark
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SequenceDeduplicator {
    /// `None` until the first command is accepted
    last_host_seq: Option<u8>,
}

impl SequenceDeduplicator {
    pub const fn new() -> Self {
        Self {
            last_host_seq: None,
        }
    }

    /// Decide whether a frame should be processed
    ///
    /// Non-command frames always pass and leave the watermark untouched.
    /// A command is rejected iff `seq` equals the last accepted SEQ;
    /// otherwise it becomes the new watermark.
    pub fn accept(&mut self, msg_type: MessageType, seq: u8) -> bool {
        if msg_type != MessageType::Command {
            return true;
        }
        if self.last_host_seq == Some(seq) {
            return false;
        }
        self.last_host_seq = Some(seq);
        true
    }

    /// Last accepted command SEQ
    pub fn last(&self) -> Option<u8> {
        self.last_host_seq
    }
}
