//! Synchronous link driver
//!
//! Runs the whole receive pipeline (assembler → node → transport) inside
//! the caller's context, one byte at a time, plus telemetry on `poll`.
//! Suitable for a single-context main loop or a byte-arrival interrupt
//! that owns the link exclusively. Boards that split receive and
//! processing across tasks feed [`crate::node::Node`] directly instead.

use wayline_protocol::{FrameAssembler, FrameError};

use crate::config::NodeConfig;
use crate::node::{Node, Outcome};
use crate::traits::{Clock, Transport};

/// Assembler, node, transport and clock bundled together
pub struct Link<T: Transport, C: Clock> {
    assembler: FrameAssembler,
    node: Node,
    transport: T,
    clock: C,
}

impl<T: Transport, C: Clock> Link<T, C> {
    /// Create a link; telemetry timers start at the clock's current time
    pub fn new(config: &NodeConfig, transport: T, clock: C) -> Self {
        let node = Node::new(config, clock.now_ms());
        Self {
            assembler: FrameAssembler::new(),
            node,
            transport,
            clock,
        }
    }

    /// Process one received byte
    ///
    /// Returns the outcome when the byte completed a frame or overflowed
    /// the buffer, after any reply has been written.
    pub fn on_byte(&mut self, byte: u8) -> Result<Option<Outcome>, T::Error> {
        let outcome = match self.assembler.on_byte(byte) {
            Ok(Some(frame)) => self.node.handle_frame(&frame),
            Ok(None) => return Ok(None),
            Err(FrameError::Overflow) => self.node.handle_overflow(),
        };

        if let Some(frame) = outcome.transmit() {
            self.transport.transmit(frame.as_bytes())?;
            self.transport.flush()?;
        }
        Ok(Some(outcome))
    }

    /// Send any telemetry that is due; returns the number of frames sent
    pub fn poll(&mut self) -> Result<usize, T::Error> {
        let frames = self.node.poll(self.clock.now_ms());
        for frame in &frames {
            self.transport.transmit(frame.as_bytes())?;
        }
        if !frames.is_empty() {
            self.transport.flush()?;
        }
        Ok(frames.len())
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
