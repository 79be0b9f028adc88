//! Outbound byte sink
//!
//! Frames leave the node through a single primitive: hand over a complete
//! frame and return once the bytes are on their way. Receiving is not part
//! of this trait; the receive side pushes bytes into the engine itself.

/// Blocking frame transmitter
pub trait Transport {
    type Error;

    /// Send every byte of `frame`, returning once all of it has been queued
    fn transmit(&mut self, frame: &[u8]) -> Result<(), Self::Error>;

    /// Wait until queued bytes have left the wire
    fn flush(&mut self) -> Result<(), Self::Error>;
}
