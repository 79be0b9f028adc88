//! Collaborator traits
//!
//! The protocol engine needs exactly two things from the board: a way to
//! push bytes out and a millisecond clock. Board crates implement these
//! for their UART and timer peripherals.

pub mod clock;
pub mod transport;

pub use clock::Clock;
pub use transport::Transport;
