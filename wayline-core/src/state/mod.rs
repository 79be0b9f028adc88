//! Mutable node state
//!
//! Device identity/configuration record and the outbound sequence counter.
//! Both are owned by [`crate::node::Node`]; nothing here is global.

pub mod device;
pub mod sequence;

pub use device::DeviceState;
pub use sequence::TxSequence;
