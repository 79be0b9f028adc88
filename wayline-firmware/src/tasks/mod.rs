//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels.

pub mod node;
pub mod uart_rx;

pub use node::node_task;
pub use uart_rx::uart_rx_task;
