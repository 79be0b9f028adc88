//! Inter-task communication channels
//!
//! The receive task produces, the node task is the only consumer.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use wayline_core::node::Inbound;

/// Channel capacity for inbound frames
const INBOUND_CHANNEL_SIZE: usize = 4;

/// Complete frames and overflow notices from the UART receiver
pub static INBOUND: Channel<CriticalSectionRawMutex, Inbound, INBOUND_CHANNEL_SIZE> =
    Channel::new();
