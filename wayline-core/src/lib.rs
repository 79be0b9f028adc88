//! Board-agnostic protocol engine for a wayline transit node
//!
//! This crate contains everything between the serial transport and the
//! host that does not depend on a specific microcontroller:
//!
//! - Device state (node identity, route, ETA) and sequence counters
//! - Command deduplication and dispatch
//! - Telemetry scheduling
//! - The [`node::Node`] context tying them together
//! - Node configuration types and the `node.toml` parser
//! - Transport and clock traits, and a synchronous [`link::Link`] driver

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod dedup;
pub mod dispatch;
pub mod link;
pub mod node;
pub mod state;
pub mod telemetry;
pub mod traits;
