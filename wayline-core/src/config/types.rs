//! Configuration type definitions
//!
//! These types describe a node's identity, protocol revision and
//! telemetry schedule. They are parsed from `node.toml` at boot.

use heapless::String;

use wayline_protocol::{ProtocolVersion, NODE_ID_CAPACITY};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum route identifier length
pub const ROUTE_ID_CAPACITY: usize = 15;

/// Maximum stop identifier length
pub const STOP_ID_CAPACITY: usize = 15;

/// Maximum delay telemetry payload length
pub const DELAY_PAYLOAD_CAPACITY: usize = 32;

/// Node identifier
pub type NodeId = String<NODE_ID_CAPACITY>;

/// Route identifier
pub type RouteId = String<ROUTE_ID_CAPACITY>;

/// Stop identifier
pub type StopId = String<STOP_ID_CAPACITY>;

/// How the node answers valid frames that are not commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UnknownTypePolicy {
    /// Drop silently
    Ignore,
    /// Reply `ERR UNKNOWN_TYPE`
    Reply,
}

impl UnknownTypePolicy {
    /// Policy used when the configuration does not name one
    pub fn default_for(version: ProtocolVersion) -> Self {
        match version {
            ProtocolVersion::Legacy => UnknownTypePolicy::Reply,
            ProtocolVersion::Sequenced => UnknownTypePolicy::Ignore,
        }
    }
}

/// Telemetry schedule
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TelemetryConfig {
    /// Heartbeat interval (ms)
    pub heartbeat_ms: u32,
    /// Arrival update interval (ms)
    pub arrival_ms: u32,
    /// Delay event interval (ms)
    pub delay_ms: u32,
    /// DATA sent with every delay event
    pub delay_payload: String<DELAY_PAYLOAD_CAPACITY>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        let mut delay_payload = String::new();
        let _ = delay_payload.push_str("+5MIN");
        Self {
            heartbeat_ms: 5_000,
            arrival_ms: 10_000,
            delay_ms: 30_000,
            delay_payload,
        }
    }
}

/// Complete node configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeConfig {
    /// Identifier sent in the NODE field of every frame
    pub node_id: NodeId,
    /// Route at boot, later changed by `SETROUTE`
    pub route_id: RouteId,
    /// ETA at boot, later changed by `SETETA`
    pub eta_minutes: i32,
    /// Stop reported in arrival telemetry
    pub stop_id: StopId,
    /// Wire protocol revision
    pub protocol: ProtocolVersion,
    /// Explicit unknown-type policy, or `None` for the revision default
    pub unknown_type: Option<UnknownTypePolicy>,
    /// Telemetry schedule
    pub telemetry: TelemetryConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: fixed("BUS01"),
            route_id: fixed("25B"),
            eta_minutes: 3,
            stop_id: fixed("STOP12"),
            protocol: ProtocolVersion::Sequenced,
            unknown_type: None,
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Unknown-type policy in effect
    pub fn unknown_type_policy(&self) -> UnknownTypePolicy {
        self.unknown_type
            .unwrap_or_else(|| UnknownTypePolicy::default_for(self.protocol))
    }
}

fn fixed<const N: usize>(value: &str) -> String<N> {
    let mut out = String::new();
    let _ = out.push_str(value);
    out
}
