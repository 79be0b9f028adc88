//! Device identity and configuration record

use heapless::String;

use crate::config::{NodeConfig, NodeId, RouteId};

/// Node identity, route and ETA
///
/// `node_id` is fixed for the node's lifetime. `route_id` and
/// `eta_minutes` are written only by command dispatch and read by
/// dispatch (STATUS) and telemetry (ARR).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceState {
    node_id: NodeId,
    route_id: RouteId,
    eta_minutes: i32,
}

impl DeviceState {
    /// Create the boot-time state, cutting strings to their capacity
    pub fn new(node_id: &str, route_id: &str, eta_minutes: i32) -> Self {
        Self {
            node_id: truncated(node_id),
            route_id: truncated(route_id),
            eta_minutes,
        }
    }

    /// Boot-time state from configuration
    pub fn from_config(config: &NodeConfig) -> Self {
        Self {
            node_id: config.node_id.clone(),
            route_id: config.route_id.clone(),
            eta_minutes: config.eta_minutes,
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn route_id(&self) -> &str {
        &self.route_id
    }

    pub fn eta_minutes(&self) -> i32 {
        self.eta_minutes
    }

    /// Replace the route, cut to capacity on a character boundary
    pub fn set_route(&mut self, route_id: &str) {
        self.route_id = truncated(route_id);
    }

    pub fn set_eta(&mut self, eta_minutes: i32) {
        self.eta_minutes = eta_minutes;
    }
}

/// Longest prefix of `value` that fits in `N` bytes
pub(crate) fn truncated<const N: usize>(value: &str) -> String<N> {
    let mut end = value.len().min(N);
    while !value.is_char_boundary(end) {
        end -= 1;
    }

    let mut out = String::new();
    let _ = out.push_str(&value[..end]);
    out
}
