//! Parser for `node.toml`
//!
//! This is a minimal TOML parser that handles only the subset needed for
//! node configuration. It does NOT support the full TOML spec.
//!
//! Supported features:
//! - `[node]`, `[protocol]` and `[telemetry]` section headers
//! - Key = value pairs (quoted string or integer)
//! - Comments (# ...)
//!
//! NOT supported:
//! - Escapes inside strings
//! - Arrays, inline tables, booleans
//! - Dotted keys

use heapless::String;

use wayline_protocol::{ProtocolVersion, FIELD_DELIMITER, FRAME_END, FRAME_START};

use super::types::{NodeConfig, UnknownTypePolicy};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Key not valid in its section
    UnknownKey,
    /// Malformed line or value of the wrong type
    InvalidValue,
    /// String value longer than its field allows
    TooLong,
    /// `[node] id` was never set
    MissingNodeId,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Node,
    Protocol,
    Telemetry,
}

/// Parse `node.toml` text into a [`NodeConfig`]
///
/// Keys that are not present keep their [`NodeConfig::default`] values,
/// except `[node] id` which is required.
pub fn parse_config(input: &str) -> Result<NodeConfig, ConfigError> {
    let mut config = NodeConfig::default();
    let mut section = Section::Root;
    let mut has_node_id = false;

    for line in input.lines() {
        let line = strip_comment(line).trim();

        // Skip empty lines and comments
        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        let (key, value) = line.split_once('=').ok_or(ConfigError::InvalidValue)?;
        let (key, value) = (key.trim(), value.trim());

        match section {
            Section::Root => return Err(ConfigError::UnknownKey),
            Section::Node => match key {
                "id" => {
                    let id = parse_string(value)?;
                    if id.is_empty() || id.bytes().any(|b| b == FIELD_DELIMITER) {
                        return Err(ConfigError::InvalidValue);
                    }
                    config.node_id = bounded(id)?;
                    has_node_id = true;
                }
                "route" => config.route_id = bounded(parse_string(value)?)?,
                "eta_minutes" => config.eta_minutes = parse_int(value)?,
                "stop" => config.stop_id = bounded(parse_string(value)?)?,
                _ => return Err(ConfigError::UnknownKey),
            },
            Section::Protocol => match key {
                "version" => {
                    config.protocol = ProtocolVersion::from_name(parse_string(value)?)
                        .ok_or(ConfigError::InvalidValue)?;
                }
                "unknown_type" => {
                    config.unknown_type = Some(match parse_string(value)? {
                        "ignore" => UnknownTypePolicy::Ignore,
                        "reply" => UnknownTypePolicy::Reply,
                        _ => return Err(ConfigError::InvalidValue),
                    });
                }
                _ => return Err(ConfigError::UnknownKey),
            },
            Section::Telemetry => match key {
                "heartbeat_ms" => config.telemetry.heartbeat_ms = parse_interval(value)?,
                "arrival_ms" => config.telemetry.arrival_ms = parse_interval(value)?,
                "delay_ms" => config.telemetry.delay_ms = parse_interval(value)?,
                "delay_payload" => config.telemetry.delay_payload = bounded(parse_string(value)?)?,
                _ => return Err(ConfigError::UnknownKey),
            },
        }
    }

    if !has_node_id {
        return Err(ConfigError::MissingNodeId);
    }

    Ok(config)
}

fn parse_section_header(name: &str) -> Result<Section, ConfigError> {
    match name.trim() {
        "node" => Ok(Section::Node),
        "protocol" => Ok(Section::Protocol),
        "telemetry" => Ok(Section::Telemetry),
        _ => Err(ConfigError::InvalidSection),
    }
}

/// Cut a line at the first `#` that is not inside a string
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (i, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

fn parse_string(value: &str) -> Result<&str, ConfigError> {
    let inner = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or(ConfigError::InvalidValue)?;

    if inner.contains('"') || inner.bytes().any(|b| b == FRAME_START || b == FRAME_END) {
        return Err(ConfigError::InvalidValue);
    }
    Ok(inner)
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue)
}

fn parse_interval(value: &str) -> Result<u32, ConfigError> {
    match parse_int::<u32>(value)? {
        0 => Err(ConfigError::InvalidValue),
        ms => Ok(ms),
    }
}

fn bounded<const N: usize>(value: &str) -> Result<String<N>, ConfigError> {
    let mut out = String::new();
    out.push_str(value).map_err(|_| ConfigError::TooLong)?;
    Ok(out)
}
