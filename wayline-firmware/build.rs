//! Build script for wayline-firmware
//!
//! - Passes the cortex-m-rt and defmt linker scripts
//! - Validates node.toml at compile time, both as TOML and with the
//!   boot-time parser, so anything the firmware would reject fails here

use std::fs;
use std::path::Path;

use wayline_core::config::ConfigError;

/// Longest node, route or stop id accepted by the firmware
const MAX_ID_LEN: usize = 15;

/// Longest DL payload accepted by the firmware
const MAX_DELAY_PAYLOAD_LEN: usize = 32;

fn main() {
    setup_linker();
    validate_config();
}

/// Linker scripts; memory.x comes from embassy-stm32's `memory-x` feature
fn setup_linker() {
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate node.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=node.toml");

    let config_path = Path::new("node.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: node.toml not found!                                     ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds node.toml as its configuration.             ║\n\
            ║  Please create one in the wayline-firmware directory.            ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read node.toml                                 ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in node.toml                         ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&e.to_string())
            );
        }
    };

    let mut errors = Vec::new();
    validate_node(&config, &mut errors);
    validate_protocol(&config, &mut errors);
    validate_telemetry(&config, &mut errors);
    validate_boot_parse(&config_content, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid node.toml                                        ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=node.toml validated successfully");
}

/// Run the firmware's own parser over the file
///
/// The boot parser reads a TOML subset: no literal strings, no `_` in
/// integers, no dotted or nested tables. Valid TOML outside that subset
/// would otherwise boot on default settings.
fn validate_boot_parse(content: &str, errors: &mut Vec<String>) {
    if let Err(e) = wayline_core::config::parse_config(content) {
        let reason = match e {
            ConfigError::InvalidSection => "unknown or nested section header",
            ConfigError::UnknownKey => "key not valid in its section",
            ConfigError::InvalidValue => "value outside the supported subset",
            ConfigError::TooLong => "string longer than its field allows",
            ConfigError::MissingNodeId => "[node] id is required",
        };
        errors.push(format!("boot parser: {}", reason));
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Check a string id: present if required, length, no wire delimiters
fn check_id(table: &toml::Table, key: &str, required: bool, errors: &mut Vec<String>) {
    match table.get(key) {
        Some(toml::Value::String(id)) => {
            if id.is_empty() && required {
                errors.push(format!("[node] {} cannot be empty", key));
            }
            if id.len() > MAX_ID_LEN {
                errors.push(format!("[node] {} longer than {} bytes", key, MAX_ID_LEN));
            }
            if id.contains(['|', '\u{2}', '\u{3}', '"']) {
                errors.push(format!("[node] {} contains a reserved character", key));
            }
        }
        Some(_) => errors.push(format!("[node] {} must be a string", key)),
        None if required => errors.push(format!("[node] missing '{}'", key)),
        None => {}
    }
}

/// Validate the [node] section
fn validate_node(config: &toml::Value, errors: &mut Vec<String>) {
    let node = match config.get("node") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[node] must be a table".to_string());
            return;
        }
        None => {
            errors.push("Missing [node] section - node id is required".to_string());
            return;
        }
    };

    check_id(node, "id", true, errors);
    check_id(node, "route", false, errors);
    check_id(node, "stop", false, errors);

    match node.get("eta_minutes") {
        Some(toml::Value::Integer(eta)) if i32::try_from(*eta).is_err() => {
            errors.push("[node] eta_minutes out of range".to_string());
        }
        Some(toml::Value::Integer(_)) | None => {}
        Some(_) => errors.push("[node] eta_minutes must be an integer".to_string()),
    }
}

/// Validate the optional [protocol] section
fn validate_protocol(config: &toml::Value, errors: &mut Vec<String>) {
    let protocol = match config.get("protocol") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[protocol] must be a table".to_string());
            return;
        }
        None => return,
    };

    if let Some(version) = protocol.get("version") {
        if !matches!(version.as_str(), Some("legacy" | "sequenced")) {
            errors.push("[protocol] version must be 'legacy' or 'sequenced'".to_string());
        }
    }

    if let Some(policy) = protocol.get("unknown_type") {
        if !matches!(policy.as_str(), Some("ignore" | "reply")) {
            errors.push("[protocol] unknown_type must be 'ignore' or 'reply'".to_string());
        }
    }
}

/// Validate the optional [telemetry] section
fn validate_telemetry(config: &toml::Value, errors: &mut Vec<String>) {
    let telemetry = match config.get("telemetry") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[telemetry] must be a table".to_string());
            return;
        }
        None => return,
    };

    for key in ["heartbeat_ms", "arrival_ms", "delay_ms"] {
        match telemetry.get(key) {
            Some(toml::Value::Integer(ms)) => {
                if *ms <= 0 || *ms > i64::from(u32::MAX) {
                    errors.push(format!("[telemetry] {} must be 1-{}", key, u32::MAX));
                }
            }
            Some(_) => errors.push(format!("[telemetry] {} must be an integer", key)),
            None => {}
        }
    }

    match telemetry.get("delay_payload") {
        Some(toml::Value::String(payload)) => {
            if payload.len() > MAX_DELAY_PAYLOAD_LEN {
                errors.push(format!(
                    "[telemetry] delay_payload longer than {} bytes",
                    MAX_DELAY_PAYLOAD_LEN
                ));
            }
        }
        Some(_) => errors.push("[telemetry] delay_payload must be a string".to_string()),
        None => {}
    }
}
