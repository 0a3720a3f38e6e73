//! Build script for spinwatch-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates monitor.toml at compile time, with both `toml` and the
//!   firmware's own parser
//! - Rebuilds when the Wi-Fi credentials change

use std::collections::HashSet;
use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

const MAX_MACHINES: usize = 4;
const MAX_LABEL_LEN: usize = 16;
const MAX_URL_LEN: usize = 128;
const ADC_PINS: [&str; 3] = ["gpio26", "gpio27", "gpio28"];

fn main() {
    setup_linker();
    validate_config();

    println!("cargo:rerun-if-env-changed=SPINWATCH_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=SPINWATCH_WIFI_PASSWORD");
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate monitor.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=monitor.toml");

    let config_path = Path::new("monitor.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: monitor.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds monitor.toml at build time.                 ║\n\
            ║  Please create one in the spinwatch-firmware directory.          ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read monitor.toml                              ║\n\
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
                ║  ERROR: Invalid TOML syntax in monitor.toml                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&e.to_string())
            );
        }
    };

    report("Invalid section layout", validate_sections(&config));
    report("Invalid [monitor] settings", validate_monitor(&config));
    report("Invalid [notify] settings", validate_notify(&config));
    report("Invalid machine configuration", validate_machines(&config));
    check_runtime_parser(&config_content);

    println!("cargo:warning=monitor.toml validated successfully");
}

/// Run the parser the firmware uses at boot
///
/// A file that passes the checks above but fails here would silently
/// boot into the fallback config, so the build stops instead.
fn check_runtime_parser(content: &str) {
    if let Err(e) = spinwatch_core::config::parse_config(content) {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: monitor.toml rejected by the firmware parser             ║\n\
            ║                                                                  ║\n\
            ║  Error: {:<56} ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            format!("{:?}", e)
        );
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

/// Fail the build with a boxed list of errors
fn report(title: &str, errors: Vec<String>) {
    if errors.is_empty() {
        return;
    }
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Only [monitor], [notify] and [machine.*] are understood
fn validate_sections(config: &toml::Value) -> Vec<String> {
    let mut errors = Vec::new();

    if let Some(table) = config.as_table() {
        for (name, value) in table {
            match name.as_str() {
                "monitor" | "notify" | "machine" => {
                    if !value.is_table() {
                        errors.push(format!("[{}] must be a table", name));
                    }
                }
                other => errors.push(format!("unknown section [{}]", other)),
            }
        }
    }

    if config.get("machine").is_none() {
        errors.push("Missing [machine.*] section - nothing to monitor".to_string());
    }

    errors
}

fn validate_monitor(config: &toml::Value) -> Vec<String> {
    let mut errors = Vec::new();
    let Some(monitor) = config.get("monitor").and_then(|m| m.as_table()) else {
        return errors;
    };

    if let Some(value) = monitor.get("calibration_mode") {
        if !value.is_bool() {
            errors.push("calibration_mode must be true or false".to_string());
        }
    }

    for key in ["poll_interval_ms", "calibration_poll_interval_ms"] {
        if let Some(value) = monitor.get(key) {
            match value.as_integer() {
                Some(ms) if ms >= 1 && ms <= u32::MAX as i64 => {}
                _ => errors.push(format!("{} must be a positive integer", key)),
            }
        }
    }

    if let Some(value) = monitor.get("status_port") {
        match value.as_integer() {
            Some(port) if (1..=65535).contains(&port) => {}
            _ => errors.push("status_port must be 1-65535".to_string()),
        }
    }

    errors
}

fn validate_notify(config: &toml::Value) -> Vec<String> {
    let mut errors = Vec::new();
    let Some(notify) = config.get("notify").and_then(|n| n.as_table()) else {
        return errors;
    };

    if let Some(value) = notify.get("push_url") {
        check_url("[notify] push_url", value, &mut errors);
    }

    errors
}

fn validate_machines(config: &toml::Value) -> Vec<String> {
    let mut errors = Vec::new();
    let Some(machines) = config.get("machine").and_then(|m| m.as_table()) else {
        return errors;
    };

    let mut pins = HashSet::new();
    let mut enabled_count = 0;

    for (name, machine) in machines {
        let machine = match machine {
            toml::Value::Table(t) => t,
            _ => {
                errors.push(format!("[machine.{}] must be a table", name));
                continue;
            }
        };

        if name.len() > MAX_LABEL_LEN {
            errors.push(format!("[machine.{}] name longer than {} bytes", name, MAX_LABEL_LEN));
        }

        let enabled = machine
            .get("enabled")
            .and_then(|e| e.as_bool())
            .unwrap_or(true);

        match machine.get("sensor_pin") {
            Some(toml::Value::String(pin)) => {
                if !ADC_PINS.contains(&pin.as_str()) {
                    errors.push(format!(
                        "[machine.{}] sensor_pin must be gpio26, gpio27 or gpio28",
                        name
                    ));
                } else if enabled && !pins.insert(pin.clone()) {
                    errors.push(format!("[machine.{}] sensor_pin {} already in use", name, pin));
                }
            }
            Some(_) => errors.push(format!("[machine.{}] sensor_pin must be a string", name)),
            None => {}
        }

        if let Some(value) = machine.get("webhook_url") {
            check_url(&format!("[machine.{}] webhook_url", name), value, &mut errors);
        }

        if let Some(value) = machine.get("threshold") {
            match value.as_integer() {
                Some(t) if (0..=65535).contains(&t) => {}
                _ => errors.push(format!("[machine.{}] threshold must be 0-65535", name)),
            }
        }

        for key in ["start_confirm_s", "cooldown_s", "false_alarm_s", "sample_delay_ms"] {
            if let Some(value) = machine.get(key) {
                match value.as_integer() {
                    Some(v) if v >= 0 && v <= u32::MAX as i64 => {}
                    _ => errors.push(format!("[machine.{}] {} must be non-negative", name, key)),
                }
            }
        }

        if let Some(value) = machine.get("sample_count") {
            match value.as_integer() {
                Some(n) if (1..=65535).contains(&n) => {}
                _ => errors.push(format!("[machine.{}] sample_count must be 1-65535", name)),
            }
        }

        if let Some(value) = machine.get("sample_mode") {
            match value.as_str() {
                Some("average" | "peak") => {}
                _ => errors.push(format!(
                    "[machine.{}] sample_mode must be 'average' or 'peak'",
                    name
                )),
            }
        }

        if enabled {
            enabled_count += 1;
        }
    }

    if enabled_count > MAX_MACHINES {
        errors.push(format!("at most {} machines may be enabled", MAX_MACHINES));
    }

    errors
}

fn check_url(key: &str, value: &toml::Value, errors: &mut Vec<String>) {
    match value.as_str() {
        Some(url) if url.len() > MAX_URL_LEN => {
            errors.push(format!("{} longer than {} bytes", key, MAX_URL_LEN));
        }
        Some(url) if !url.is_empty() && !url.starts_with("http://") => {
            errors.push(format!("{} must start with http://", key));
        }
        Some(_) => {}
        None => errors.push(format!("{} must be a string", key)),
    }
}
