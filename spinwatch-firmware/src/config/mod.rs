//! Configuration loading
//!
//! The monitor configuration is embedded at build time from `monitor.toml`
//! and parsed once at boot. Wi-Fi credentials come from the build
//! environment.

use defmt::*;
use heapless::String;

use spinwatch_core::config::{parse_config, MachineConfig, MonitorConfig};

/// Embedded configuration (compiled into firmware)
/// Edit monitor.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../../monitor.toml");

/// Parse the embedded configuration
///
/// Falls back to a single washer on GPIO27 if `monitor.toml` is broken.
/// The build script validates the file, so this only happens when the
/// firmware parser and the build-time check disagree.
pub fn load_config() -> MonitorConfig {
    let config = parse_or_fallback();
    if !config.has_sinks() {
        warn!("No push_url or webhook_url configured, finished cycles will not be sent");
    }
    config
}

fn parse_or_fallback() -> MonitorConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!(
                "Parsed embedded configuration: {} machine(s)",
                config.machines.len()
            );
            config
        }
        Err(e) => {
            error!("Failed to parse embedded config: {:?}", e);
            error!("Using minimal fallback configuration");
            minimal_fallback_config()
        }
    }
}

/// Last-resort configuration: one washer, default thresholds
fn minimal_fallback_config() -> MonitorConfig {
    let mut config = MonitorConfig::new();

    let mut name: String<16> = String::new();
    let _ = name.push_str("Washer");
    let washer = MachineConfig {
        name,
        sensor_pin: 27,
        ..Default::default()
    };
    let _ = config.machines.push(washer);

    config
}

/// Wi-Fi credentials baked in at build time
pub fn wifi_credentials() -> Option<(&'static str, &'static str)> {
    let ssid = option_env!("SPINWATCH_WIFI_SSID")?;
    let password = option_env!("SPINWATCH_WIFI_PASSWORD").unwrap_or("");
    Some((ssid, password))
}
