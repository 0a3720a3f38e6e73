//! Minimal TOML parser for `monitor.toml`
//!
//! Handles only the subset the monitor configuration needs and allocates
//! nothing: every value lands in a `heapless` container.
//!
//! Supported features:
//! - Key = value pairs (string, integer, boolean)
//! - Basic (`"..."`) and literal (`'...'`) strings
//! - Integers with `_` digit separators
//! - [section] headers
//! - [section.name] and [section name] headers
//! - Comments (# ...), including trailing comments
//!
//! NOT supported:
//! - Arrays and inline tables
//! - Multi-line strings
//! - Escape sequences inside basic strings (rejected)

use heapless::String as HString;

use heapless::Vec;

use super::types::{
    MachineConfig, MonitorConfig, SampleMode, MAX_LABEL_LEN, MAX_MACHINES, MAX_URL_LEN,
};

/// Configuration error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// More machines than `MAX_MACHINES`, or more than
    /// `MAX_MACHINE_SECTIONS` machine sections
    TooManyItems,
    /// Pin string is malformed or not ADC-capable
    InvalidPin,
    /// String value exceeds its capacity
    ValueTooLong,
    /// Two machine sections share a name
    DuplicateMachine,
    /// Two enabled machines share a sensor pin
    DuplicateSensorPin,
}

/// Machine sections accepted per file, disabled ones included
pub const MAX_MACHINE_SECTIONS: usize = 2 * MAX_MACHINES;

/// Current parsing context
#[derive(Debug, Clone, PartialEq, Eq)]
enum Section {
    Root,
    Monitor,
    Notify,
    Machine,
}

/// Parse TOML configuration into MonitorConfig
///
/// Disabled machines are validated and then dropped. Their names still
/// count towards duplicate detection.
pub fn parse_config(input: &str) -> Result<MonitorConfig, ConfigError> {
    let mut config = MonitorConfig::new();
    let mut section = Section::Root;
    let mut current_machine: Option<MachineConfig> = None;
    let mut seen: Vec<HString<MAX_LABEL_LEN>, MAX_MACHINE_SECTIONS> = Vec::new();

    for line in input.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            save_machine(&mut config, &mut current_machine)?;

            let (next, name) = parse_section_header(&line[1..line.len() - 1])?;
            if let Some(name) = name {
                if seen.contains(&name) {
                    return Err(ConfigError::DuplicateMachine);
                }
                seen.push(name.clone()).map_err(|_| ConfigError::TooManyItems)?;
                current_machine = Some(MachineConfig {
                    name,
                    ..MachineConfig::default()
                });
            }
            section = next;
            continue;
        }

        if let Some((key, value)) = parse_key_value(line) {
            apply_value(&section, key, value, &mut config, &mut current_machine)?;
        }
    }

    save_machine(&mut config, &mut current_machine)?;

    Ok(config)
}

/// Parse section header like "monitor", "machine.Washer" or "machine Washer"
fn parse_section_header(
    header: &str,
) -> Result<(Section, Option<HString<MAX_LABEL_LEN>>), ConfigError> {
    let header = header.trim();

    let (kind, name) = match header.split_once('.') {
        Some((kind, name)) => (kind.trim(), Some(name.trim())),
        None => {
            let mut parts = header.split_whitespace();
            let kind = parts.next().ok_or(ConfigError::InvalidSection)?;
            (kind, parts.next())
        }
    };

    match (kind, name) {
        ("monitor", None) => Ok((Section::Monitor, None)),
        ("notify", None) => Ok((Section::Notify, None)),
        ("machine", Some(name)) => {
            let name = parse_string(name)?;
            if name.is_empty() || name.contains('.') {
                return Err(ConfigError::InvalidSection);
            }
            let name = HString::try_from(name).map_err(|_| ConfigError::ValueTooLong)?;
            Ok((Section::Machine, Some(name)))
        }
        _ => Err(ConfigError::InvalidSection),
    }
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Strip a trailing comment; a # inside either string kind is kept
    let mut quote: Option<char> = None;
    let mut end = value.len();
    for (i, c) in value.char_indices() {
        match (c, quote) {
            ('"' | '\'', None) => quote = Some(c),
            (c, Some(open)) if c == open => quote = None,
            ('#', None) => {
                end = i;
                break;
            }
            _ => {}
        }
    }
    let value = value[..end].trim();

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value (removes quotes)
///
/// Literal strings are taken verbatim. Basic strings must not carry escapes,
/// since they would not be decoded.
fn parse_string(value: &str) -> Result<&str, ConfigError> {
    let quoted = |q: char| value.len() >= 2 && value.starts_with(q) && value.ends_with(q);

    if quoted('\'') {
        Ok(&value[1..value.len() - 1])
    } else if quoted('"') {
        let inner = &value[1..value.len() - 1];
        if inner.contains('\\') {
            return Err(ConfigError::InvalidValue);
        }
        Ok(inner)
    } else if value.starts_with(['"', '\'']) || value.ends_with(['"', '\'']) {
        Err(ConfigError::InvalidValue)
    } else {
        // Allow unquoted strings for simple values
        Ok(value)
    }
}

/// Parse a bounded string value
fn parse_bounded<const N: usize>(value: &str) -> Result<HString<N>, ConfigError> {
    HString::try_from(parse_string(value)?).map_err(|_| ConfigError::ValueTooLong)
}

/// Parse an integer value
///
/// A `_` is allowed only between two digits, as in `1_500`.
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ConfigError> {
    if !value.contains('_') {
        return value.parse().map_err(|_| ConfigError::InvalidValue);
    }

    let bytes = value.as_bytes();
    let mut digits: HString<24> = HString::new();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'_' {
            let before = i.checked_sub(1).map(|j| bytes[j]);
            let after = bytes.get(i + 1).copied();
            let between_digits = matches!(before, Some(d) if d.is_ascii_digit())
                && matches!(after, Some(d) if d.is_ascii_digit());
            if !between_digits {
                return Err(ConfigError::InvalidValue);
            }
            continue;
        }
        digits
            .push(b as char)
            .map_err(|_| ConfigError::InvalidValue)?;
    }

    digits.parse().map_err(|_| ConfigError::InvalidValue)
}

/// Parse a strictly positive integer value
fn parse_nonzero<T: core::str::FromStr + Default + PartialEq>(
    value: &str,
) -> Result<T, ConfigError> {
    let parsed: T = parse_int(value)?;
    if parsed == T::default() {
        return Err(ConfigError::InvalidValue);
    }
    Ok(parsed)
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidValue),
    }
}

/// Parse a sensor pin string like "gpio27"
///
/// Only GPIO26..=28 are accepted: GPIO29 doubles as the Pico W radio clock.
fn parse_sensor_pin(value: &str) -> Result<u8, ConfigError> {
    let value = parse_string(value)?;
    let digits = value.strip_prefix("gpio").ok_or(ConfigError::InvalidPin)?;
    let pin: u8 = digits.parse().map_err(|_| ConfigError::InvalidPin)?;

    match pin {
        26..=28 => Ok(pin),
        _ => Err(ConfigError::InvalidPin),
    }
}

/// Parse sample mode
fn parse_sample_mode(value: &str) -> Result<SampleMode, ConfigError> {
    match parse_string(value)? {
        "average" => Ok(SampleMode::Average),
        "peak" => Ok(SampleMode::Peak),
        _ => Err(ConfigError::InvalidValue),
    }
}

/// Apply a parsed value to the appropriate config field
fn apply_value(
    section: &Section,
    key: &str,
    value: &str,
    config: &mut MonitorConfig,
    current_machine: &mut Option<MachineConfig>,
) -> Result<(), ConfigError> {
    match section {
        Section::Monitor => match key {
            "calibration_mode" => config.monitor.calibration_mode = parse_bool(value)?,
            "poll_interval_ms" => config.monitor.poll_interval_ms = parse_nonzero(value)?,
            "calibration_poll_interval_ms" => {
                config.monitor.calibration_poll_interval_ms = parse_nonzero(value)?
            }
            "status_port" => config.monitor.status_port = parse_nonzero(value)?,
            _ => {} // Ignore unknown keys
        },
        Section::Notify => match key {
            "push_url" => config.notify.push_url = parse_bounded::<MAX_URL_LEN>(value)?,
            _ => {}
        },
        Section::Machine => {
            let m = current_machine.as_mut().ok_or(ConfigError::InvalidSection)?;
            match key {
                "enabled" => m.enabled = parse_bool(value)?,
                "sensor_pin" => m.sensor_pin = parse_sensor_pin(value)?,
                "webhook_url" => m.webhook_url = parse_bounded::<MAX_URL_LEN>(value)?,
                "threshold" => m.threshold = parse_int(value)?,
                "start_confirm_s" => m.start_confirm_s = parse_int(value)?,
                "cooldown_s" => m.cooldown_s = parse_int(value)?,
                "false_alarm_s" => m.false_alarm_s = parse_int(value)?,
                "sample_mode" => m.sampling.mode = parse_sample_mode(value)?,
                "sample_count" => m.sampling.count = parse_nonzero(value)?,
                "sample_delay_ms" => m.sampling.delay_ms = parse_int(value)?,
                _ => {}
            }
        }
        Section::Root => {
            // No root-level keys
        }
    }

    Ok(())
}

/// Validate and store the machine being built, if any
fn save_machine(
    config: &mut MonitorConfig,
    current_machine: &mut Option<MachineConfig>,
) -> Result<(), ConfigError> {
    let Some(machine) = current_machine.take() else {
        return Ok(());
    };

    if !machine.enabled {
        return Ok(());
    }

    if config
        .machines
        .iter()
        .any(|m| m.sensor_pin == machine.sensor_pin)
    {
        return Err(ConfigError::DuplicateSensorPin);
    }

    config
        .machines
        .push(machine)
        .map_err(|_| ConfigError::TooManyItems)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CONFIG: &str = r#"
# Laundry room
[monitor]
calibration_mode = false
poll_interval_ms = 1000
calibration_poll_interval_ms = 250
status_port = 8080

[notify]
push_url = "http://ntfy.sh/laundry#room"   # hash inside the string survives

[machine.Washer]
enabled = true
sensor_pin = "gpio27"
webhook_url = "http://192.168.1.20:8123/api/webhook/washer"
threshold = 1500
start_confirm_s = 60
cooldown_s = 300
false_alarm_s = 10
sample_mode = "average"
sample_count = 30
sample_delay_ms = 1

[machine.Dryer]
enabled = true
sensor_pin = "gpio26"
threshold = 2500
start_confirm_s = 20
cooldown_s = 120
sample_mode = "peak"
sample_count = 50
"#;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(FULL_CONFIG).unwrap();

        assert!(!config.monitor.calibration_mode);
        assert_eq!(config.monitor.poll_interval_ms, 1000);
        assert_eq!(config.monitor.calibration_poll_interval_ms, 250);
        assert_eq!(config.monitor.status_port, 8080);
        assert_eq!(config.notify.push_url.as_str(), "http://ntfy.sh/laundry#room");

        assert_eq!(config.machines.len(), 2);
        let washer = config.find_machine("Washer").unwrap();
        assert_eq!(washer.sensor_pin, 27);
        assert_eq!(
            washer.webhook_url.as_str(),
            "http://192.168.1.20:8123/api/webhook/washer"
        );
        assert_eq!(washer.threshold, 1500);
        assert_eq!(washer.sampling.mode, SampleMode::Average);
        assert_eq!(washer.sampling.count, 30);
        assert_eq!(washer.sampling.delay_ms, 1);

        let dryer = config.find_machine("Dryer").unwrap();
        assert_eq!(dryer.sensor_pin, 26);
        assert_eq!(dryer.threshold, 2500);
        assert_eq!(dryer.start_confirm_s, 20);
        assert_eq!(dryer.cooldown_s, 120);
        // Not given, keeps the default
        assert_eq!(dryer.false_alarm_s, 10);
        assert_eq!(dryer.sampling.mode, SampleMode::Peak);
        assert_eq!(dryer.sampling.count, 50);
    }

    #[test]
    fn test_machine_order_is_preserved() {
        let config = parse_config(FULL_CONFIG).unwrap();
        assert_eq!(config.machines[0].name.as_str(), "Washer");
        assert_eq!(config.machines[1].name.as_str(), "Dryer");
    }

    #[test]
    fn test_disabled_machine_is_dropped() {
        let config = parse_config(
            r#"
[machine.Washer]
sensor_pin = "gpio27"

[machine.Dryer]
enabled = false
sensor_pin = "gpio27"
"#,
        )
        .unwrap();

        assert_eq!(config.machines.len(), 1);
        assert!(config.find_machine("Dryer").is_none());
    }

    #[test]
    fn test_parse_section_header() {
        let (section, name) = parse_section_header("machine.Washer").unwrap();
        assert_eq!(section, Section::Machine);
        assert_eq!(name.unwrap().as_str(), "Washer");

        let (section, name) = parse_section_header("machine Dryer").unwrap();
        assert_eq!(section, Section::Machine);
        assert_eq!(name.unwrap().as_str(), "Dryer");

        let (section, name) = parse_section_header("monitor").unwrap();
        assert_eq!(section, Section::Monitor);
        assert!(name.is_none());

        assert_eq!(
            parse_section_header("stepper.spin"),
            Err(ConfigError::InvalidSection)
        );
        assert_eq!(parse_section_header("machine"), Err(ConfigError::InvalidSection));
        assert_eq!(
            parse_section_header("machine.AVeryLongMachineName"),
            Err(ConfigError::ValueTooLong)
        );
    }

    #[test]
    fn test_parse_sensor_pin() {
        assert_eq!(parse_sensor_pin("\"gpio26\""), Ok(26));
        assert_eq!(parse_sensor_pin("gpio28"), Ok(28));
        // Radio clock on the Pico W
        assert_eq!(parse_sensor_pin("gpio29"), Err(ConfigError::InvalidPin));
        assert_eq!(parse_sensor_pin("gpio5"), Err(ConfigError::InvalidPin));
        assert_eq!(parse_sensor_pin("adc0"), Err(ConfigError::InvalidPin));
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(parse_key_value("threshold = 1500"), Some(("threshold", "1500")));
        assert_eq!(
            parse_key_value("threshold = 1500 # loud machine"),
            Some(("threshold", "1500"))
        );
        assert_eq!(parse_key_value("threshold ="), None);
        assert_eq!(parse_key_value("no equals sign"), None);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let bad_bool = "[monitor]\ncalibration_mode = yes\n";
        assert_eq!(parse_config(bad_bool), Err(ConfigError::InvalidValue));

        let zero_samples = "[machine.Washer]\nsample_count = 0\n";
        assert_eq!(parse_config(zero_samples), Err(ConfigError::InvalidValue));

        let zero_poll = "[monitor]\npoll_interval_ms = 0\n";
        assert_eq!(parse_config(zero_poll), Err(ConfigError::InvalidValue));

        let bad_mode = "[machine.Washer]\nsample_mode = \"median\"\n";
        assert_eq!(parse_config(bad_mode), Err(ConfigError::InvalidValue));

        let negative = "[machine.Washer]\nthreshold = -5\n";
        assert_eq!(parse_config(negative), Err(ConfigError::InvalidValue));

        let unknown = "[heater.dryer]\nmax_temp = 55\n";
        assert_eq!(parse_config(unknown), Err(ConfigError::InvalidSection));
    }

    #[test]
    fn test_duplicates_are_rejected() {
        let same_name = "[machine.Washer]\nsensor_pin = \"gpio26\"\n[machine.Washer]\nsensor_pin = \"gpio27\"\n";
        assert_eq!(parse_config(same_name), Err(ConfigError::DuplicateMachine));

        let same_pin = "[machine.Washer]\nsensor_pin = \"gpio26\"\n[machine.Dryer]\nsensor_pin = \"gpio26\"\n";
        assert_eq!(parse_config(same_pin), Err(ConfigError::DuplicateSensorPin));
    }

    #[test]
    fn test_literal_strings_are_accepted() {
        let config = parse_config(
            "[notify]\npush_url = 'http://ntfy.sh/a#b' # topic\n\
             [machine.'Washer']\nsensor_pin = 'gpio27'\nsample_mode = 'peak'\n",
        )
        .unwrap();

        assert_eq!(config.notify.push_url.as_str(), "http://ntfy.sh/a#b");
        let washer = config.find_machine("Washer").unwrap();
        assert_eq!(washer.sensor_pin, 27);
        assert_eq!(washer.sampling.mode, SampleMode::Peak);

        assert_eq!(parse_string("'gpio27"), Err(ConfigError::InvalidValue));
        assert_eq!(parse_string("\"gpio\\u0032\""), Err(ConfigError::InvalidValue));
    }

    #[test]
    fn test_digit_separators() {
        let config = parse_config(
            "[monitor]\npoll_interval_ms = 1_000\n[machine.Washer]\nthreshold = 1_500\n",
        )
        .unwrap();
        assert_eq!(config.monitor.poll_interval_ms, 1000);
        assert_eq!(config.machines[0].threshold, 1500);

        assert_eq!(parse_int::<u32>("1_2_3"), Ok(123));
        assert_eq!(parse_int::<u32>("_15"), Err(ConfigError::InvalidValue));
        assert_eq!(parse_int::<u32>("15_"), Err(ConfigError::InvalidValue));
        assert_eq!(parse_int::<u32>("1__5"), Err(ConfigError::InvalidValue));
        assert_eq!(parse_int::<u32>("+_5"), Err(ConfigError::InvalidValue));
    }

    #[test]
    fn test_sample_mode_spellings() {
        assert_eq!(parse_sample_mode("\"average\""), Ok(SampleMode::Average));
        assert_eq!(parse_sample_mode("\"peak\""), Ok(SampleMode::Peak));
        for alias in ["\"max\"", "\"avg\"", "\"Peak\"", "\"Average\""] {
            assert_eq!(parse_sample_mode(alias), Err(ConfigError::InvalidValue));
        }
    }

    #[test]
    fn test_disabled_name_cannot_be_reused() {
        let input = "[machine.Washer]\nenabled = false\nsensor_pin = \"gpio26\"\n\
                     [machine.Washer]\nsensor_pin = \"gpio27\"\n";
        assert_eq!(parse_config(input), Err(ConfigError::DuplicateMachine));

        let reversed = "[machine.Washer]\nsensor_pin = \"gpio27\"\n\
                        [machine.Washer]\nenabled = false\n";
        assert_eq!(parse_config(reversed), Err(ConfigError::DuplicateMachine));
    }

    #[test]
    fn test_too_many_machine_sections() {
        let mut input = std::string::String::new();
        for i in 0..=MAX_MACHINE_SECTIONS {
            input.push_str(&format!("[machine.m{}]\nenabled = false\n", i));
        }
        assert_eq!(parse_config(&input), Err(ConfigError::TooManyItems));
    }

    #[test]
    fn test_too_many_machines() {
        // Only three ADC pins exist, so fill the table directly
        let mut config = MonitorConfig::new();
        for pin in 0..4u8 {
            let mut m = MachineConfig::default();
            let _ = core::fmt::write(&mut m.name, format_args!("m{}", pin));
            m.sensor_pin = pin;
            let mut current = Some(m);
            save_machine(&mut config, &mut current).unwrap();
        }
        let mut extra = Some(MachineConfig {
            name: HString::try_from("extra").unwrap(),
            sensor_pin: 9,
            ..MachineConfig::default()
        });
        assert_eq!(
            save_machine(&mut config, &mut extra),
            Err(ConfigError::TooManyItems)
        );
    }

    #[test]
    fn test_url_too_long() {
        let mut input = std::string::String::from("[notify]\npush_url = \"http://");
        input.push_str(&"a".repeat(MAX_URL_LEN));
        input.push_str("\"\n");
        assert_eq!(parse_config(&input), Err(ConfigError::ValueTooLong));
    }

    #[test]
    fn test_empty_config() {
        let config = parse_config("# nothing here\n").unwrap();
        assert!(config.machines.is_empty());
        assert_eq!(config.monitor.poll_interval_ms, 1000);
        assert!(config.notify.push_url.is_empty());
    }
}
