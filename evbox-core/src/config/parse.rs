//! Simple TOML parser for the EVBox configuration
//!
//! Handles only the subset the configuration file needs, without
//! allocating:
//! - [section] headers
//! - key = value pairs (string, integer, boolean)
//! - Comments (# ...), including trailing comments
//!
//! ```toml
//! name = "garage"
//!
//! [uart]
//! tx_pin = "gpio0"
//! rx_pin = "gpio1"
//! baud_rate = 38400
//!
//! [flow_control]
//! pin = "gpio2"        # "!gpio2" for an active-low driver enable
//!
//! [sensors]
//! total_energy = false
//!
//! [setpoint]
//! min = 9
//! max = 32
//! step = 1
//! initial = 16         # limit sent at start-up
//!
//! [timing]
//! poll_interval_ms = 1000
//! reply_timeout_ms = 500
//! max_retries = 2
//! ```
//!
//! Missing keys keep their defaults. The result is not validated; call
//! [`EvBoxConfig::validate`] afterwards.

use heapless::String;

use super::hardware::PinConfig;
use super::types::{ConfigError, EvBoxConfig};
use crate::traits::Channel;

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Uart,
    FlowControl,
    Sensors,
    Setpoint,
    Timing,
}

/// Parse TOML configuration into EvBoxConfig
pub fn parse_config(input: &str) -> Result<EvBoxConfig, ConfigError> {
    let mut config = EvBoxConfig::new();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = strip_comment(line).trim();

        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            section = parse_section_header(header)?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ConfigError::InvalidValue)?;
        apply_value(section, key, value, &mut config)?;
    }

    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ConfigError> {
    match header.trim() {
        "uart" => Ok(Section::Uart),
        "flow_control" => Ok(Section::FlowControl),
        "sensors" => Ok(Section::Sensors),
        "setpoint" => Ok(Section::Setpoint),
        "timing" => Ok(Section::Timing),
        _ => Err(ConfigError::InvalidSection),
    }
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut EvBoxConfig,
) -> Result<(), ConfigError> {
    match (section, key) {
        (Section::Root, "name") => {
            let mut name = String::new();
            name.push_str(parse_string(value)?)
                .map_err(|_| ConfigError::LabelTooLong)?;
            config.name = name;
        }
        (Section::Uart, "tx_pin") => config.uart.tx_pin = parse_pin(value)?.pin,
        (Section::Uart, "rx_pin") => config.uart.rx_pin = parse_pin(value)?.pin,
        (Section::Uart, "baud_rate") => config.uart.baud_rate = parse_int(value)?,
        (Section::FlowControl, "pin") => config.flow_control_pin = Some(parse_pin(value)?),
        (Section::Sensors, key) => {
            let channel = parse_channel(key).ok_or(ConfigError::UnknownKey)?;
            config.sensors.set(channel, parse_bool(value)?);
        }
        (Section::Setpoint, "min") => config.setpoint.min = parse_int(value)?,
        (Section::Setpoint, "max") => config.setpoint.max = parse_int(value)?,
        (Section::Setpoint, "step") => config.setpoint.step = parse_int(value)?,
        (Section::Setpoint, "initial") => config.setpoint.initial = Some(parse_int(value)?),
        (Section::Timing, "poll_interval_ms") => config.timing.poll_interval_ms = parse_int(value)?,
        (Section::Timing, "reply_timeout_ms") => config.timing.reply_timeout_ms = parse_int(value)?,
        (Section::Timing, "max_retries") => config.timing.max_retries = parse_int(value)?,
        _ => return Err(ConfigError::UnknownKey),
    }
    Ok(())
}

fn parse_channel(key: &str) -> Option<Channel> {
    match key {
        "l1_current" => Some(Channel::L1Current),
        "l2_current" => Some(Channel::L2Current),
        "l3_current" => Some(Channel::L3Current),
        "total_energy" => Some(Channel::TotalEnergy),
        _ => None,
    }
}

/// Remove a trailing comment, ignoring `#` inside quotes
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

fn parse_string(value: &str) -> Result<&str, ConfigError> {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or(ConfigError::InvalidValue)
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue)
}

fn parse_bool(value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidValue),
    }
}

/// Parse "gpioN", with a leading `!` for active-low
fn parse_pin(value: &str) -> Result<PinConfig, ConfigError> {
    let value = parse_string(value)?;
    let (inverted, name) = match value.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, value),
    };

    let pin = name
        .strip_prefix("gpio")
        .ok_or(ConfigError::InvalidPin)?
        .parse()
        .map_err(|_| ConfigError::InvalidPin)?;

    Ok(PinConfig { pin, inverted })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
# Garage wallbox
name = "garage"

[uart]
tx_pin = "gpio4"
rx_pin = "gpio5"
baud_rate = 38400

[flow_control]
pin = "!gpio6"   # active-low DE

[sensors]
l3_current = false
total_energy = true

[setpoint]
min = 10
max = 25
step = 1
initial = 16

[timing]
poll_interval_ms = 2000
reply_timeout_ms = 300
max_retries = 3
"#;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(FULL).unwrap();
        assert_eq!(config.name.as_str(), "garage");
        assert_eq!(config.uart.tx_pin, 4);
        assert_eq!(config.uart.rx_pin, 5);
        assert_eq!(config.flow_control_pin, Some(PinConfig::inverted(6)));
        assert!(config.sensors.l1_current);
        assert!(!config.sensors.l3_current);
        assert_eq!(config.setpoint.min, 10);
        assert_eq!(config.setpoint.max, 25);
        assert_eq!(config.setpoint.initial, Some(16));
        assert_eq!(config.timing.poll_interval_ms, 2000);
        assert_eq!(config.timing.reply_timeout_ms, 300);
        assert_eq!(config.timing.max_retries, 3);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_empty_input_gives_defaults() {
        assert_eq!(parse_config("").unwrap(), EvBoxConfig::new());
    }

    #[test]
    fn test_parse_pin_forms() {
        assert_eq!(parse_pin("\"gpio2\""), Ok(PinConfig::new(2)));
        assert_eq!(parse_pin("\"!gpio17\""), Ok(PinConfig::inverted(17)));
        assert_eq!(parse_pin("\"pin2\""), Err(ConfigError::InvalidPin));
        assert_eq!(parse_pin("\"gpioX\""), Err(ConfigError::InvalidPin));
        assert_eq!(parse_pin("gpio2"), Err(ConfigError::InvalidValue));
    }

    #[test]
    fn test_unknown_section_and_key() {
        assert_eq!(
            parse_config("[heater]\n").unwrap_err(),
            ConfigError::InvalidSection
        );
        assert_eq!(
            parse_config("[uart]\nparity = \"even\"\n").unwrap_err(),
            ConfigError::UnknownKey
        );
        assert_eq!(
            parse_config("[sensors]\nvoltage = true\n").unwrap_err(),
            ConfigError::UnknownKey
        );
    }

    #[test]
    fn test_bad_values() {
        assert_eq!(
            parse_config("[timing]\nmax_retries = 300\n").unwrap_err(),
            ConfigError::InvalidValue
        );
        assert_eq!(
            parse_config("[sensors]\nl1_current = yes\n").unwrap_err(),
            ConfigError::InvalidValue
        );
        assert_eq!(
            parse_config("name = \"a-very-long-charger-name\"\n").unwrap_err(),
            ConfigError::LabelTooLong
        );
    }

    #[test]
    fn test_hash_inside_string_is_kept() {
        let config = parse_config("name = \"box#1\" # comment\n").unwrap();
        assert_eq!(config.name.as_str(), "box#1");
    }
}
