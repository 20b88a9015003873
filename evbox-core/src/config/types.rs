//! Configuration type definitions
//!
//! These types represent one charge controller attachment. They are built
//! once at start-up, validated, and then handed to the component.

use heapless::String;

use evbox_protocol::{ChargeCurrent, ValidationError, MAX_CHARGE_CURRENT, MIN_CHARGE_CURRENT};

use super::hardware::{PinConfig, UartHwConfig, MAX_GPIO};
use crate::traits::Channel;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum label length
pub const MAX_LABEL_LEN: usize = 16;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Key not valid in its section
    UnknownKey,
    /// Value has the wrong type or does not parse
    InvalidValue,
    /// Pin string is not `gpioN` / `!gpioN`, or the pin does not exist
    InvalidPin,
    /// TX, RX and flow-control pins must all differ
    PinConflict,
    /// Baud rate of zero
    InvalidBaudRate,
    /// Setpoint bounds outside 9..=32 A, inverted, or with a zero step
    InvalidSetpointRange,
    /// Poll interval or reply timeout of zero
    InvalidTiming,
    /// Label longer than the label capacity
    LabelTooLong,
}

/// Which telemetry channels are published
///
/// Readings on disabled channels still update the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorChannels {
    pub l1_current: bool,
    pub l2_current: bool,
    pub l3_current: bool,
    pub total_energy: bool,
}

impl SensorChannels {
    /// Every channel enabled
    pub const ALL: Self = Self {
        l1_current: true,
        l2_current: true,
        l3_current: true,
        total_energy: true,
    };

    /// No channel enabled
    pub const NONE: Self = Self {
        l1_current: false,
        l2_current: false,
        l3_current: false,
        total_energy: false,
    };

    pub fn is_enabled(&self, channel: Channel) -> bool {
        match channel {
            Channel::L1Current => self.l1_current,
            Channel::L2Current => self.l2_current,
            Channel::L3Current => self.l3_current,
            Channel::TotalEnergy => self.total_energy,
        }
    }

    pub fn set(&mut self, channel: Channel, enabled: bool) {
        match channel {
            Channel::L1Current => self.l1_current = enabled,
            Channel::L2Current => self.l2_current = enabled,
            Channel::L3Current => self.l3_current = enabled,
            Channel::TotalEnergy => self.total_energy = enabled,
        }
    }
}

impl Default for SensorChannels {
    fn default() -> Self {
        Self::ALL
    }
}

/// Bounds of the charge current number control, in amps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SetpointConfig {
    pub min: u8,
    pub max: u8,
    pub step: u8,
    /// Limit sent once at start-up
    pub initial: Option<u8>,
}

impl SetpointConfig {
    /// Validate a number control value against these bounds
    ///
    /// Values between steps are reported as `NotInteger`.
    pub fn check(&self, value: f32) -> Result<ChargeCurrent, ValidationError> {
        let current = ChargeCurrent::from_f32(value)?;
        let amps = current.amps();
        if amps < self.min || amps > self.max {
            return Err(ValidationError::OutOfRange);
        }
        if self.step > 1 && (amps - self.min) % self.step != 0 {
            return Err(ValidationError::NotInteger);
        }
        Ok(current)
    }
}

impl Default for SetpointConfig {
    fn default() -> Self {
        Self {
            min: MIN_CHARGE_CURRENT,
            max: MAX_CHARGE_CURRENT,
            step: 1,
            initial: None,
        }
    }
}

/// Exchange timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimingConfig {
    /// Time between status refreshes (ms)
    pub poll_interval_ms: u32,
    /// How long to wait for a reply before resending (ms)
    pub reply_timeout_ms: u32,
    /// Resends after the first attempt before an exchange fails
    pub max_retries: u8,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            reply_timeout_ms: 500,
            max_retries: 2,
        }
    }
}

/// Complete configuration for one EVBox attachment
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EvBoxConfig {
    /// Label used in logs
    pub name: String<MAX_LABEL_LEN>,
    /// UART line
    pub uart: UartHwConfig,
    /// RS-485 driver-enable pin; `None` for transceivers with automatic
    /// direction control
    pub flow_control_pin: Option<PinConfig>,
    /// Published channels
    pub sensors: SensorChannels,
    /// Number control bounds
    pub setpoint: SetpointConfig,
    /// Exchange timing
    pub timing: TimingConfig,
}

impl EvBoxConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the configuration once at start-up
    pub fn validate(&self) -> Result<(), ConfigError> {
        let uart = &self.uart;
        if uart.tx_pin > MAX_GPIO || uart.rx_pin > MAX_GPIO {
            return Err(ConfigError::InvalidPin);
        }
        if uart.tx_pin == uart.rx_pin {
            return Err(ConfigError::PinConflict);
        }
        if uart.baud_rate == 0 {
            return Err(ConfigError::InvalidBaudRate);
        }

        if let Some(flow) = self.flow_control_pin {
            if flow.pin > MAX_GPIO {
                return Err(ConfigError::InvalidPin);
            }
            if flow.pin == uart.tx_pin || flow.pin == uart.rx_pin {
                return Err(ConfigError::PinConflict);
            }
        }

        let sp = &self.setpoint;
        if sp.min < MIN_CHARGE_CURRENT
            || sp.max > MAX_CHARGE_CURRENT
            || sp.min > sp.max
            || sp.step == 0
        {
            return Err(ConfigError::InvalidSetpointRange);
        }
        if let Some(initial) = sp.initial {
            if sp.check(initial as f32).is_err() {
                return Err(ConfigError::InvalidSetpointRange);
            }
        }

        if self.timing.poll_interval_ms == 0 || self.timing.reply_timeout_ms == 0 {
            return Err(ConfigError::InvalidTiming);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EvBoxConfig::new();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.uart.baud_rate, 38_400);
        assert_eq!(config.setpoint.min, 9);
        assert_eq!(config.setpoint.max, 32);
        assert!(config.flow_control_pin.is_none());
    }

    #[test]
    fn test_flow_pin_conflicts_with_uart() {
        let mut config = EvBoxConfig::new();
        config.flow_control_pin = Some(PinConfig::new(config.uart.tx_pin));
        assert_eq!(config.validate(), Err(ConfigError::PinConflict));

        config.flow_control_pin = Some(PinConfig::inverted(30));
        assert_eq!(config.validate(), Err(ConfigError::InvalidPin));

        config.flow_control_pin = Some(PinConfig::inverted(2));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_setpoint_range_must_stay_inside_protocol_bounds() {
        let mut config = EvBoxConfig::new();
        config.setpoint.min = 6;
        assert_eq!(config.validate(), Err(ConfigError::InvalidSetpointRange));

        config.setpoint = SetpointConfig {
            min: 16,
            max: 10,
            step: 1,
            initial: None,
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidSetpointRange));

        config.setpoint = SetpointConfig {
            min: 10,
            max: 16,
            step: 0,
            initial: None,
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidSetpointRange));
    }

    #[test]
    fn test_initial_setpoint_must_be_selectable() {
        let mut config = EvBoxConfig::new();
        config.setpoint = SetpointConfig {
            min: 10,
            max: 20,
            step: 2,
            initial: Some(16),
        };
        assert_eq!(config.validate(), Ok(()));

        config.setpoint.initial = Some(22);
        assert_eq!(config.validate(), Err(ConfigError::InvalidSetpointRange));

        config.setpoint.initial = Some(13);
        assert_eq!(config.validate(), Err(ConfigError::InvalidSetpointRange));
    }

    #[test]
    fn test_setpoint_check() {
        let setpoint = SetpointConfig::default();
        assert_eq!(setpoint.check(16.0).map(ChargeCurrent::amps), Ok(16));
        assert_eq!(setpoint.check(33.0), Err(ValidationError::OutOfRange));
        assert_eq!(setpoint.check(12.5), Err(ValidationError::NotInteger));

        let narrow = SetpointConfig {
            min: 10,
            max: 20,
            step: 2,
            initial: None,
        };
        assert_eq!(narrow.check(9.0), Err(ValidationError::OutOfRange));
        assert_eq!(narrow.check(12.0).map(ChargeCurrent::amps), Ok(12));
        assert_eq!(narrow.check(13.0), Err(ValidationError::NotInteger));
    }

    #[test]
    fn test_zero_timing_rejected() {
        let mut config = EvBoxConfig::new();
        config.timing.reply_timeout_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidTiming));
    }

    #[test]
    fn test_sensor_channels_toggle() {
        let mut channels = SensorChannels::NONE;
        assert!(!channels.is_enabled(Channel::L2Current));
        channels.set(Channel::L2Current, true);
        assert!(channels.is_enabled(Channel::L2Current));
        assert!(!channels.is_enabled(Channel::TotalEnergy));
    }
}
