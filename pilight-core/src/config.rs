//! Configuration type definitions
//!
//! Device wiring and default behavior. Pin numbers are host GPIO numbers
//! (BCM numbering on a Raspberry Pi); allocating the pins is up to the host.

use core::fmt;

use crate::command::Brightness;
use crate::traffic::TrafficTiming;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Invalid configuration value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Green phase too short for the blink tail
    GreenTooShort {
        /// Rejected green duration in seconds
        green_s: u32,
    },
    /// Brightness level outside 0-7
    BrightnessOutOfRange,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::GreenTooShort { green_s } => write!(
                f,
                "green phase of {}s is too short, it must be longer than {}s",
                green_s,
                TrafficTiming::GREEN_FLOOR_S
            ),
            ConfigError::BrightnessOutOfRange => {
                write!(f, "brightness must be a level between 0 and 7")
            }
        }
    }
}

impl core::error::Error for ConfigError {}

/// Segment display wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisplayConfig {
    /// Clock line GPIO
    pub clk_pin: u8,
    /// Data line GPIO
    pub dio_pin: u8,
    /// Initial brightness
    #[cfg_attr(feature = "serde", serde(default))]
    pub brightness: Brightness,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            clk_pin: 21,
            dio_pin: 20,
            brightness: Brightness::default(),
        }
    }
}

/// Traffic light wiring and cycle timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrafficLightConfig {
    pub red_pin: u8,
    pub amber_pin: u8,
    pub green_pin: u8,
    /// Cycle timing
    #[cfg_attr(feature = "serde", serde(default))]
    pub timing: TrafficTiming,
}

impl TrafficLightConfig {
    /// Validate the cycle timing
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timing.validate()
    }
}

/// Complete device configuration
///
/// Either peripheral may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceConfig {
    #[cfg_attr(feature = "serde", serde(default))]
    pub display: Option<DisplayConfig>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub traffic_light: Option<TrafficLightConfig>,
}

impl DeviceConfig {
    /// Validate every configured peripheral
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(traffic) = &self.traffic_light {
            traffic.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_display_wiring() {
        let config = DisplayConfig::default();
        assert_eq!(config.clk_pin, 21);
        assert_eq!(config.dio_pin, 20);
        assert_eq!(config.brightness, Brightness::MAX);
    }

    #[test]
    fn test_device_validation() {
        let mut config = DeviceConfig::default();
        assert!(config.validate().is_ok());

        config.traffic_light = Some(TrafficLightConfig {
            red_pin: 9,
            amber_pin: 10,
            green_pin: 11,
            timing: TrafficTiming::new(10, 3, 4),
        });
        assert_eq!(
            config.validate(),
            Err(ConfigError::GreenTooShort { green_s: 4 })
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ConfigError::GreenTooShort { green_s: 3 }.to_string(),
            "green phase of 3s is too short, it must be longer than 4s"
        );
        assert_eq!(
            ConfigError::BrightnessOutOfRange.to_string(),
            "brightness must be a level between 0 and 7"
        );
    }
}
