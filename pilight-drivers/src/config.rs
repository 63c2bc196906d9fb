//! Device configuration loading
//!
//! Configuration is a TOML document with an optional `[display]` table and
//! an optional `[traffic_light]` table:
//!
//! ```toml
//! [display]
//! clk_pin = 21
//! dio_pin = 20
//! brightness = 7
//!
//! [traffic_light]
//! red_pin = 9
//! amber_pin = 10
//! green_pin = 11
//!
//! [traffic_light.timing]
//! red_s = 10
//! amber_s = 3
//! green_s = 10
//! ```

use std::fs;
use std::io;
use std::path::Path;

use log::debug;
use pilight_core::config::DeviceConfig;
use pilight_core::ConfigError;

/// Failure to load a configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to read configuration")]
    Io(#[from] io::Error),

    #[error("malformed configuration")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] ConfigError),
}

/// Parse and validate a TOML configuration document
pub fn parse_config(text: &str) -> Result<DeviceConfig, ConfigLoadError> {
    let config: DeviceConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Read, parse and validate a configuration file
pub fn load_config(path: impl AsRef<Path>) -> Result<DeviceConfig, ConfigLoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let config = parse_config(&text)?;
    debug!("loaded configuration from {}", path.display());
    Ok(config)
}
