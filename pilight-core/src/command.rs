//! TM1637 command set
//!
//! Every command is the first byte of a bus transaction. The top two bits
//! select the command class, the remaining bits are its arguments.

use core::fmt;

use crate::config::ConfigError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Data command: write display registers, auto-increment address
pub const DATA_WRITE: u8 = 0x40;

/// Address command base; low nibble selects the start register
pub const ADDRESS_SET: u8 = 0xC0;

/// Display control base; low bits carry brightness and the on flag
pub const DISPLAY_CONTROL: u8 = 0x80;

/// Display-on flag inside the control byte
pub const DISPLAY_ON: u8 = 0x08;

/// Number of digit registers the chip addresses
pub const REGISTER_COUNT: usize = 6;

/// Highest valid start address
pub const MAX_ADDRESS: u8 = (REGISTER_COUNT - 1) as u8;

/// Number of digits fitted on the 4-digit module
pub const DIGITS: usize = 4;

/// Display brightness, 8 PWM levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub struct Brightness(u8);

impl Brightness {
    /// Dimmest level
    pub const MIN: Self = Self(0);
    /// Brightest level
    pub const MAX: Self = Self(7);

    /// Create a brightness level (0-7)
    pub const fn new(level: u8) -> Result<Self, ConfigError> {
        if level > Self::MAX.0 {
            return Err(ConfigError::BrightnessOutOfRange);
        }
        Ok(Self(level))
    }

    /// Map a fraction in `[0.0, 1.0]` onto the 8 levels
    pub fn from_fraction(fraction: f32) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ConfigError::BrightnessOutOfRange);
        }
        // Round to nearest level without pulling in a float library
        let level = (fraction * f32::from(Self::MAX.0) + 0.5) as u8;
        Ok(Self(level.min(Self::MAX.0)))
    }

    /// Raw level 0-7
    pub const fn level(self) -> u8 {
        self.0
    }
}

impl Default for Brightness {
    fn default() -> Self {
        Self::MAX
    }
}

impl TryFrom<u8> for Brightness {
    type Error = ConfigError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<Brightness> for u8 {
    fn from(brightness: Brightness) -> Self {
        brightness.0
    }
}

impl fmt::Display for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX.0)
    }
}

/// Address command for a start register
///
/// Returns `None` when `address` is past the last register.
pub const fn address_set(address: u8) -> Option<u8> {
    if address > MAX_ADDRESS {
        None
    } else {
        Some(ADDRESS_SET | address)
    }
}

/// Display control byte
pub const fn display_control(brightness: Brightness, on: bool) -> u8 {
    let flag = if on { DISPLAY_ON } else { 0 };
    DISPLAY_CONTROL | flag | brightness.level()
}

/// Check that `len` bytes written from `address` stay inside the registers
pub const fn fits(address: u8, len: usize) -> bool {
    address <= MAX_ADDRESS && address as usize + len <= REGISTER_COUNT
}
