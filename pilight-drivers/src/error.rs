//! Driver error type

use pilight_core::{ConfigError, EncodeError};

/// Errors raised by the display and traffic light drivers
///
/// `E` is the pin error type of the host GPIO backend.
#[derive(Debug, thiserror::Error)]
pub enum Error<E> {
    /// Text contains a character with no segment glyph
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Rejected configuration value
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Write would start or run past the last display register
    #[error("{len} patterns at address {address} do not fit the display registers")]
    AddressOutOfRange { address: u8, len: usize },

    /// The GPIO backend failed; bus state is undefined afterwards
    #[error("pin failure: {0:?}")]
    Pin(E),

    /// The worker thread could not be started
    #[error("failed to spawn background task")]
    Spawn(#[source] std::io::Error),

    /// The worker thread panicked
    #[error("background task panicked")]
    TaskPanicked,

    /// The pins are still shared with a worker thread
    #[error("device is still in use by a background task")]
    Busy,
}

impl<E> Error<E> {
    /// Check if the error came from the GPIO backend
    pub fn is_pin_failure(&self) -> bool {
        matches!(self, Error::Pin(_))
    }
}
