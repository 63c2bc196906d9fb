//! pilight Hardware Abstraction Layer
//!
//! This crate defines the pin capabilities the peripheral drivers need from
//! the host. Plain digital outputs come straight from `embedded-hal`; the one
//! thing `embedded-hal` does not model, switching a line between output and
//! input at runtime, is added here as [`gpio::FlexPin`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  pilight-drivers (display, lights)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pilight-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ pilight-hal-  │       │  host GPIO    │
//! │     sim       │       │  backend      │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`OutputPin`] - Digital output (re-exported from `embedded-hal`)
//! - [`gpio::FlexPin`] - Output pin that can temporarily release the line

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;

// Re-export key traits at crate root for convenience
pub use embedded_hal::digital::{ErrorType, OutputPin, PinState};
pub use gpio::{Direction, FlexPin};
