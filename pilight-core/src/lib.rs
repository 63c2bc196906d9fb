//! Board-agnostic core logic for pilight peripherals
//!
//! This crate contains all logic that does not touch a pin:
//!
//! - Character to 7-segment pattern encoding
//! - TM1637 command bytes and brightness levels
//! - Text field formatting (numbers, temperatures, clock) and scroll windows
//! - Traffic light phases, timing validation and the cycle plan
//! - Configuration type definitions

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod config;
pub mod segment;
pub mod text;
pub mod traffic;

pub use command::Brightness;
pub use config::ConfigError;
pub use segment::{encode_char, EncodeError, EncodeStrError, SegmentPattern};
pub use traffic::{TrafficPhase, TrafficTiming};
