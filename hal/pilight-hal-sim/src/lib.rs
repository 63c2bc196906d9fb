//! Simulated pin backend for pilight
//!
//! Provides [`SimBoard`], a shared in-memory GPIO bank. Every pin handed out
//! by a board appends its transitions to one ordered event log, so the
//! interleaving of clock and data edges can be replayed afterwards. The
//! [`tm1637`] module replays that log through a model of the display chip.
//!
//! Used by the driver tests and for running display code on a workstation.

#![deny(unsafe_code)]

pub mod pin;
pub mod tm1637;

pub use pin::{PinAction, PinEvent, SimBoard, SimError, SimPin};
pub use tm1637::{Frame, Tm1637Model};
