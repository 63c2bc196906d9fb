//! Peripheral drivers for Raspberry Pi hosts
//!
//! This crate drives the two fixtures on top of the pin traits in
//! `pilight-hal` and the protocol logic in `pilight-core`:
//!
//! - TM1637 4-digit segment display (bit-banged 2-wire bus)
//! - 3-lamp traffic light
//!
//! Animations (countdown, clock) and the traffic cycle run on a dedicated
//! worker thread per device, see [`task`].

#![deny(unsafe_code)]

pub mod clock;
pub mod config;
pub mod error;
pub mod task;
pub mod tm1637;
pub mod traffic;

pub use clock::{SystemClock, WallClock};
pub use config::{load_config, parse_config, ConfigLoadError};
pub use error::Error;
pub use task::{BackgroundTask, StopToken};
pub use tm1637::{SegmentDisplay, SerialBus};
pub use traffic::{PhaseCallback, TrafficLight};

pub use pilight_core::text::TimeOfDay;
pub use pilight_core::traffic::Lamp;
pub use pilight_core::{Brightness, SegmentPattern, TrafficPhase, TrafficTiming};
