//! TM1637 4-digit segment display
//!
//! [`SerialBus`] bit-bangs the chip's 2-wire protocol; [`SegmentDisplay`]
//! builds text, number and animation operations on top of it.

pub mod bus;
pub mod display;

pub use bus::SerialBus;
pub use display::{SegmentDisplay, COUNTDOWN_STEP, DEFAULT_SCROLL_DELAY};
