//! Traffic light cycle
//!
//! The fixture cycles red → green → green blink → amber forever. The cycle
//! is planned here as a flat list of steps; the driver only executes it.

pub mod cycle;
pub mod phase;

pub use cycle::{CyclePlan, CycleStep, TrafficTiming, BLINK_COUNT, BLINK_HALF_PERIOD};
pub use phase::{Lamp, TrafficPhase};
