//! Cycle timing and plan

use core::time::Duration;

use super::phase::{Lamp, TrafficPhase};
use crate::config::ConfigError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of blinks at the end of the green phase
pub const BLINK_COUNT: usize = 3;

/// Half period of a green blink
pub const BLINK_HALF_PERIOD: Duration = Duration::from_millis(500);

/// Seconds of the green phase taken by the blink tail
const BLINK_TAIL_S: u32 = 3;

/// Steps in one full cycle
pub const PLAN_LEN: usize = 24;

/// Phase durations in whole seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrafficTiming {
    /// Red phase duration
    pub red_s: u32,
    /// Amber phase duration
    pub amber_s: u32,
    /// Green phase duration, blink tail included
    pub green_s: u32,
}

impl Default for TrafficTiming {
    fn default() -> Self {
        Self {
            red_s: 10,
            amber_s: 3,
            green_s: 10,
        }
    }
}

impl TrafficTiming {
    /// Green must last longer than this many seconds
    pub const GREEN_FLOOR_S: u32 = 4;

    /// Create a timing set (red, amber, green order as wired top to bottom)
    pub const fn new(red_s: u32, amber_s: u32, green_s: u32) -> Self {
        Self {
            red_s,
            amber_s,
            green_s,
        }
    }

    /// Check that the green phase leaves room for the blink tail
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.green_s <= Self::GREEN_FLOOR_S {
            return Err(ConfigError::GreenTooShort {
                green_s: self.green_s,
            });
        }
        Ok(())
    }

    /// Planned duration reported for a phase
    pub const fn phase_seconds(&self, phase: TrafficPhase) -> u32 {
        match phase {
            TrafficPhase::Red => self.red_s,
            TrafficPhase::Green => self.green_s,
            TrafficPhase::GreenBlink => BLINK_TAIL_S,
            TrafficPhase::Amber => self.amber_s,
        }
    }

    /// Length of one full cycle
    pub fn cycle_duration(&self) -> Duration {
        let total = u64::from(self.red_s) + u64::from(self.green_s) + u64::from(self.amber_s);
        Duration::from_secs(total)
    }

    /// Plan one cycle, starting at red
    pub fn plan(&self) -> Result<CyclePlan, ConfigError> {
        self.validate()?;

        let mut plan = CyclePlan::new();
        let mut phase = TrafficPhase::Red;
        loop {
            self.plan_phase(phase, &mut plan);
            phase = phase.next();
            if phase == TrafficPhase::Red {
                break;
            }
        }
        Ok(plan)
    }

    fn plan_phase(&self, phase: TrafficPhase, plan: &mut CyclePlan) {
        let lamp = phase.lamp();
        let secs = |s: u32| CycleStep::Wait(Duration::from_secs(u64::from(s)));

        // PLAN_LEN is the exact step count, so extending never overflows
        match phase {
            TrafficPhase::Red | TrafficPhase::Amber => plan.extend([
                CycleStep::Switch { lamp, on: true },
                CycleStep::Enter(phase),
                secs(self.phase_seconds(phase)),
                CycleStep::Switch { lamp, on: false },
            ]),
            TrafficPhase::Green => plan.extend([
                CycleStep::Switch { lamp, on: true },
                CycleStep::Enter(phase),
                secs(self.green_s - BLINK_TAIL_S),
            ]),
            TrafficPhase::GreenBlink => {
                plan.extend([CycleStep::Enter(phase)]);
                for _ in 0..BLINK_COUNT {
                    plan.extend([
                        CycleStep::Wait(BLINK_HALF_PERIOD),
                        CycleStep::Switch { lamp, on: true },
                        CycleStep::Wait(BLINK_HALF_PERIOD),
                        CycleStep::Switch { lamp, on: false },
                    ]);
                }
            }
        }
    }
}

/// One action of the cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleStep {
    /// Drive a lamp
    Switch { lamp: Lamp, on: bool },
    /// A phase begins
    Enter(TrafficPhase),
    /// Cancellable pause
    Wait(Duration),
}

/// Ordered steps of one full cycle
pub type CyclePlan = heapless::Vec<CycleStep, PLAN_LEN>;
