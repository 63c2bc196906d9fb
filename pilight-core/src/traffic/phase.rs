//! Traffic light phases
//!
//! Phases form a closed ring with no terminal state.

/// One of the three lamps of the fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Lamp {
    Red,
    Amber,
    Green,
}

impl Lamp {
    /// All lamps, top to bottom
    pub const ALL: [Lamp; 3] = [Lamp::Red, Lamp::Amber, Lamp::Green];
}

/// Traffic light phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TrafficPhase {
    /// Stop
    Red,
    /// Go
    Green,
    /// Green flashing before amber
    GreenBlink,
    /// Prepare to stop
    Amber,
}

impl TrafficPhase {
    /// The phase that follows this one
    pub const fn next(self) -> Self {
        match self {
            TrafficPhase::Red => TrafficPhase::Green,
            TrafficPhase::Green => TrafficPhase::GreenBlink,
            TrafficPhase::GreenBlink => TrafficPhase::Amber,
            TrafficPhase::Amber => TrafficPhase::Red,
        }
    }

    /// Lamp lit during this phase
    pub const fn lamp(self) -> Lamp {
        match self {
            TrafficPhase::Red => Lamp::Red,
            TrafficPhase::Green | TrafficPhase::GreenBlink => Lamp::Green,
            TrafficPhase::Amber => Lamp::Amber,
        }
    }

    /// Whether entering this phase is reported to the phase-change callback
    ///
    /// The blink tail belongs to the announced green phase.
    pub const fn is_announced(self) -> bool {
        !matches!(self, TrafficPhase::GreenBlink)
    }

    /// Color name
    pub const fn name(self) -> &'static str {
        match self {
            TrafficPhase::Red => "red",
            TrafficPhase::Green => "green",
            TrafficPhase::GreenBlink => "green-blink",
            TrafficPhase::Amber => "amber",
        }
    }
}

impl core::fmt::Display for TrafficPhase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
