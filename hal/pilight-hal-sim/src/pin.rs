//! Simulated GPIO pins

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};
use pilight_hal::{Direction, FlexPin};

/// What happened to a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinAction {
    /// Output driven high
    High,
    /// Output driven low
    Low,
    /// Line released (input mode)
    Input,
    /// Line driven again (output mode)
    Output,
}

/// One entry of the board's event log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinEvent {
    /// Pin number the action was applied to
    pub pin: u8,
    pub action: PinAction,
}

/// Injected pin failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimError {
    /// Pin whose operation failed
    pub pin: u8,
}

impl embedded_hal::digital::Error for SimError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug, Clone, Copy)]
struct PinState {
    high: bool,
    direction: Direction,
}

#[derive(Debug, Default)]
struct BoardState {
    events: Vec<PinEvent>,
    pins: BTreeMap<u8, PinState>,
    /// Operations left before every pin operation fails
    budget: Option<usize>,
}

/// Shared bank of simulated pins
///
/// Cloning the board yields another handle to the same bank.
#[derive(Debug, Clone, Default)]
pub struct SimBoard {
    state: Arc<Mutex<BoardState>>,
}

impl SimBoard {
    /// Create an empty board
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a pin
    ///
    /// The pin starts as a low output. Claiming the same number twice gives
    /// two handles to one line.
    pub fn pin(&self, pin: u8) -> SimPin {
        self.lock().pins.entry(pin).or_insert(PinState {
            high: false,
            direction: Direction::Output,
        });
        SimPin {
            pin,
            board: self.clone(),
        }
    }

    /// Snapshot of the event log
    pub fn events(&self) -> Vec<PinEvent> {
        self.lock().events.clone()
    }

    /// Drop all recorded events
    pub fn clear_events(&self) {
        self.lock().events.clear();
    }

    /// Number of recorded events
    pub fn event_count(&self) -> usize {
        self.lock().events.len()
    }

    /// Last driven level of a pin, `None` for unclaimed pins
    pub fn is_high(&self, pin: u8) -> Option<bool> {
        self.lock().pins.get(&pin).map(|p| p.high)
    }

    /// Current direction of a pin, `None` for unclaimed pins
    pub fn direction(&self, pin: u8) -> Option<Direction> {
        self.lock().pins.get(&pin).map(|p| p.direction)
    }

    /// Let `ops` more pin operations succeed, then fail all of them
    pub fn fail_after(&self, ops: usize) {
        self.lock().budget = Some(ops);
    }

    /// Remove an injected failure
    pub fn heal(&self) {
        self.lock().budget = None;
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, pin: u8, action: PinAction) -> Result<(), SimError> {
        let mut state = self.lock();

        if let Some(budget) = state.budget.as_mut() {
            if *budget == 0 {
                return Err(SimError { pin });
            }
            *budget -= 1;
        }

        let entry = state.pins.entry(pin).or_insert(PinState {
            high: false,
            direction: Direction::Output,
        });
        match action {
            PinAction::High => entry.high = true,
            PinAction::Low => entry.high = false,
            PinAction::Input => entry.direction = Direction::Input,
            PinAction::Output => entry.direction = Direction::Output,
        }
        state.events.push(PinEvent { pin, action });
        Ok(())
    }
}

/// Handle to one simulated line
#[derive(Debug)]
pub struct SimPin {
    pin: u8,
    board: SimBoard,
}

impl SimPin {
    /// Pin number
    pub fn number(&self) -> u8 {
        self.pin
    }
}

impl ErrorType for SimPin {
    type Error = SimError;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.board.apply(self.pin, PinAction::Low)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.board.apply(self.pin, PinAction::High)
    }
}

impl FlexPin for SimPin {
    fn set_as_input(&mut self) -> Result<(), Self::Error> {
        self.board.apply(self.pin, PinAction::Input)
    }

    fn set_as_output(&mut self) -> Result<(), Self::Error> {
        self.board.apply(self.pin, PinAction::Output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_are_ordered_across_pins() {
        let board = SimBoard::new();
        let mut a = board.pin(1);
        let mut b = board.pin(2);

        a.set_high().unwrap();
        b.set_high().unwrap();
        a.set_low().unwrap();

        assert_eq!(
            board.events(),
            vec![
                PinEvent { pin: 1, action: PinAction::High },
                PinEvent { pin: 2, action: PinAction::High },
                PinEvent { pin: 1, action: PinAction::Low },
            ]
        );
        assert_eq!(board.is_high(1), Some(false));
        assert_eq!(board.is_high(2), Some(true));
        assert_eq!(board.is_high(3), None);
    }

    #[test]
    fn test_direction_tracking() {
        let board = SimBoard::new();
        let mut pin = board.pin(4);

        pin.set_as_input().unwrap();
        assert_eq!(board.direction(4), Some(Direction::Input));
        pin.set_as_output().unwrap();
        assert_eq!(board.direction(4), Some(Direction::Output));
    }

    #[test]
    fn test_fault_injection() {
        let board = SimBoard::new();
        let mut pin = board.pin(7);
        board.fail_after(2);

        assert!(pin.set_high().is_ok());
        assert!(pin.set_low().is_ok());
        assert_eq!(pin.set_high(), Err(SimError { pin: 7 }));
        // Failed operations are not recorded
        assert_eq!(board.event_count(), 2);

        board.heal();
        assert!(pin.set_high().is_ok());
    }

    #[test]
    fn test_clones_share_the_bank() {
        let board = SimBoard::new();
        let other = board.clone();
        let mut pin = other.pin(3);
        pin.set_high().unwrap();
        assert_eq!(board.is_high(3), Some(true));
        board.clear_events();
        assert_eq!(other.event_count(), 0);
    }
}
