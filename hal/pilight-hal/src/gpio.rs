//! GPIO pin abstractions
//!
//! Drivers are written against `embedded_hal::digital::OutputPin` for lines
//! that only ever drive. Bidirectional lines, such as a 2-wire data line that
//! is released for an acknowledgement bit, additionally implement [`FlexPin`].

use embedded_hal::digital::OutputPin;

/// Line direction of a [`FlexPin`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Line is driven by this pin
    Output,
    /// Line is released and sampled
    Input,
}

/// Output pin whose direction can be switched at runtime
///
/// Implementations must keep the last written output level so that
/// switching back to [`Direction::Output`] drives the same level again.
pub trait FlexPin: OutputPin {
    /// Release the line and configure it as an input
    fn set_as_input(&mut self) -> Result<(), Self::Error>;

    /// Configure the line as an output again
    fn set_as_output(&mut self) -> Result<(), Self::Error>;

    /// Configure the line for the given direction
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        match direction {
            Direction::Output => self.set_as_output(),
            Direction::Input => self.set_as_input(),
        }
    }
}

impl<T: FlexPin + ?Sized> FlexPin for &mut T {
    fn set_as_input(&mut self) -> Result<(), Self::Error> {
        T::set_as_input(self)
    }

    fn set_as_output(&mut self) -> Result<(), Self::Error> {
        T::set_as_output(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    /// Mock flex pin for testing
    struct MockPin {
        high: bool,
        direction: Direction,
    }

    impl MockPin {
        fn new() -> Self {
            Self {
                high: false,
                direction: Direction::Output,
            }
        }
    }

    impl ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.high = true;
            Ok(())
        }
    }

    impl FlexPin for MockPin {
        fn set_as_input(&mut self) -> Result<(), Self::Error> {
            self.direction = Direction::Input;
            Ok(())
        }

        fn set_as_output(&mut self) -> Result<(), Self::Error> {
            self.direction = Direction::Output;
            Ok(())
        }
    }

    #[test]
    fn test_set_direction_dispatches() {
        let mut pin = MockPin::new();

        pin.set_direction(Direction::Input).unwrap();
        assert_eq!(pin.direction, Direction::Input);

        pin.set_direction(Direction::Output).unwrap();
        assert_eq!(pin.direction, Direction::Output);
    }

    #[test]
    fn test_direction_switch_keeps_level() {
        let mut pin = MockPin::new();
        pin.set_high().unwrap();
        pin.set_as_input().unwrap();
        pin.set_as_output().unwrap();
        assert!(pin.high);
    }

    #[test]
    fn test_mut_ref_forwards() {
        let mut pin = MockPin::new();
        {
            let mut by_ref = &mut pin;
            FlexPin::set_as_input(&mut by_ref).unwrap();
        }
        assert_eq!(pin.direction, Direction::Input);
    }
}
