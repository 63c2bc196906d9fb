//! Text fields for a 4-digit display
//!
//! Formats numbers, temperatures and times into the short strings the
//! segment encoder understands, and slides text across the digits.

use core::fmt::Write;

use heapless::String;

use crate::command::DIGITS;
use crate::segment::SegmentPattern;

/// A formatted field, at most one character per digit
pub type Field = String<DIGITS>;

/// Smallest number that fits in four digits
pub const NUMBER_MIN: i32 = -999;
/// Largest number that fits in four digits
pub const NUMBER_MAX: i32 = 9999;

/// Lowest temperature shown numerically
pub const TEMPERATURE_MIN: i32 = -9;
/// Highest temperature shown numerically
pub const TEMPERATURE_MAX: i32 = 99;

/// Number right-justified in a 4-character field
///
/// Values outside `-999..=9999` are clamped.
pub fn number_field(n: i32) -> Field {
    let n = n.clamp(NUMBER_MIN, NUMBER_MAX);
    let mut field = Field::new();
    // Clamped values always fit
    let _ = write!(field, "{:>4}", n);
    field
}

/// Temperature in degrees Celsius
///
/// `-9..=99` renders as a 2-character number, a degree sign and `C`.
/// Colder readings render as `lo`, hotter ones as `hi`.
pub fn temperature_field(celsius: i32) -> Field {
    let mut field = Field::new();
    if celsius < TEMPERATURE_MIN {
        let _ = field.push_str("lo");
    } else if celsius > TEMPERATURE_MAX {
        let _ = field.push_str("hi");
    } else {
        let _ = write!(field, "{:>2}*C", celsius);
    }
    field
}

/// Local time of day, minute resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

impl TimeOfDay {
    /// Create a time of day, wrapping out-of-range values
    pub const fn new(hour: u8, minute: u8) -> Self {
        Self {
            hour: hour % 24,
            minute: minute % 60,
        }
    }
}

/// Time as `HHMM`, zero padded
pub fn clock_field(time: TimeOfDay) -> Field {
    let mut field = Field::new();
    let _ = write!(field, "{:02}{:02}", time.hour % 24, time.minute % 60);
    field
}

/// Sliding 4-digit windows over text that enters from the right
///
/// The text is framed by a full screen of blanks on both sides, so the first
/// window and the last window are empty. Produces `len + 5` windows.
#[derive(Debug, Clone)]
pub struct ScrollWindows<'a> {
    patterns: &'a [SegmentPattern],
    offset: usize,
}

impl<'a> ScrollWindows<'a> {
    /// Windows over already encoded text
    pub fn new(patterns: &'a [SegmentPattern]) -> Self {
        Self {
            patterns,
            offset: 0,
        }
    }

    /// Total number of windows
    pub fn steps(&self) -> usize {
        self.patterns.len() + DIGITS + 1
    }

    fn cell(&self, index: usize) -> SegmentPattern {
        index
            .checked_sub(DIGITS)
            .and_then(|i| self.patterns.get(i))
            .copied()
            .unwrap_or(SegmentPattern::BLANK)
    }
}

impl Iterator for ScrollWindows<'_> {
    type Item = [SegmentPattern; DIGITS];

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.steps() {
            return None;
        }
        let start = self.offset;
        self.offset += 1;
        Some(core::array::from_fn(|i| self.cell(start + i)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.steps() - self.offset;
        (left, Some(left))
    }
}

impl ExactSizeIterator for ScrollWindows<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{encode_char, encode_str};
    use proptest::prelude::*;

    #[test]
    fn test_number_field() {
        assert_eq!(number_field(0).as_str(), "   0");
        assert_eq!(number_field(42).as_str(), "  42");
        assert_eq!(number_field(-999).as_str(), "-999");
        assert_eq!(number_field(9999).as_str(), "9999");
    }

    #[test]
    fn test_number_clamping() {
        assert_eq!(number_field(10000), number_field(9999));
        assert_eq!(number_field(i32::MAX), number_field(9999));
        assert_eq!(number_field(-1000), number_field(-999));
        assert_eq!(number_field(i32::MIN), number_field(-999));
    }

    #[test]
    fn test_temperature_field() {
        assert_eq!(temperature_field(24).as_str(), "24*C");
        assert_eq!(temperature_field(5).as_str(), " 5*C");
        assert_eq!(temperature_field(-9).as_str(), "-9*C");
        assert_eq!(temperature_field(99).as_str(), "99*C");
        assert_eq!(temperature_field(-10).as_str(), "lo");
        assert_eq!(temperature_field(100).as_str(), "hi");
    }

    #[test]
    fn test_clock_field() {
        assert_eq!(clock_field(TimeOfDay::new(9, 5)).as_str(), "0905");
        assert_eq!(clock_field(TimeOfDay::new(23, 59)).as_str(), "2359");
        assert_eq!(TimeOfDay::new(24, 60), TimeOfDay::new(0, 0));
    }

    #[test]
    fn test_scroll_steps() {
        let text: heapless::Vec<SegmentPattern, 8> = encode_str("ab").unwrap();
        let windows: std::vec::Vec<_> = ScrollWindows::new(&text).collect();
        assert_eq!(windows.len(), 7);

        let blank = [SegmentPattern::BLANK; DIGITS];
        let a = encode_char('a').unwrap();
        let b = encode_char('b').unwrap();
        let blank_cell = SegmentPattern::BLANK;

        assert_eq!(windows[0], blank);
        assert_eq!(windows[1], [blank_cell, blank_cell, blank_cell, a]);
        assert_eq!(windows[2], [blank_cell, blank_cell, a, b]);
        assert_eq!(windows[4], [a, b, blank_cell, blank_cell]);
        assert_eq!(windows[5], [b, blank_cell, blank_cell, blank_cell]);
        assert_eq!(windows[6], blank);
    }

    #[test]
    fn test_scroll_empty_text() {
        let windows = ScrollWindows::new(&[]);
        assert_eq!(windows.len(), 5);
        assert!(windows.into_iter().all(|w| w == [SegmentPattern::BLANK; DIGITS]));
    }

    proptest! {
        #[test]
        fn prop_number_field_is_four_wide(n in any::<i32>()) {
            let field = number_field(n);
            prop_assert_eq!(field.len(), 4);
            let parsed: i32 = field.trim_start().parse().unwrap();
            prop_assert_eq!(parsed, n.clamp(NUMBER_MIN, NUMBER_MAX));
        }

        #[test]
        fn prop_scroll_enters_and_leaves_blank(s in "[0-9a-z]{0,12}") {
            let text: heapless::Vec<SegmentPattern, 12> = encode_str(&s).unwrap();
            let windows: std::vec::Vec<_> = ScrollWindows::new(&text).collect();
            prop_assert_eq!(windows.len(), s.len() + 5);
            prop_assert_eq!(windows[0], [SegmentPattern::BLANK; DIGITS]);
            prop_assert_eq!(*windows.last().unwrap(), [SegmentPattern::BLANK; DIGITS]);
        }
    }
}
