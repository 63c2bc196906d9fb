//! Seven-segment character encoding
//!
//! Segment bits, LSB first: A, B, C, D, E, F, G, DP.
//!
//! ```text
//!       A
//!      ---
//!   F |   | B
//!      -G-
//!   E |   | C
//!      ---
//!       D
//! ```

use core::fmt;

/// Glyph table: 0-9, a-z, space, dash, star (degree sign)
const GLYPHS: [u8; 39] = [
    0x3F, 0x06, 0x5B, 0x4F, 0x66, 0x6D, 0x7D, 0x07, 0x7F, 0x6F, // 0-9
    0x77, 0x7C, 0x39, 0x5E, 0x79, 0x71, 0x3D, 0x76, 0x0F, 0x1E, // a-j
    0x75, 0x38, 0x37, 0x54, 0x5C, 0x73, 0x67, 0x50, 0x49, 0x78, // k-t
    0x3E, 0x1C, 0x7E, 0x64, 0x6E, 0x5A, // u-z
    0x00, // space
    0x40, // dash
    0x63, // star
];

const SPACE_INDEX: usize = 36;
const DASH_INDEX: usize = 37;
const STAR_INDEX: usize = 38;

/// Decimal point / colon bit
const POINT: u8 = 0x80;

/// Segment pattern for one digit cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct SegmentPattern(u8);

impl SegmentPattern {
    /// All segments off
    pub const BLANK: Self = Self(0x00);

    /// Create a pattern from raw segment bits
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw segment bits as sent on the wire
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Same glyph with the point/colon bit set or cleared
    #[must_use]
    pub const fn with_point(self, on: bool) -> Self {
        if on {
            Self(self.0 | POINT)
        } else {
            Self(self.0 & !POINT)
        }
    }

    /// Check if the point/colon bit is set
    pub const fn has_point(self) -> bool {
        self.0 & POINT != 0
    }
}

impl From<SegmentPattern> for u8 {
    fn from(pattern: SegmentPattern) -> Self {
        pattern.0
    }
}

/// A character with no glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncodeError {
    /// The offending character
    pub ch: char,
    /// Character index within the encoded text
    pub position: usize,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid character {:?} (U+{:04X}) at position {}",
            self.ch, self.ch as u32, self.position
        )
    }
}

impl core::error::Error for EncodeError {}

/// Text that cannot be encoded into a fixed-capacity buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeStrError {
    /// A character with no glyph
    Invalid(EncodeError),
    /// More characters than the buffer holds
    TooLong { len: usize, capacity: usize },
}

impl From<EncodeError> for EncodeStrError {
    fn from(err: EncodeError) -> Self {
        EncodeStrError::Invalid(err)
    }
}

impl fmt::Display for EncodeStrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeStrError::Invalid(err) => err.fmt(f),
            EncodeStrError::TooLong { len, capacity } => {
                write!(f, "{} characters do not fit in {} cells", len, capacity)
            }
        }
    }
}

impl core::error::Error for EncodeStrError {}

fn glyph_index(ch: char) -> Option<usize> {
    match ch {
        '0'..='9' => Some(ch as usize - '0' as usize),
        'a'..='z' => Some(ch as usize - 'a' as usize + 10),
        'A'..='Z' => Some(ch as usize - 'A' as usize + 10),
        ' ' => Some(SPACE_INDEX),
        '-' => Some(DASH_INDEX),
        '*' => Some(STAR_INDEX),
        _ => None,
    }
}

/// Encode a single character
///
/// Supports `0-9`, `a-z`, `A-Z` (same glyphs as lowercase), space, `-` and
/// `*` (rendered as a degree sign).
pub fn encode_char(ch: char) -> Result<SegmentPattern, EncodeError> {
    glyph_index(ch)
        .map(|i| SegmentPattern(GLYPHS[i]))
        .ok_or(EncodeError { ch, position: 0 })
}

/// Encode text character by character
///
/// Yields one result per character; errors carry the character position.
pub fn encode_iter(text: &str) -> impl Iterator<Item = Result<SegmentPattern, EncodeError>> + '_ {
    text.chars().enumerate().map(|(position, ch)| {
        encode_char(ch).map_err(|e| EncodeError { position, ..e })
    })
}

/// Encode text into `out`, returning the number of patterns written
///
/// The whole text is validated before anything is written. Text longer
/// than `out` is validated in full and then truncated to fit.
pub fn encode_into(text: &str, out: &mut [SegmentPattern]) -> Result<usize, EncodeError> {
    if let Some(err) = encode_iter(text).find_map(Result::err) {
        return Err(err);
    }

    let mut written = 0;
    for (slot, pattern) in out.iter_mut().zip(encode_iter(text).flatten()) {
        *slot = pattern;
        written += 1;
    }
    Ok(written)
}

/// Encode text into a fixed-capacity buffer, one pattern per character
///
/// Fails on the first invalid character, then on text longer than `N`.
/// Nothing is truncated or padded.
pub fn encode_str<const N: usize>(
    text: &str,
) -> Result<heapless::Vec<SegmentPattern, N>, EncodeStrError> {
    let mut out = heapless::Vec::new();
    for pattern in encode_iter(text) {
        let pattern = pattern?;
        if out.push(pattern).is_err() {
            // Report invalid characters past the capacity first
            encode_iter(text).try_for_each(|p| p.map(drop))?;
            return Err(EncodeStrError::TooLong {
                len: text.chars().count(),
                capacity: N,
            });
        }
    }
    Ok(out)
}
