//! The fixed glyph table.
//!
//! Each grid cell holds one of five glyphs. A glyph names an intensity
//! level, and each level maps to an inclusive range of commits per day.

use std::fmt;
use std::ops::RangeInclusive;

/// An intensity glyph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Glyph {
    /// `#`: no commits.
    Zero,
    /// `$`: 1 to 9 commits.
    Low,
    /// `&`: 10 to 19 commits.
    Mid,
    /// `*`: 20 to 29 commits.
    High,
    /// `.`: 30 to 50 commits.
    Max,
}

impl Glyph {
    /// Every glyph, from least to most intense.
    pub const ALL: [Self; 5] = [Self::Zero, Self::Low, Self::Mid, Self::High, Self::Max];

    /// Parse a single character.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '#' => Some(Self::Zero),
            '$' => Some(Self::Low),
            '&' => Some(Self::Mid),
            '*' => Some(Self::High),
            '.' => Some(Self::Max),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Zero => '#',
            Self::Low => '$',
            Self::Mid => '&',
            Self::High => '*',
            Self::Max => '.',
        }
    }

    /// Inclusive commit-count range for one day at this intensity.
    #[must_use]
    pub const fn commit_range(self) -> RangeInclusive<u32> {
        match self {
            Self::Zero => 0..=0,
            Self::Low => 1..=9,
            Self::Mid => 10..=19,
            Self::High => 20..=29,
            Self::Max => 30..=50,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Zero => "none",
            Self::Low => "low",
            Self::Mid => "medium",
            Self::High => "high",
            Self::Max => "maximum",
        }
    }
}

impl fmt::Display for Glyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl TryFrom<char> for Glyph {
    type Error = char;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        Self::from_char(c).ok_or(c)
    }
}
