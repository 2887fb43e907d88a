//! The 52x7 glyph grid.
//!
//! Text form: one line per week column, 52 lines, each exactly 7 glyphs
//! (Sunday first) with no separators. Surrounding whitespace is trimmed and
//! blank lines are skipped, so week numbers in errors count non-blank lines.

use std::fmt;
use std::str::FromStr;

use crate::error::{GridLocation, HeatgridError, Result};
use crate::symbols::Glyph;

/// Week columns in a grid.
pub const WEEKS: usize = 52;
/// Rows per column, Sunday through Saturday.
pub const DAYS_PER_WEEK: usize = 7;

/// One grid cell in reading order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub week: usize,
    pub day: usize,
    pub glyph: Glyph,
}

/// A validated 52x7 grid. Shape is fixed at construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    weeks: Vec<[Glyph; DAYS_PER_WEEK]>,
}

impl Grid {
    /// A grid with every cell set to `glyph`.
    #[must_use]
    pub fn filled(glyph: Glyph) -> Self {
        Self {
            weeks: vec![[glyph; DAYS_PER_WEEK]; WEEKS],
        }
    }

    /// The built-in sample: every week reads `#$&*...`, a ramp from empty
    /// on Sunday to maximum from Thursday on.
    #[must_use]
    pub fn demo() -> Self {
        let week = [
            Glyph::Zero,
            Glyph::Low,
            Glyph::Mid,
            Glyph::High,
            Glyph::Max,
            Glyph::Max,
            Glyph::Max,
        ];
        Self {
            weeks: vec![week; WEEKS],
        }
    }

    /// Build from week rows such as `"#$&*..."`.
    ///
    /// # Errors
    /// [`HeatgridError::InvalidGrid`] naming the first bad week or cell.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self> {
        if rows.len() != WEEKS {
            return Err(HeatgridError::InvalidGrid {
                location: GridLocation::Whole,
                reason: format!("expected {WEEKS} weeks, found {}", rows.len()),
            });
        }
        let weeks = rows
            .iter()
            .enumerate()
            .map(|(week, row)| parse_week(week, row.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { weeks })
    }

    /// Parse the text form.
    ///
    /// # Errors
    /// [`HeatgridError::InvalidGrid`] for a wrong line count, a line of the
    /// wrong length, or an unknown glyph.
    pub fn parse(text: &str) -> Result<Self> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        Self::from_rows(&rows)
    }

    #[must_use]
    pub fn glyph(&self, week: usize, day: usize) -> Option<Glyph> {
        self.weeks.get(week)?.get(day).copied()
    }

    /// Set one cell.
    ///
    /// # Errors
    /// [`HeatgridError::InvalidGrid`] if the coordinates lie outside the grid.
    pub fn set(&mut self, week: usize, day: usize, glyph: Glyph) -> Result<()> {
        let slot = self
            .weeks
            .get_mut(week)
            .and_then(|w| w.get_mut(day))
            .ok_or_else(|| HeatgridError::InvalidGrid {
                location: GridLocation::Cell { week, day },
                reason: format!("cell lies outside the {WEEKS}x{DAYS_PER_WEEK} grid"),
            })?;
        *slot = glyph;
        Ok(())
    }

    /// All cells, week by week, Sunday first.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.weeks.iter().enumerate().flat_map(|(week, days)| {
            days.iter()
                .enumerate()
                .map(move |(day, &glyph)| Cell { week, day, glyph })
        })
    }

    /// Number of cells holding each glyph, in [`Glyph::ALL`] order.
    #[must_use]
    pub fn histogram(&self) -> [usize; 5] {
        let mut counts = [0; 5];
        for cell in self.cells() {
            counts[cell.glyph as usize] += 1;
        }
        counts
    }
}

fn parse_week(week: usize, row: &str) -> Result<[Glyph; DAYS_PER_WEEK]> {
    let chars: Vec<char> = row.chars().collect();
    if chars.len() != DAYS_PER_WEEK {
        return Err(HeatgridError::InvalidGrid {
            location: GridLocation::Week(week),
            reason: format!(
                "expected {DAYS_PER_WEEK} glyphs, found {} in {row:?}",
                chars.len()
            ),
        });
    }
    let mut days = [Glyph::Zero; DAYS_PER_WEEK];
    for (day, (slot, c)) in days.iter_mut().zip(chars).enumerate() {
        *slot = Glyph::try_from(c).map_err(|c| HeatgridError::InvalidGrid {
            location: GridLocation::Cell { week, day },
            reason: format!("unrecognised glyph {c:?} (expected one of # $ & * .)"),
        })?;
    }
    Ok(days)
}

impl FromStr for Grid {
    type Err = HeatgridError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for days in &self.weeks {
            for glyph in days {
                write!(f, "{glyph}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
