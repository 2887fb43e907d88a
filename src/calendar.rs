//! Date mapping from grid cells to calendar days.
//!
//! Columns are weeks and rows are weekdays, Sunday first, as contribution
//! heatmaps draw them. Which Sunday column 0 starts on is decided by
//! [`WeekAlignment`]:
//!
//! - [`WeekAlignment::ContainingJan1`] (default): column 0 is the week that
//!   contains January 1, so it starts on the Sunday on or before that day.
//!   Rows before January 1 fall in the previous year. They are mapped to
//!   those real dates and are not clamped.
//! - [`WeekAlignment::FirstFullWeek`]: column 0 starts on the first Sunday on
//!   or after January 1. The last columns may spill into the next year.
//!
//! Either way the mapping is a pure function and strictly increasing in
//! reading order (week, then day).

use chrono::{Datelike, Days, NaiveDate};
use serde::Deserialize;

use crate::error::{HeatgridError, Result};
use crate::grid::{DAYS_PER_WEEK, WEEKS};

/// Earliest supported year. Column 0 of 1971 starts in late 1970, so every
/// mapped date has a non-negative Unix timestamp.
pub const MIN_YEAR: i32 = 1971;
/// Latest supported (four-digit) year.
pub const MAX_YEAR: i32 = 9999;

/// Which Sunday the first column starts on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeekAlignment {
    /// Sunday on or before January 1.
    #[default]
    ContainingJan1,
    /// Sunday on or after January 1.
    FirstFullWeek,
}

/// Reject years the mapper cannot represent.
///
/// # Errors
/// [`HeatgridError::InvalidYear`] outside [`MIN_YEAR`]`..=`[`MAX_YEAR`].
pub fn validate_year(year: i32) -> Result<()> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(HeatgridError::InvalidYear {
            year,
            min: MIN_YEAR,
            max: MAX_YEAR,
        })
    }
}

/// Maps `(week, day)` cells of one year's grid to dates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateMapper {
    year: i32,
    origin: NaiveDate,
}

impl DateMapper {
    /// # Errors
    /// [`HeatgridError::InvalidYear`] for unsupported years.
    pub fn new(year: i32, alignment: WeekAlignment) -> Result<Self> {
        validate_year(year)?;
        let invalid = || HeatgridError::InvalidYear {
            year,
            min: MIN_YEAR,
            max: MAX_YEAR,
        };
        let jan1 = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?;
        let since_sunday = u64::from(jan1.weekday().num_days_from_sunday());
        let origin = match alignment {
            WeekAlignment::ContainingJan1 => jan1.checked_sub_days(Days::new(since_sunday)),
            WeekAlignment::FirstFullWeek => {
                jan1.checked_add_days(Days::new((7 - since_sunday) % 7))
            }
        }
        .ok_or_else(invalid)?;
        Ok(Self { year, origin })
    }

    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// The date of cell `(0, 0)`. Always a Sunday.
    #[must_use]
    pub const fn origin(&self) -> NaiveDate {
        self.origin
    }

    /// Date of a cell, or `None` when `week`/`day` lie outside the grid.
    #[must_use]
    pub fn date(&self, week: usize, day: usize) -> Option<NaiveDate> {
        if week >= WEEKS || day >= DAYS_PER_WEEK {
            return None;
        }
        let offset = u64::try_from(week * DAYS_PER_WEEK + day).ok()?;
        self.origin.checked_add_days(Days::new(offset))
    }
}

/// One-shot form of [`DateMapper::date`].
///
/// # Errors
/// [`HeatgridError::InvalidYear`] for unsupported years and
/// [`HeatgridError::InvalidGrid`] for coordinates outside the grid.
pub fn map_date(year: i32, alignment: WeekAlignment, week: usize, day: usize) -> Result<NaiveDate> {
    DateMapper::new(year, alignment)?
        .date(week, day)
        .ok_or_else(|| HeatgridError::InvalidGrid {
            location: crate::error::GridLocation::Cell { week, day },
            reason: format!("cell lies outside the {WEEKS}x{DAYS_PER_WEEK} grid"),
        })
}
