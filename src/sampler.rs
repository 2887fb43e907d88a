//! Per-cell commit-count sampling.
//!
//! The random source is a type parameter so callers (and tests) decide how
//! it is seeded. [`CountSampler::seeded`] is what the pipeline uses.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::calendar::DateMapper;
use crate::grid::Grid;
use crate::symbols::Glyph;

/// A grid cell resolved to its calendar date and sampled commit count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DatedCell {
    pub week: usize,
    pub day: usize,
    pub date: NaiveDate,
    pub count: u32,
}

/// Draws a commit count for each glyph.
#[derive(Debug)]
pub struct CountSampler<R> {
    rng: R,
}

impl CountSampler<StdRng> {
    /// Deterministic sampler: the same seed always yields the same counts.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> CountSampler<R> {
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }

    /// A uniform draw from the glyph's inclusive range. The zero glyph
    /// always yields 0 without consuming randomness.
    pub fn sample(&mut self, glyph: Glyph) -> u32 {
        let range = glyph.commit_range();
        if range.start() == range.end() {
            return *range.start();
        }
        self.rng.random_range(range)
    }

    /// Date and count for every cell, in reading order.
    ///
    /// Cells are sampled one after another so a seed fixes every count.
    pub fn date_cells(&mut self, grid: &Grid, dates: &DateMapper) -> Vec<DatedCell> {
        grid.cells()
            .filter_map(|cell| {
                let date = dates.date(cell.week, cell.day)?;
                Some(DatedCell {
                    week: cell.week,
                    day: cell.day,
                    date,
                    count: self.sample(cell.glyph),
                })
            })
            .collect()
    }
}
