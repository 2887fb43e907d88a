//! History planning: dated cells flattened into an ordered commit plan.

use std::fmt::Write as _;

use chrono::{NaiveDate, NaiveTime};
use sha2::{Digest, Sha256};

use crate::config::ScheduleConfig;
use crate::error::{HeatgridError, Result};
use crate::sampler::DatedCell;

/// Time-of-day policy for planned commits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schedule {
    pub hour: u32,
    pub offset_seconds: i32,
    pub step_seconds: u32,
}

impl Default for Schedule {
    fn default() -> Self {
        Self::from_config(&ScheduleConfig::default())
    }
}

impl Schedule {
    #[must_use]
    pub const fn from_config(cfg: &ScheduleConfig) -> Self {
        Self {
            hour: cfg.hour,
            offset_seconds: cfg.utc_offset_minutes * 60,
            step_seconds: cfg.step_seconds,
        }
    }

    /// Unix seconds of the `ordinal`-th commit on `date`, interpreted in the
    /// schedule's fixed offset.
    #[must_use]
    pub fn timestamp(&self, date: NaiveDate, ordinal: u32) -> i64 {
        let start = NaiveTime::from_hms_opt(self.hour, 0, 0).unwrap_or(NaiveTime::MIN);
        let local = date.and_time(start).and_utc().timestamp();
        local - i64::from(self.offset_seconds) + i64::from(ordinal) * i64::from(self.step_seconds)
    }
}

/// One commit to write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlanEntry {
    /// 0-based index in the plan.
    pub position: usize,
    pub date: NaiveDate,
    /// Index within the day, `0..count`.
    pub ordinal: u32,
    /// Unix seconds used for both author and committer.
    pub timestamp: i64,
}

/// The full ordered plan for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitPlan {
    year: i32,
    offset_seconds: i32,
    entries: Vec<PlanEntry>,
    id: String,
}

impl CommitPlan {
    /// Expand dated cells into entries.
    ///
    /// Cells must arrive in reading order. Zero-count cells contribute
    /// nothing. The result is checked for strictly increasing timestamps
    /// rather than sorted.
    ///
    /// # Errors
    /// [`HeatgridError::UnorderedPlan`] if an entry does not come strictly
    /// after its predecessor.
    pub fn build(year: i32, cells: &[DatedCell], schedule: &Schedule) -> Result<Self> {
        let entries: Vec<PlanEntry> = cells
            .iter()
            .filter(|cell| cell.count > 0)
            .flat_map(|cell| (0..cell.count).map(move |ordinal| (cell.date, ordinal)))
            .enumerate()
            .map(|(position, (date, ordinal))| PlanEntry {
                position,
                date,
                ordinal,
                timestamp: schedule.timestamp(date, ordinal),
            })
            .collect();
        verify_order(&entries)?;
        let id = plan_id(year, &entries);
        Ok(Self {
            year,
            offset_seconds: schedule.offset_seconds,
            entries,
            id,
        })
    }

    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// UTC offset recorded in every commit signature.
    #[must_use]
    pub const fn offset_seconds(&self) -> i32 {
        self.offset_seconds
    }

    #[must_use]
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 16 hex chars identifying the year and every entry.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

fn verify_order(entries: &[PlanEntry]) -> Result<()> {
    for pair in entries.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let ordered = (prev.date, prev.ordinal) < (next.date, next.ordinal)
            && prev.timestamp < next.timestamp;
        if !ordered {
            return Err(HeatgridError::UnorderedPlan {
                position: next.position,
            });
        }
    }
    Ok(())
}

/// SHA-256 of `year '\n'` then `date ' ' ordinal ' ' timestamp '\n'` per
/// entry, truncated to 8 bytes.
fn plan_id(year: i32, entries: &[PlanEntry]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{year}\n").as_bytes());
    for e in entries {
        hasher.update(format!("{} {} {}\n", e.date, e.ordinal, e.timestamp).as_bytes());
    }
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(16);
    for b in &digest[..8] {
        let _ = write!(hex, "{b:02x}");
    }
    hex
}
