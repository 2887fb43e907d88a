//! Commit messages and the run trailers they carry.
//!
//! ```text
//! heatgrid: 2022-03-09 #3
//!
//! Heatgrid-Plan: 5f0c2b7a91d4e8c3
//! Heatgrid-Seed: 42
//! Heatgrid-Entry: 4/37
//! ```
//!
//! The trailers on a branch tip are enough to tell whether the run that
//! wrote it finished, and to regenerate its plan.

use crate::plan::PlanEntry;

/// File upserted into every synthetic commit's tree.
pub const MARKER_FILE: &str = "heatgrid.log";

const PLAN_KEY: &str = "Heatgrid-Plan";
const SEED_KEY: &str = "Heatgrid-Seed";
const ENTRY_KEY: &str = "Heatgrid-Entry";

/// Identity and progress of the run that wrote a commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunMarker {
    pub plan_id: String,
    pub seed: u64,
    /// 1-based position of the commit in its plan.
    pub position: usize,
    pub len: usize,
}

impl RunMarker {
    /// Whether the commit carrying this marker was the last of its plan.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.position >= self.len
    }

    /// Read the trailers from a commit message. `None` unless all three are
    /// present and well formed.
    #[must_use]
    pub fn parse(message: &str) -> Option<Self> {
        let mut plan_id = None;
        let mut seed = None;
        let mut entry = None;
        for line in message.lines() {
            let Some((key, value)) = line.split_once(": ") else {
                continue;
            };
            let value = value.trim();
            match key {
                PLAN_KEY => plan_id = Some(value.to_owned()),
                SEED_KEY => seed = value.parse::<u64>().ok(),
                ENTRY_KEY => {
                    entry = value.split_once('/').and_then(|(pos, len)| {
                        Some((pos.parse::<usize>().ok()?, len.parse::<usize>().ok()?))
                    });
                }
                _ => {}
            }
        }
        let (position, len) = entry?;
        if position == 0 || position > len {
            return None;
        }
        Some(Self {
            plan_id: plan_id?,
            seed: seed?,
            position,
            len,
        })
    }
}

/// Full message for one planned commit.
#[must_use]
pub fn commit_message(entry: &PlanEntry, plan_id: &str, seed: u64, len: usize) -> String {
    format!(
        "heatgrid: {} #{}\n\n{PLAN_KEY}: {plan_id}\n{SEED_KEY}: {seed}\n{ENTRY_KEY}: {}/{len}\n",
        entry.date,
        entry.ordinal,
        entry.position + 1
    )
}

/// Contents of [`MARKER_FILE`] after `entry` is written.
#[must_use]
pub fn marker_contents(entry: &PlanEntry) -> String {
    format!("{} #{}\n", entry.date, entry.ordinal)
}
