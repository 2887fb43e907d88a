//! Error taxonomy for a heatgrid run.
//!
//! Validation errors ([`HeatgridError::InvalidGrid`],
//! [`HeatgridError::InvalidYear`], [`HeatgridError::Config`]) are raised before
//! the repository is touched. [`HeatgridError::RepositoryState`] is raised
//! before any object is written. [`HeatgridError::ObjectStoreWrite`] is the
//! only failure that can happen mid-chain, and it reports the checkpoint the
//! branch was left at.

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use heatgrid_git::{GitError, GitOid};
use thiserror::Error;

use crate::config::ConfigError;

/// Where in the grid a problem was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridLocation {
    /// The grid as a whole (wrong number of weeks).
    Whole,
    /// One week column (wrong length).
    Week(usize),
    /// A single cell.
    Cell { week: usize, day: usize },
}

impl fmt::Display for GridLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Whole => f.write_str("grid"),
            Self::Week(week) => write!(f, "week {week}"),
            Self::Cell { week, day } => write!(f, "week {week}, day {day}"),
        }
    }
}

/// Everything that can stop a run.
#[derive(Debug, Error)]
pub enum HeatgridError {
    /// Wrong shape or an unrecognised glyph.
    #[error("invalid grid at {location}: {reason}")]
    InvalidGrid {
        location: GridLocation,
        reason: String,
    },

    /// Year outside the range the date mapper can represent.
    #[error("invalid year {year}: supported years are {min}..={max}")]
    InvalidYear { year: i32, min: i32, max: i32 },

    /// The target location is not a usable repository, or using it would
    /// clobber uncommitted work.
    #[error("repository at {}: {reason}", path.display())]
    RepositoryState { path: PathBuf, reason: String },

    /// The object store kept failing while the chain was being written.
    ///
    /// `checkpoint` is the commit the branch was last advanced to (`None`
    /// when no batch of this run was checkpointed yet).
    #[error(
        "writing commit {position} ({date} #{ordinal}) failed after {attempts} attempt(s); \
         branch left at {}",
        checkpoint.map_or_else(|| "its previous tip".to_owned(), |c| c.short(12))
    )]
    ObjectStoreWrite {
        position: usize,
        date: NaiveDate,
        ordinal: u32,
        attempts: u32,
        checkpoint: Option<GitOid>,
        #[source]
        source: GitError,
    },

    /// Plan entries came out of chronological order.
    #[error("commit plan is out of order at entry {position}")]
    UnorderedPlan { position: usize },

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A store failure while reading repository state (no writes pending).
    #[error(transparent)]
    Git(#[from] GitError),

    /// The worktree copy of the marker file could not be refreshed. The
    /// chain itself is complete and checkpointed.
    #[error("could not refresh {} in the worktree: {source}", path.display())]
    WorktreeSync {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = HeatgridError> = std::result::Result<T, E>;
