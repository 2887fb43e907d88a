//! Run configuration (`.heatgrid.toml`).
//!
//! Every field has a default, and a missing file means "all defaults".
//! Command-line flags override individual values after loading.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::calendar::WeekAlignment;

/// File name looked up in the repository root when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = ".heatgrid.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeatgridConfig {
    #[serde(default)]
    pub repo: RepoConfig,

    /// Commit identity. Unset fields fall back to the repository's
    /// `user.name`/`user.email`, then to a built-in placeholder.
    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub build: BuildConfig,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepoConfig {
    /// Branch the history is written to (default: `"main"`).
    #[serde(default = "default_branch")]
    pub branch: String,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            branch: default_branch(),
        }
    }
}

fn default_branch() -> String {
    "main".to_owned()
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// When in the day commits land.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub alignment: WeekAlignment,

    /// Local hour of the first commit of each day.
    #[serde(default = "default_hour")]
    pub hour: u32,

    /// Fixed offset east of UTC used for every timestamp.
    #[serde(default)]
    pub utc_offset_minutes: i32,

    /// Gap between consecutive commits on the same day.
    #[serde(default = "default_step_seconds")]
    pub step_seconds: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            alignment: WeekAlignment::default(),
            hour: default_hour(),
            utc_offset_minutes: 0,
            step_seconds: default_step_seconds(),
        }
    }
}

const fn default_hour() -> u32 {
    12
}

const fn default_step_seconds() -> u32 {
    60
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Commits written between branch checkpoints.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Extra attempts for a store call that failed transiently.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
        }
    }
}

const fn default_batch_size() -> usize {
    1000
}

const fn default_max_retries() -> u32 {
    3
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A config file that could not be read, parsed, or validated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigError {
    pub path: Option<PathBuf>,
    /// Human-readable message, with a line number for parse errors.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.path {
            write!(f, "{}: {}", p.display(), self.message)
        } else {
            write!(f, "config error: {}", self.message)
        }
    }
}

impl std::error::Error for ConfigError {}

impl ConfigError {
    fn invalid(message: String) -> Self {
        Self {
            path: None,
            message,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl HeatgridConfig {
    /// Load and validate a config file. A missing file yields defaults.
    ///
    /// # Errors
    /// Returns `ConfigError` on I/O errors other than not-found, on invalid
    /// TOML or unknown fields, and on out-of-range values.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError {
                    path: Some(path.to_owned()),
                    message: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ConfigError` on invalid TOML, unknown fields, or
    /// out-of-range values.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                let line = toml_str[..span.start].chars().filter(|&c| c == '\n').count() + 1;
                message = format!("line {line}: {message}");
            }
            ConfigError::invalid(message)
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check value ranges. Called by [`parse`](Self::parse) and again after
    /// command-line overrides are applied.
    ///
    /// # Errors
    /// Returns the first out-of-range value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.schedule;
        if s.hour > 23 {
            return Err(ConfigError::invalid(format!(
                "schedule.hour must be 0..=23, got {}",
                s.hour
            )));
        }
        if !(-720..=840).contains(&s.utc_offset_minutes) {
            return Err(ConfigError::invalid(format!(
                "schedule.utc_offset_minutes must be -720..=840, got {}",
                s.utc_offset_minutes
            )));
        }
        if !(1..=3600).contains(&s.step_seconds) {
            return Err(ConfigError::invalid(format!(
                "schedule.step_seconds must be 1..=3600, got {}",
                s.step_seconds
            )));
        }
        let busiest = *crate::symbols::Glyph::Max.commit_range().end() - 1;
        if s.hour * 3600 + busiest * s.step_seconds >= 86_400 {
            return Err(ConfigError::invalid(format!(
                "schedule.hour = {} with step_seconds = {} pushes a {}-commit day past midnight",
                s.hour,
                s.step_seconds,
                busiest + 1
            )));
        }
        if self.build.batch_size == 0 {
            return Err(ConfigError::invalid(
                "build.batch_size must be at least 1".to_owned(),
            ));
        }
        if self.repo.branch.is_empty() || heatgrid_git::RefName::branch(&self.repo.branch).is_err()
        {
            return Err(ConfigError::invalid(format!(
                "repo.branch {:?} is not a valid branch name",
                self.repo.branch
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
