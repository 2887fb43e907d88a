use anyhow::{Context, Result};
use clap::ValueEnum;

use crate::pipeline::RunSummary;

/// Output format for the run summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text, one `key: value` per line
    #[default]
    Text,
    /// JSON - machine-parseable
    Json,
}

impl OutputFormat {
    /// Render a run summary.
    pub fn render_summary(self, summary: &RunSummary) -> Result<String> {
        match self {
            Self::Json => {
                serde_json::to_string_pretty(summary).context("JSON serialization failed")
            }
            Self::Text => Ok(summary_text(summary)),
        }
    }
}

fn summary_text(s: &RunSummary) -> String {
    let verb = if s.dry_run { "would write" } else { "wrote" };
    let count = if s.dry_run {
        s.planned - s.resumed_from.unwrap_or(0)
    } else {
        s.written
    };
    let mut out = format!(
        "heatgrid {}: {verb} {count} commit(s) on {}\n  seed:    {}\n  plan:    {} ({} entries)\n",
        s.year, s.branch, s.seed, s.plan_id, s.planned
    );
    if let Some(pos) = s.resumed_from {
        out.push_str(&format!("  resumed: after entry {pos}\n"));
    }
    if let Some(tip) = &s.tip {
        out.push_str(&format!("  tip:     {tip}\n"));
    }
    if s.initialized {
        out.push_str("  repository initialised\n");
    }
    out
}
