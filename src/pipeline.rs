//! One end-to-end run: validate, bootstrap, plan, build.

use std::path::PathBuf;

use heatgrid_git::{GitOid, GitRepo, RefName};
use serde::Serialize;
use tracing::instrument;

use crate::bootstrap::{self, BranchTip, Identity};
use crate::builder::CommitGraphBuilder;
use crate::calendar::DateMapper;
use crate::config::{ConfigError, HeatgridConfig};
use crate::error::Result;
use crate::grid::Grid;
use crate::marker::RunMarker;
use crate::plan::{CommitPlan, Schedule};
use crate::sampler::CountSampler;

/// Everything a run needs.
#[derive(Clone, Debug)]
pub struct RunRequest {
    pub year: i32,
    pub grid: Grid,
    pub repo_path: PathBuf,
    /// Fixed seed. Without one, an unfinished run's recorded seed is reused
    /// and otherwise a fresh seed is drawn.
    pub seed: Option<u64>,
    pub config: HeatgridConfig,
    /// Plan only. Nothing is created or written.
    pub dry_run: bool,
}

/// What a run did (or, for a dry run, would do).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub year: i32,
    pub seed: u64,
    pub plan_id: String,
    pub branch: String,
    /// Entries in the plan.
    pub planned: usize,
    /// Commits written by this run.
    pub written: usize,
    /// Plan position this run continued from, when resuming.
    pub resumed_from: Option<usize>,
    pub tip: Option<String>,
    pub initialized: bool,
    pub dry_run: bool,
}

/// The plan chosen for a run and where in it to start.
#[derive(Clone, Debug)]
pub struct ResolvedPlan {
    pub seed: u64,
    pub plan: CommitPlan,
    /// Entries already on the branch from an earlier, interrupted run.
    pub skip: usize,
}

/// Year, config and branch checks that must pass before anything is
/// created on disk.
///
/// # Errors
/// [`HeatgridError::InvalidYear`](crate::HeatgridError::InvalidYear) or
/// [`HeatgridError::Config`](crate::HeatgridError::Config).
pub fn validate(req: &RunRequest) -> Result<(DateMapper, RefName)> {
    let dates = DateMapper::new(req.year, req.config.schedule.alignment)?;
    req.config.validate()?;
    let branch = RefName::branch(&req.config.repo.branch).map_err(|e| ConfigError {
        path: None,
        message: e.to_string(),
    })?;
    Ok((dates, branch))
}

/// Run against the repository at `req.repo_path`, creating it if needed.
///
/// # Errors
/// Validation errors before any write, `RepositoryState` before any object
/// is written, `ObjectStoreWrite` if the chain cannot be completed.
#[instrument(skip_all, fields(year = req.year, repo = %req.repo_path.display(), dry_run = req.dry_run))]
pub fn run(req: &RunRequest) -> Result<RunSummary> {
    let (dates, branch) = validate(req)?;

    if req.dry_run {
        return dry_run(req, &dates, &branch);
    }

    let (repo, identity, tip) = bootstrap::bootstrap(&req.repo_path, &branch, &req.config.identity)?;
    run_on(&repo, &identity, &tip, req)
}

/// Plan and build on an already bootstrapped branch.
///
/// # Errors
/// As [`run`], minus bootstrap failures.
pub fn run_on(
    repo: &dyn GitRepo,
    identity: &Identity,
    tip: &BranchTip,
    req: &RunRequest,
) -> Result<RunSummary> {
    let (dates, branch) = validate(req)?;
    let marker = tip_marker(repo, tip.tip)?;
    let resolved = resolve_plan(req, &dates, marker.as_ref())?;

    let mut builder = CommitGraphBuilder::new(repo, &branch, identity, &req.config.build);
    if let Some(workdir) = repo.workdir()
        && repo.head_target()?.as_ref() == Some(&branch)
    {
        builder = builder.syncing_worktree(workdir.to_path_buf());
    }
    let outcome = builder.build(&resolved.plan, resolved.seed, tip.tip, resolved.skip)?;

    tracing::info!(
        written = outcome.written,
        planned = resolved.plan.len(),
        tip = %outcome.tip.short(12),
        "run complete"
    );
    Ok(RunSummary {
        year: req.year,
        seed: resolved.seed,
        plan_id: resolved.plan.id().to_owned(),
        branch: branch.as_str().to_owned(),
        planned: resolved.plan.len(),
        written: outcome.written,
        resumed_from: (resolved.skip > 0).then_some(resolved.skip),
        tip: Some(outcome.tip.to_string()),
        initialized: tip.initialized,
        dry_run: false,
    })
}

fn dry_run(req: &RunRequest, dates: &DateMapper, branch: &RefName) -> Result<RunSummary> {
    let (marker, tip) = match bootstrap::peek_tip(&req.repo_path, branch)? {
        Some((repo, Some(tip))) => (tip_marker(&repo, tip)?, Some(tip)),
        _ => (None, None),
    };
    let resolved = resolve_plan(req, dates, marker.as_ref())?;
    Ok(RunSummary {
        year: req.year,
        seed: resolved.seed,
        plan_id: resolved.plan.id().to_owned(),
        branch: branch.as_str().to_owned(),
        planned: resolved.plan.len(),
        written: 0,
        resumed_from: (resolved.skip > 0).then_some(resolved.skip),
        tip: tip.map(|t| t.to_string()),
        initialized: false,
        dry_run: true,
    })
}

fn tip_marker(repo: &dyn GitRepo, tip: GitOid) -> Result<Option<RunMarker>> {
    let commit = repo.read_commit(tip)?;
    Ok(RunMarker::parse(&commit.message))
}

/// Sample and plan one run.
///
/// # Errors
/// [`HeatgridError::UnorderedPlan`](crate::HeatgridError::UnorderedPlan).
pub fn make_plan(req: &RunRequest, dates: &DateMapper, seed: u64) -> Result<CommitPlan> {
    tracing::debug!(glyphs = ?req.grid.histogram(), "grid loaded");
    let cells = CountSampler::seeded(seed).date_cells(&req.grid, dates);
    CommitPlan::build(req.year, &cells, &Schedule::from_config(&req.config.schedule))
}

/// Pick the seed and plan, resuming when the tip was left by an unfinished
/// run of the same plan.
///
/// # Errors
/// As [`make_plan`].
pub fn resolve_plan(
    req: &RunRequest,
    dates: &DateMapper,
    marker: Option<&RunMarker>,
) -> Result<ResolvedPlan> {
    if let Some(marker) = marker.filter(|m| !m.is_finished()) {
        let seed = req.seed.unwrap_or(marker.seed);
        let plan = make_plan(req, dates, seed)?;
        if plan.id() == marker.plan_id && plan.len() == marker.len {
            tracing::info!(
                seed,
                plan = plan.id(),
                at = marker.position,
                of = marker.len,
                "resuming unfinished run"
            );
            return Ok(ResolvedPlan {
                seed,
                plan,
                skip: marker.position,
            });
        }
        tracing::warn!(
            recorded = %marker.plan_id,
            current = plan.id(),
            "tip belongs to an unfinished run of a different plan; appending"
        );
        return Ok(ResolvedPlan { seed, plan, skip: 0 });
    }

    let seed = req.seed.unwrap_or_else(rand::random::<u64>);
    tracing::info!(seed, "sampling commit counts");
    let plan = make_plan(req, dates, seed)?;
    Ok(ResolvedPlan { seed, plan, skip: 0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::WeekAlignment;
    use crate::symbols::Glyph;

    fn request(seed: Option<u64>) -> RunRequest {
        RunRequest {
            year: 2022,
            grid: Grid::demo(),
            repo_path: PathBuf::from("/nonexistent/heatgrid-test"),
            seed,
            config: HeatgridConfig::default(),
            dry_run: true,
        }
    }

    fn dates() -> DateMapper {
        DateMapper::new(2022, WeekAlignment::default()).unwrap()
    }

    #[test]
    fn fresh_tip_starts_from_zero_with_given_seed() {
        let r = resolve_plan(&request(Some(7)), &dates(), None).unwrap();
        assert_eq!(r.seed, 7);
        assert_eq!(r.skip, 0);
    }

    #[test]
    fn unfinished_marker_resumes_with_recorded_seed() {
        let req = request(None);
        let plan = make_plan(&req, &dates(), 99).unwrap();
        let marker = RunMarker {
            plan_id: plan.id().to_owned(),
            seed: 99,
            position: 10,
            len: plan.len(),
        };
        let r = resolve_plan(&req, &dates(), Some(&marker)).unwrap();
        assert_eq!(r.seed, 99);
        assert_eq!(r.skip, 10);
        assert_eq!(r.plan, plan);
    }

    #[test]
    fn finished_marker_appends() {
        let req = request(Some(99));
        let plan = make_plan(&req, &dates(), 99).unwrap();
        let marker = RunMarker {
            plan_id: plan.id().to_owned(),
            seed: 99,
            position: plan.len(),
            len: plan.len(),
        };
        let r = resolve_plan(&req, &dates(), Some(&marker)).unwrap();
        assert_eq!(r.skip, 0);
    }

    #[test]
    fn different_plan_appends() {
        let mut req = request(Some(1));
        req.grid = Grid::filled(Glyph::Max);
        let marker = RunMarker {
            plan_id: "0000000000000000".into(),
            seed: 1,
            position: 3,
            len: 9,
        };
        let r = resolve_plan(&req, &dates(), Some(&marker)).unwrap();
        assert_eq!(r.skip, 0);
        assert_eq!(r.seed, 1);
    }

    #[test]
    fn invalid_year_fails_validation() {
        let mut req = request(Some(1));
        req.year = 1900;
        assert!(matches!(
            run(&req),
            Err(crate::HeatgridError::InvalidYear { year: 1900, .. })
        ));
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request(Some(5));
        req.repo_path = dir.path().join("repo");
        let summary = run(&req).unwrap();
        assert!(summary.dry_run);
        assert_eq!(summary.written, 0);
        assert!(summary.planned > 0);
        assert_eq!(summary.tip, None);
        assert!(!req.repo_path.exists());
    }

    #[test]
    fn dry_run_rejects_a_non_repository_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "keep me").unwrap();
        let mut req = request(Some(5));
        req.repo_path = dir.path().to_path_buf();

        let err = run(&req).unwrap_err();
        assert!(matches!(err, crate::HeatgridError::RepositoryState { .. }), "{err}");
        assert!(!dir.path().join(".git").exists());
    }
}
