//! Commit graph construction.
//!
//! The chain is written straight into the object store: per plan entry one
//! blob, one tree and one commit whose parent is the previous tip. Nothing
//! touches the index or worktree while the chain is built. The branch ref is
//! advanced by compare-and-swap every `batch_size` commits and once at the
//! end, so an interrupted run leaves the branch on its last checkpoint.
//!
//! When the branch is checked out, each checkpoint also resets the index to
//! the new tip and rewrites the marker file in the worktree, so the
//! repository stays clean between batches.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use heatgrid_git::{EntryMode, GitError, GitOid, GitRepo, RefEdit, RefName, TreeEntry};
use tracing::instrument;

use crate::bootstrap::Identity;
use crate::config::BuildConfig;
use crate::error::{HeatgridError, Result};
use crate::marker::{MARKER_FILE, commit_message, marker_contents};
use crate::plan::{CommitPlan, PlanEntry};

/// Base delay between retries. Attempt `n` waits `n` times this.
const RETRY_BACKOFF: Duration = Duration::from_millis(20);

/// Result of a completed build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildOutcome {
    /// Final tip, already checkpointed to the branch.
    pub tip: GitOid,
    /// Commits written by this call.
    pub written: usize,
    /// Branch updates performed.
    pub checkpoints: usize,
}

/// Writes a [`CommitPlan`] onto one branch.
pub struct CommitGraphBuilder<'a> {
    repo: &'a dyn GitRepo,
    branch: &'a RefName,
    identity: &'a Identity,
    batch_size: usize,
    max_retries: u32,
    worktree: Option<PathBuf>,
}

impl<'a> CommitGraphBuilder<'a> {
    #[must_use]
    pub fn new(
        repo: &'a dyn GitRepo,
        branch: &'a RefName,
        identity: &'a Identity,
        build: &BuildConfig,
    ) -> Self {
        Self {
            repo,
            branch,
            identity,
            batch_size: build.batch_size.max(1),
            max_retries: build.max_retries,
            worktree: None,
        }
    }

    /// Keep the index and the worktree marker of `workdir` in step with
    /// each checkpoint. Only meaningful when HEAD points at the branch.
    #[must_use]
    pub fn syncing_worktree(mut self, workdir: PathBuf) -> Self {
        self.worktree = Some(workdir);
        self
    }

    /// Append `plan.entries()[skip..]` after `tip`, which must be the
    /// branch's current value.
    ///
    /// # Errors
    /// [`HeatgridError::ObjectStoreWrite`] when a write keeps failing or a
    /// checkpoint loses its compare-and-swap. The branch then still points at
    /// the returned `checkpoint`. [`HeatgridError::Git`] if `tip` cannot be
    /// read before anything is written.
    #[instrument(skip_all, fields(branch = %self.branch, plan = plan.id(), resume_after = skip, len = plan.len()))]
    pub fn build(
        &self,
        plan: &CommitPlan,
        seed: u64,
        tip: GitOid,
        skip: usize,
    ) -> Result<BuildOutcome> {
        let base_tree = self.base_entries(tip)?;
        let mut state = Fold {
            tip,
            checkpointed: tip,
            pending: 0,
            written: 0,
            checkpoints: 0,
            advanced: false,
        };

        for entry in plan.entries().iter().skip(skip) {
            let message = commit_message(entry, plan.id(), seed, plan.len());
            let sig = self
                .identity
                .signature(entry.timestamp, plan.offset_seconds());
            let parent = state.tip;
            let commit = self.retrying(entry, &state, || {
                let blob = self.repo.write_blob(marker_contents(entry).as_bytes())?;
                let mut entries = base_tree.clone();
                entries.push(TreeEntry {
                    name: MARKER_FILE.to_owned(),
                    mode: EntryMode::Blob,
                    oid: blob,
                });
                let tree = self.repo.write_tree(&entries)?;
                self.repo.create_commit(tree, &[parent], &message, &sig, &sig)
            })?;
            state.tip = commit;
            state.pending += 1;
            state.written += 1;

            if state.pending == self.batch_size {
                self.checkpoint(entry, plan.len(), &mut state)?;
            }
        }

        if state.pending > 0
            && let Some(last) = plan.entries().last()
        {
            self.checkpoint(last, plan.len(), &mut state)?;
        }

        tracing::info!(
            tip = %state.tip.short(12),
            written = state.written,
            checkpoints = state.checkpoints,
            "chain complete"
        );
        Ok(BuildOutcome {
            tip: state.tip,
            written: state.written,
            checkpoints: state.checkpoints,
        })
    }

    /// The tip's tree without any previous marker file. Every commit keeps
    /// these entries and adds its own marker.
    fn base_entries(&self, tip: GitOid) -> Result<Vec<TreeEntry>> {
        let commit = self.repo.read_commit(tip)?;
        let mut entries = self.repo.read_tree(commit.tree_oid)?;
        entries.retain(|e| e.name != MARKER_FILE);
        Ok(entries)
    }

    fn checkpoint(&self, entry: &PlanEntry, len: usize, state: &mut Fold) -> Result<()> {
        let edit = RefEdit {
            name: self.branch.clone(),
            new_oid: state.tip,
            expected_old_oid: state.checkpointed,
        };
        let log = format!("heatgrid: checkpoint {}/{len}", entry.position + 1);
        self.retrying(entry, state, || {
            self.repo.atomic_ref_update(std::slice::from_ref(&edit), &log)
        })?;
        tracing::info!(
            at = entry.position + 1,
            of = len,
            tip = %state.tip.short(12),
            "checkpoint"
        );
        state.checkpointed = state.tip;
        state.pending = 0;
        state.checkpoints += 1;
        state.advanced = true;
        self.sync_worktree(entry, state.tip)
    }

    fn sync_worktree(&self, entry: &PlanEntry, tip: GitOid) -> Result<()> {
        let Some(workdir) = &self.worktree else {
            return Ok(());
        };
        let tree = self.repo.read_commit(tip)?.tree_oid;
        self.repo.reset_index(tree)?;
        let path = workdir.join(MARKER_FILE);
        std::fs::write(&path, marker_contents(entry))
            .map_err(|source| HeatgridError::WorktreeSync { path, source })?;
        tracing::debug!(tip = %tip.short(12), "worktree synced");
        Ok(())
    }

    /// Run `op`, retrying transient failures up to `max_retries` times.
    fn retrying<T>(
        &self,
        entry: &PlanEntry,
        state: &Fold,
        mut op: impl FnMut() -> std::result::Result<T, GitError>,
    ) -> Result<T> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempts <= self.max_retries => {
                    tracing::warn!(
                        position = entry.position,
                        attempt = attempts,
                        error = %e,
                        "transient store failure, retrying"
                    );
                    thread::sleep(RETRY_BACKOFF * attempts);
                }
                Err(source) => {
                    return Err(HeatgridError::ObjectStoreWrite {
                        position: entry.position,
                        date: entry.date,
                        ordinal: entry.ordinal,
                        attempts,
                        checkpoint: state.advanced.then_some(state.checkpointed),
                        source,
                    });
                }
            }
        }
    }
}

struct Fold {
    tip: GitOid,
    checkpointed: GitOid,
    pending: usize,
    written: usize,
    checkpoints: usize,
    /// Whether this run has moved the branch yet.
    advanced: bool,
}

#[cfg(test)]
mod tests {
    use heatgrid_git::GixRepo;

    use super::*;
    use crate::calendar::{DateMapper, WeekAlignment};
    use crate::grid::Grid;
    use crate::plan::Schedule;
    use crate::sampler::CountSampler;
    use crate::symbols::Glyph;

    struct Fixture {
        _dir: tempfile::TempDir,
        repo: GixRepo,
        branch: RefName,
        identity: Identity,
        root: GitOid,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = GixRepo::init(dir.path()).unwrap();
        let branch = RefName::branch("main").unwrap();
        let identity = Identity {
            name: "Test".into(),
            email: "test@example.com".into(),
        };
        repo.set_reflog_identity(&identity.name, &identity.email).unwrap();
        let tree = repo.write_tree(&[]).unwrap();
        let sig = identity.signature(0, 0);
        let root = repo.create_commit(tree, &[], "root\n", &sig, &sig).unwrap();
        repo.write_ref(&branch, root, "root").unwrap();
        Fixture {
            _dir: dir,
            repo,
            branch,
            identity,
            root,
        }
    }

    fn plan_with(cells: &[(usize, usize, Glyph)], seed: u64) -> CommitPlan {
        let mut grid = Grid::filled(Glyph::Zero);
        for &(w, d, g) in cells {
            grid.set(w, d, g).unwrap();
        }
        let dates = DateMapper::new(2022, WeekAlignment::default()).unwrap();
        let dated = CountSampler::seeded(seed).date_cells(&grid, &dates);
        CommitPlan::build(2022, &dated, &Schedule::default()).unwrap()
    }

    fn chain(repo: &GixRepo, tip: GitOid, stop: GitOid) -> Vec<GitOid> {
        let mut out = Vec::new();
        let mut cur = tip;
        while cur != stop {
            out.push(cur);
            cur = repo.read_commit(cur).unwrap().parent().unwrap();
        }
        out.reverse();
        out
    }

    #[test]
    fn writes_one_commit_per_entry_and_checkpoints_in_batches() {
        let f = fixture();
        let plan = plan_with(&[(2, 1, Glyph::Mid), (2, 2, Glyph::Low)], 9);
        let cfg = BuildConfig {
            batch_size: 4,
            max_retries: 0,
        };
        let outcome = CommitGraphBuilder::new(&f.repo, &f.branch, &f.identity, &cfg)
            .build(&plan, 9, f.root, 0)
            .unwrap();
        assert_eq!(outcome.written, plan.len());
        assert_eq!(outcome.checkpoints, plan.len().div_ceil(4));
        assert_eq!(f.repo.read_ref(&f.branch).unwrap(), Some(outcome.tip));

        let commits = chain(&f.repo, outcome.tip, f.root);
        assert_eq!(commits.len(), plan.len());
        for (oid, entry) in commits.iter().zip(plan.entries()) {
            let info = f.repo.read_commit(*oid).unwrap();
            assert_eq!(info.author.seconds, entry.timestamp);
            assert_eq!(info.committer.seconds, entry.timestamp);
            assert!(info.message.starts_with(&format!("heatgrid: {} #{}", entry.date, entry.ordinal)));
            let tree = f.repo.read_tree(info.tree_oid).unwrap();
            assert_eq!(tree.len(), 1);
            assert_eq!(tree[0].name, MARKER_FILE);
            let blob = f.repo.read_blob(tree[0].oid).unwrap();
            assert_eq!(blob, marker_contents(entry).into_bytes());
        }
    }

    #[test]
    fn existing_files_are_carried_forward() {
        let f = fixture();
        let readme = f.repo.write_blob(b"hello\n").unwrap();
        let tree = f
            .repo
            .write_tree(&[TreeEntry {
                name: "README.md".into(),
                mode: EntryMode::Blob,
                oid: readme,
            }])
            .unwrap();
        let sig = f.identity.signature(1, 0);
        let tip = f
            .repo
            .create_commit(tree, &[f.root], "readme\n", &sig, &sig)
            .unwrap();
        f.repo.write_ref(&f.branch, tip, "readme").unwrap();

        let plan = plan_with(&[(0, 6, Glyph::Low)], 3);
        let outcome = CommitGraphBuilder::new(&f.repo, &f.branch, &f.identity, &BuildConfig::default())
            .build(&plan, 3, tip, 0)
            .unwrap();
        let info = f.repo.read_commit(outcome.tip).unwrap();
        let names: Vec<_> = f
            .repo
            .read_tree(info.tree_oid)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["README.md".to_owned(), MARKER_FILE.to_owned()]);
    }

    #[test]
    fn skip_resumes_mid_plan() {
        let f = fixture();
        let plan = plan_with(&[(5, 5, Glyph::Mid)], 1);
        let builder = CommitGraphBuilder::new(&f.repo, &f.branch, &f.identity, &BuildConfig::default());
        let outcome = builder.build(&plan, 1, f.root, plan.len() - 2).unwrap();
        assert_eq!(outcome.written, 2);
        let info = f.repo.read_commit(outcome.tip).unwrap();
        assert!(info.message.contains(&format!("Heatgrid-Entry: {}/{}", plan.len(), plan.len())));
    }

    #[test]
    fn stale_tip_fails_the_checkpoint() {
        let f = fixture();
        let plan = plan_with(&[(1, 1, Glyph::Low)], 5);
        let sig = f.identity.signature(2, 0);
        let tree = f.repo.write_tree(&[]).unwrap();
        let moved = f
            .repo
            .create_commit(tree, &[f.root], "moved\n", &sig, &sig)
            .unwrap();
        f.repo.write_ref(&f.branch, moved, "moved").unwrap();

        let err = CommitGraphBuilder::new(&f.repo, &f.branch, &f.identity, &BuildConfig::default())
            .build(&plan, 5, f.root, 0)
            .unwrap_err();
        assert!(matches!(
            err,
            HeatgridError::ObjectStoreWrite {
                checkpoint: None,
                source: GitError::RefConflict { .. },
                ..
            }
        ));
        assert_eq!(f.repo.read_ref(&f.branch).unwrap(), Some(moved));
    }

    #[test]
    fn synced_checkpoints_leave_a_clean_worktree() {
        let f = fixture();
        f.repo.set_head(&f.branch).unwrap();
        f.repo.reset_index(f.repo.read_commit(f.root).unwrap().tree_oid).unwrap();
        let workdir = f.repo.workdir().unwrap().to_path_buf();
        let plan = plan_with(&[(3, 0, Glyph::High)], 11);
        let cfg = BuildConfig {
            batch_size: 7,
            max_retries: 0,
        };
        let outcome = CommitGraphBuilder::new(&f.repo, &f.branch, &f.identity, &cfg)
            .syncing_worktree(workdir.clone())
            .build(&plan, 11, f.root, 0)
            .unwrap();
        assert!(!f.repo.is_dirty().unwrap());
        let last = plan.entries().last().unwrap();
        assert_eq!(
            std::fs::read_to_string(workdir.join(MARKER_FILE)).unwrap(),
            marker_contents(last)
        );
        assert_eq!(f.repo.read_ref(&f.branch).unwrap(), Some(outcome.tip));
    }

    #[test]
    fn empty_plan_writes_nothing() {
        let f = fixture();
        let plan = plan_with(&[], 0);
        let outcome = CommitGraphBuilder::new(&f.repo, &f.branch, &f.identity, &BuildConfig::default())
            .build(&plan, 0, f.root, 0)
            .unwrap();
        assert_eq!(outcome.written, 0);
        assert_eq!(outcome.checkpoints, 0);
        assert_eq!(outcome.tip, f.root);
    }
}
