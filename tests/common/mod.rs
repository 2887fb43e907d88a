//! Shared helpers for heatgrid integration tests.
//!
//! Every test works in its own temp directory. Failure injection goes
//! through [`FlakyRepo`], a [`GitRepo`] that wraps a real [`GixRepo`].

#![allow(dead_code)]

use std::cell::Cell;
use std::io;
use std::path::Path;

use heatgrid::config::HeatgridConfig;
use heatgrid::marker::{MARKER_FILE, RunMarker};
use heatgrid::{Glyph, Grid, RunRequest};
use heatgrid_git::{
    CommitInfo, GitError, GitOid, GitRepo, GixRepo, RefEdit, RefName, Signature, TreeEntry,
};

pub fn main_branch() -> RefName {
    RefName::branch("main").unwrap()
}

/// A request for `year` 2022 with default config and a fixed seed.
pub fn request(repo: &Path, grid: Grid, seed: Option<u64>) -> RunRequest {
    RunRequest {
        year: 2022,
        grid,
        repo_path: repo.to_path_buf(),
        seed,
        config: HeatgridConfig::default(),
        dry_run: false,
    }
}

/// All-zero grid with the given cells set.
pub fn grid_with(cells: &[(usize, usize, Glyph)]) -> Grid {
    let mut grid = Grid::filled(Glyph::Zero);
    for &(week, day, glyph) in cells {
        grid.set(week, day, glyph).unwrap();
    }
    grid
}

/// The demo pattern on the first `weeks` columns only, to keep chains short.
pub fn partial_demo(weeks: usize) -> Grid {
    let mut grid = Grid::filled(Glyph::Zero);
    let demo = Grid::demo();
    for cell in demo.cells().filter(|c| c.week < weeks) {
        grid.set(cell.week, cell.day, cell.glyph).unwrap();
    }
    grid
}

/// One synthetic commit, reduced to what must be reproducible across runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainLink {
    pub message: String,
    pub author_seconds: i64,
    pub committer_seconds: i64,
    pub marker: Vec<u8>,
}

/// Commits from `tip` back to the root, oldest first, skipping commits that
/// carry no run marker (the bootstrap root).
pub fn chain(repo: &dyn GitRepo, tip: GitOid) -> Vec<(GitOid, CommitInfo)> {
    let mut out = Vec::new();
    let mut cur = Some(tip);
    while let Some(oid) = cur {
        let info = repo.read_commit(oid).unwrap();
        cur = info.parent();
        if RunMarker::parse(&info.message).is_some() {
            out.push((oid, info));
        }
    }
    out.reverse();
    out
}

pub fn links(repo: &dyn GitRepo, tip: GitOid) -> Vec<ChainLink> {
    chain(repo, tip)
        .into_iter()
        .map(|(_, info)| {
            let tree = repo.read_tree(info.tree_oid).unwrap();
            let marker = tree
                .iter()
                .find(|e| e.name == MARKER_FILE)
                .map(|e| repo.read_blob(e.oid).unwrap())
                .unwrap_or_default();
            ChainLink {
                message: info.message,
                author_seconds: info.author.seconds,
                committer_seconds: info.committer.seconds,
                marker,
            }
        })
        .collect()
}

pub fn tip_of(path: &Path) -> GitOid {
    GixRepo::open(path)
        .unwrap()
        .read_ref(&main_branch())
        .unwrap()
        .unwrap()
}

// ---------------------------------------------------------------------------
// FlakyRepo
// ---------------------------------------------------------------------------

/// Delegates to a real repository, failing `create_commit` on demand.
pub struct FlakyRepo {
    pub inner: GixRepo,
    /// Fail permanently once this many commits have been created.
    pub fail_after: Option<usize>,
    /// Number of upcoming `create_commit` calls that fail transiently.
    pub transient: Cell<u32>,
    pub commits: Cell<usize>,
}

impl FlakyRepo {
    pub fn new(inner: GixRepo) -> Self {
        Self {
            inner,
            fail_after: None,
            transient: Cell::new(0),
            commits: Cell::new(0),
        }
    }

    pub fn failing_after(mut self, commits: usize) -> Self {
        self.fail_after = Some(commits);
        self
    }

    pub fn with_transient_failures(self, n: u32) -> Self {
        self.transient.set(n);
        self
    }
}

impl GitRepo for FlakyRepo {
    fn read_ref(&self, name: &RefName) -> Result<Option<GitOid>, GitError> {
        self.inner.read_ref(name)
    }

    fn write_ref(&self, name: &RefName, oid: GitOid, log_message: &str) -> Result<(), GitError> {
        self.inner.write_ref(name, oid, log_message)
    }

    fn atomic_ref_update(&self, edits: &[RefEdit], log_message: &str) -> Result<(), GitError> {
        self.inner.atomic_ref_update(edits, log_message)
    }

    fn head_target(&self) -> Result<Option<RefName>, GitError> {
        self.inner.head_target()
    }

    fn set_head(&self, target: &RefName) -> Result<(), GitError> {
        self.inner.set_head(target)
    }

    fn read_blob(&self, oid: GitOid) -> Result<Vec<u8>, GitError> {
        self.inner.read_blob(oid)
    }

    fn read_tree(&self, oid: GitOid) -> Result<Vec<TreeEntry>, GitError> {
        self.inner.read_tree(oid)
    }

    fn read_commit(&self, oid: GitOid) -> Result<CommitInfo, GitError> {
        self.inner.read_commit(oid)
    }

    fn write_blob(&self, data: &[u8]) -> Result<GitOid, GitError> {
        self.inner.write_blob(data)
    }

    fn write_tree(&self, entries: &[TreeEntry]) -> Result<GitOid, GitError> {
        self.inner.write_tree(entries)
    }

    fn create_commit(
        &self,
        tree: GitOid,
        parents: &[GitOid],
        message: &str,
        author: &Signature,
        committer: &Signature,
    ) -> Result<GitOid, GitError> {
        if self.transient.get() > 0 {
            self.transient.set(self.transient.get() - 1);
            return Err(GitError::IoError(io::Error::from(io::ErrorKind::Interrupted)));
        }
        if self.fail_after.is_some_and(|limit| self.commits.get() >= limit) {
            return Err(GitError::BackendError {
                message: "injected: object database unavailable".to_owned(),
            });
        }
        let oid = self
            .inner
            .create_commit(tree, parents, message, author, committer)?;
        self.commits.set(self.commits.get() + 1);
        Ok(oid)
    }

    fn workdir(&self) -> Option<&Path> {
        self.inner.workdir()
    }

    fn is_dirty(&self) -> Result<bool, GitError> {
        self.inner.is_dirty()
    }

    fn reset_index(&self, tree: GitOid) -> Result<(), GitError> {
        self.inner.reset_index(tree)
    }

    fn configured_identity(&self) -> Result<Option<(String, String)>, GitError> {
        self.inner.configured_identity()
    }

    fn is_ancestor(&self, ancestor: GitOid, descendant: GitOid) -> Result<bool, GitError> {
        self.inner.is_ancestor(ancestor, descendant)
    }
}
