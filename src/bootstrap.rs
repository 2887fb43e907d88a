//! Repository bootstrap: make sure a repository and a branch tip exist
//! before anything is planned.
//!
//! | target path                       | outcome                                   |
//! |-----------------------------------|-------------------------------------------|
//! | missing, or an empty directory    | init, empty root commit, branch created   |
//! | existing repo, branch exists      | opened, tip read, nothing modified        |
//! | existing repo, branch unborn      | empty root commit, branch created         |
//! | existing repo with dirty worktree | `RepositoryState`                         |
//! | untracked marker file on branch   | `RepositoryState`                         |
//! | file, or non-empty non-repo dir   | `RepositoryState`                         |

use std::path::Path;

use chrono::Utc;
use heatgrid_git::{GitOid, GitRepo, GixRepo, RefEdit, RefName, Signature};
use tracing::instrument;

use crate::config::IdentityConfig;
use crate::error::{HeatgridError, Result};
use crate::marker::MARKER_FILE;

const FALLBACK_NAME: &str = "heatgrid";
const FALLBACK_EMAIL: &str = "heatgrid@localhost";
const INITIAL_MESSAGE: &str = "heatgrid: initialize repository\n";

/// Author and committer used for every commit of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    /// Config values first, then the repository's own identity, then a
    /// fixed placeholder. Name and email fall back independently.
    ///
    /// # Errors
    /// Propagates failures reading repository configuration.
    pub fn resolve(cfg: &IdentityConfig, repo: &dyn GitRepo) -> Result<Self> {
        let configured = if cfg.name.is_some() && cfg.email.is_some() {
            None
        } else {
            repo.configured_identity()?
        };
        let (repo_name, repo_email) = configured.unzip();
        Ok(Self {
            name: cfg
                .name
                .clone()
                .or(repo_name)
                .unwrap_or_else(|| FALLBACK_NAME.to_owned()),
            email: cfg
                .email
                .clone()
                .or(repo_email)
                .unwrap_or_else(|| FALLBACK_EMAIL.to_owned()),
        })
    }

    #[must_use]
    pub fn signature(&self, seconds: i64, offset_seconds: i32) -> Signature {
        Signature::new(&self.name, &self.email, seconds, offset_seconds)
    }
}

/// The branch a run writes to and where it currently points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BranchTip {
    pub branch: RefName,
    pub tip: GitOid,
    /// Whether bootstrap had to create the root commit.
    pub initialized: bool,
}

/// Open or create the repository at `path` and make sure `branch` has a tip.
///
/// # Errors
/// [`HeatgridError::RepositoryState`] when `path` is unusable or has
/// uncommitted changes. Store failures while creating the root commit come
/// back as [`HeatgridError::Git`].
#[instrument(skip_all, fields(path = %path.display(), branch = %branch))]
pub fn bootstrap(
    path: &Path,
    branch: &RefName,
    identity: &IdentityConfig,
) -> Result<(GixRepo, Identity, BranchTip)> {
    let mut repo = open_or_init(path)?;
    let identity = Identity::resolve(identity, &repo)?;
    repo.set_reflog_identity(&identity.name, &identity.email)?;
    let tip = ensure_branch(&repo, path, branch, &identity)?;
    Ok((repo, identity, tip))
}

/// What lives at a bootstrap target path.
enum Found {
    /// Missing, or an empty directory: safe to initialise.
    Nothing,
    Repository(GixRepo),
}

fn repository_state(path: &Path, reason: String) -> HeatgridError {
    HeatgridError::RepositoryState {
        path: path.to_owned(),
        reason,
    }
}

fn locate(path: &Path) -> Result<Found> {
    if !path.exists() {
        return Ok(Found::Nothing);
    }
    if !path.is_dir() {
        return Err(repository_state(path, "exists and is not a directory".to_owned()));
    }
    let mut listing =
        std::fs::read_dir(path).map_err(|e| repository_state(path, format!("unreadable: {e}")))?;
    if listing.next().is_none() {
        return Ok(Found::Nothing);
    }
    GixRepo::open(path)
        .map(Found::Repository)
        .map_err(|e| repository_state(path, format!("exists but is not a git repository ({e})")))
}

/// Open the repository at `path`, initialising one when the path is missing
/// or an empty directory.
///
/// # Errors
/// [`HeatgridError::RepositoryState`] for files, non-empty directories that
/// are not repositories, and paths that cannot be inspected.
pub fn open_or_init(path: &Path) -> Result<GixRepo> {
    match locate(path)? {
        Found::Repository(repo) => Ok(repo),
        Found::Nothing => {
            tracing::info!(path = %path.display(), "creating repository");
            GixRepo::init(path)
                .map_err(|e| repository_state(path, format!("could not initialise: {e}")))
        }
    }
}

/// Refuse states a run would clobber: uncommitted changes, and (when HEAD
/// is on `branch`) an untracked marker file the builder would overwrite.
fn check_worktree(
    repo: &dyn GitRepo,
    path: &Path,
    branch: &RefName,
    tip: Option<GitOid>,
) -> Result<()> {
    let Some(workdir) = repo.workdir() else {
        return Ok(());
    };
    if repo.is_dirty()? {
        return Err(repository_state(
            path,
            "working tree has uncommitted changes; commit or stash them first".to_owned(),
        ));
    }

    // An unborn HEAD is moved onto a branch that bootstrap creates.
    let head_on_branch = match repo.head_target()? {
        Some(target) => {
            &target == branch || (tip.is_none() && repo.read_ref(&target)?.is_none())
        }
        None => false,
    };
    if !head_on_branch || std::fs::symlink_metadata(workdir.join(MARKER_FILE)).is_err() {
        return Ok(());
    }
    let tracked = match tip {
        Some(tip) => {
            let commit = repo.read_commit(tip)?;
            repo.read_tree(commit.tree_oid)?
                .iter()
                .any(|e| e.name == MARKER_FILE)
        }
        None => false,
    };
    if tracked {
        Ok(())
    } else {
        Err(repository_state(
            path,
            format!("untracked {MARKER_FILE} in the working tree would be overwritten; move it aside first"),
        ))
    }
}

/// Refuse dirty worktrees, then return the branch tip, creating an empty
/// root commit if the branch is unborn.
///
/// # Errors
/// [`HeatgridError::RepositoryState`] for a dirty worktree or a branch that
/// changed underneath us; [`HeatgridError::Git`] for store failures.
pub fn ensure_branch(
    repo: &dyn GitRepo,
    path: &Path,
    branch: &RefName,
    identity: &Identity,
) -> Result<BranchTip> {
    let existing = repo.read_ref(branch)?;
    check_worktree(repo, path, branch, existing)?;

    if let Some(tip) = existing {
        tracing::debug!(tip = %tip.short(12), "branch exists");
        return Ok(BranchTip {
            branch: branch.clone(),
            tip,
            initialized: false,
        });
    }

    // An unborn HEAD follows the new branch; a HEAD on another, existing
    // branch is left where it is.
    let head_unborn = match repo.head_target()? {
        Some(target) => repo.read_ref(&target)?.is_none(),
        None => false,
    };
    if head_unborn {
        repo.set_head(branch)?;
    }

    let tree = repo.write_tree(&[])?;
    let sig = identity.signature(Utc::now().timestamp(), 0);
    let root = repo.create_commit(tree, &[], INITIAL_MESSAGE, &sig, &sig)?;
    let edit = RefEdit {
        name: branch.clone(),
        new_oid: root,
        expected_old_oid: GitOid::ZERO,
    };
    repo.atomic_ref_update(&[edit], "heatgrid: initialize")
        .map_err(|e| repository_state(path, format!("could not create {branch}: {e}")))?;
    tracing::info!(branch = %branch, root = %root.short(12), "created root commit");
    Ok(BranchTip {
        branch: branch.clone(),
        tip: root,
        initialized: true,
    })
}

/// Read-only look at the target, for dry runs. Applies the same checks as
/// [`bootstrap`] but creates nothing. `None` when bootstrap would initialise
/// a new repository.
///
/// # Errors
/// [`HeatgridError::RepositoryState`] wherever [`bootstrap`] would fail with
/// it; store failures while reading the branch.
pub fn peek_tip(path: &Path, branch: &RefName) -> Result<Option<(GixRepo, Option<GitOid>)>> {
    let Found::Repository(repo) = locate(path)? else {
        return Ok(None);
    };
    let tip = repo.read_ref(branch)?;
    check_worktree(&repo, path, branch, tip)?;
    Ok(Some((repo, tip)))
}
