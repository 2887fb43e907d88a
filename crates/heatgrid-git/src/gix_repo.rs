//! The gix-backed implementation of [`GitRepo`].

use std::fmt;
use std::path::{Path, PathBuf};

use gix::config::tree::Committer;

use crate::error::GitError;
use crate::repo::GitRepo;
use crate::types::*;

/// A [`GitRepo`] backed by [gix](https://github.com/GitoxideLabs/gitoxide).
///
/// Construct with [`GixRepo::open`] or [`GixRepo::init`].
pub struct GixRepo {
    pub(crate) repo: gix::Repository,
    pub(crate) workdir: Option<PathBuf>,
}

impl GixRepo {
    /// Open the repository whose worktree (or git dir) is exactly `path`.
    ///
    /// User and system configuration are honoured so the committer identity
    /// matches what plain `git commit` would use.
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = gix::open(path).map_err(|e| GitError::backend("open", e))?;
        Ok(Self::wrap(repo))
    }

    /// Initialise a non-bare repository at `path` (created if missing).
    ///
    /// HEAD is left unborn; callers choose the branch with
    /// [`GitRepo::set_head`].
    pub fn init(path: &Path) -> Result<Self, GitError> {
        gix::init(path).map_err(|e| GitError::backend("init", e))?;
        tracing::debug!(path = %path.display(), "initialised repository");
        Self::open(path)
    }

    /// Record `name <email>` as the committer of reflog entries written
    /// through this handle.
    ///
    /// Ref updates need a committer for the reflog; without one configured
    /// in git (or in `GIT_COMMITTER_*`), every ref edit fails. The override
    /// lives in memory only and is never written to `.git/config`.
    pub fn set_reflog_identity(&mut self, name: &str, email: &str) -> Result<(), GitError> {
        let mut config = self.repo.config_snapshot_mut();
        config
            .set_value(&Committer::NAME, name)
            .map_err(|e| GitError::backend("set committer.name", e))?;
        config
            .set_value(&Committer::EMAIL, email)
            .map_err(|e| GitError::backend("set committer.email", e))?;
        config
            .commit()
            .map_err(|e| GitError::backend("apply committer identity", e))?;
        Ok(())
    }

    fn wrap(repo: gix::Repository) -> Self {
        let workdir = repo.workdir().map(Path::to_path_buf);
        Self { repo, workdir }
    }
}

impl fmt::Debug for GixRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GixRepo")
            .field("git_dir", &self.repo.git_dir())
            .field("workdir", &self.workdir)
            .finish()
    }
}

pub(crate) fn to_gix_oid(oid: GitOid) -> gix::ObjectId {
    gix::ObjectId::from_bytes_or_panic(oid.as_bytes())
}

pub(crate) fn from_gix_oid(oid: &gix::oid) -> Result<GitOid, GitError> {
    let bytes: [u8; 20] = oid.as_bytes().try_into().map_err(|_| GitError::InvalidOid {
        value: oid.to_string(),
        reason: "only SHA-1 repositories are supported".to_owned(),
    })?;
    Ok(GitOid::from_bytes(bytes))
}

impl GitRepo for GixRepo {
    // === Refs ===
    fn read_ref(&self, name: &RefName) -> Result<Option<GitOid>, GitError> {
        crate::refs_impl::read_ref(self, name)
    }

    fn write_ref(&self, name: &RefName, oid: GitOid, log_message: &str) -> Result<(), GitError> {
        crate::refs_impl::write_ref(self, name, oid, log_message)
    }

    fn atomic_ref_update(&self, edits: &[RefEdit], log_message: &str) -> Result<(), GitError> {
        crate::refs_impl::atomic_ref_update(self, edits, log_message)
    }

    // === HEAD ===
    fn head_target(&self) -> Result<Option<RefName>, GitError> {
        crate::refs_impl::head_target(self)
    }

    fn set_head(&self, target: &RefName) -> Result<(), GitError> {
        crate::refs_impl::set_head(self, target)
    }

    // === Object read ===
    fn read_blob(&self, oid: GitOid) -> Result<Vec<u8>, GitError> {
        crate::objects_impl::read_blob(self, oid)
    }

    fn read_tree(&self, oid: GitOid) -> Result<Vec<TreeEntry>, GitError> {
        crate::objects_impl::read_tree(self, oid)
    }

    fn read_commit(&self, oid: GitOid) -> Result<CommitInfo, GitError> {
        crate::objects_impl::read_commit(self, oid)
    }

    // === Object write ===
    fn write_blob(&self, data: &[u8]) -> Result<GitOid, GitError> {
        crate::objects_impl::write_blob(self, data)
    }

    fn write_tree(&self, entries: &[TreeEntry]) -> Result<GitOid, GitError> {
        crate::objects_impl::write_tree(self, entries)
    }

    fn create_commit(
        &self,
        tree: GitOid,
        parents: &[GitOid],
        message: &str,
        author: &Signature,
        committer: &Signature,
    ) -> Result<GitOid, GitError> {
        crate::objects_impl::create_commit(self, tree, parents, message, author, committer)
    }

    // === Worktree ===
    fn workdir(&self) -> Option<&Path> {
        self.workdir.as_deref()
    }

    fn is_dirty(&self) -> Result<bool, GitError> {
        crate::worktree_impl::is_dirty(self)
    }

    fn reset_index(&self, tree: GitOid) -> Result<(), GitError> {
        crate::worktree_impl::reset_index(self, tree)
    }

    // === Config ===
    fn configured_identity(&self) -> Result<Option<(String, String)>, GitError> {
        crate::worktree_impl::configured_identity(self)
    }

    // === Ancestry ===
    fn is_ancestor(&self, ancestor: GitOid, descendant: GitOid) -> Result<bool, GitError> {
        crate::refs_impl::is_ancestor(self, ancestor, descendant)
    }
}
