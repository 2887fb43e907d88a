//! The [`GitRepo`] trait: the one boundary between heatgrid and git.
//!
//! The core only ever needs a handful of store primitives, grouped below:
//!
//! | Group        | Methods                                                  |
//! |--------------|----------------------------------------------------------|
//! | Refs         | `read_ref`, `write_ref`, `atomic_ref_update`             |
//! | HEAD         | `head_target`, `set_head`                                |
//! | Object read  | `read_blob`, `read_tree`, `read_commit`                  |
//! | Object write | `write_blob`, `write_tree`, `create_commit`              |
//! | Worktree     | `workdir`, `is_dirty`, `reset_index`                     |
//! | Config       | `configured_identity`                                    |
//! | Ancestry     | `is_ancestor`                                            |

use std::path::Path;

use crate::error::GitError;
use crate::types::{CommitInfo, GitOid, RefEdit, RefName, Signature, TreeEntry};

/// Object and ref store used by the history builder.
///
/// Implemented by [`GixRepo`](crate::GixRepo) and by test doubles that wrap
/// it to inject failures.
///
/// # Object safety
///
/// No generic methods; callers hold `&dyn GitRepo`.
pub trait GitRepo {
    // -----------------------------------------------------------------------
    // Refs
    // -----------------------------------------------------------------------

    /// Resolve a ref to its OID, or `None` if it does not exist.
    fn read_ref(&self, name: &RefName) -> Result<Option<GitOid>, GitError>;

    /// Create or overwrite a ref unconditionally.
    fn write_ref(&self, name: &RefName, oid: GitOid, log_message: &str) -> Result<(), GitError>;

    /// Apply ref updates atomically with compare-and-swap semantics.
    ///
    /// If any ref's current value differs from its `expected_old_oid`, no ref
    /// is changed and [`GitError::RefConflict`] is returned.
    fn atomic_ref_update(&self, edits: &[RefEdit], log_message: &str) -> Result<(), GitError>;

    // -----------------------------------------------------------------------
    // HEAD
    // -----------------------------------------------------------------------

    /// The ref HEAD points to symbolically, or `None` when HEAD is detached.
    ///
    /// Works on unborn branches (the target need not exist yet).
    fn head_target(&self) -> Result<Option<RefName>, GitError>;

    /// Point HEAD symbolically at `target`.
    fn set_head(&self, target: &RefName) -> Result<(), GitError>;

    // -----------------------------------------------------------------------
    // Object read
    // -----------------------------------------------------------------------

    fn read_blob(&self, oid: GitOid) -> Result<Vec<u8>, GitError>;

    /// One level of tree entries, not recursive.
    fn read_tree(&self, oid: GitOid) -> Result<Vec<TreeEntry>, GitError>;

    fn read_commit(&self, oid: GitOid) -> Result<CommitInfo, GitError>;

    // -----------------------------------------------------------------------
    // Object write
    // -----------------------------------------------------------------------

    fn write_blob(&self, data: &[u8]) -> Result<GitOid, GitError>;

    /// Write a tree. Entries may be passed in any order; they are sorted into
    /// git's canonical order first.
    fn write_tree(&self, entries: &[TreeEntry]) -> Result<GitOid, GitError>;

    /// Write a commit object with explicit identities and timestamps.
    ///
    /// Never touches a ref: advancing a branch is the caller's job.
    fn create_commit(
        &self,
        tree: GitOid,
        parents: &[GitOid],
        message: &str,
        author: &Signature,
        committer: &Signature,
    ) -> Result<GitOid, GitError>;

    // -----------------------------------------------------------------------
    // Worktree
    // -----------------------------------------------------------------------

    /// Root of the working tree, `None` for bare repositories.
    fn workdir(&self) -> Option<&Path>;

    /// `true` if the index or any tracked worktree file differs from HEAD.
    /// Untracked files do not count.
    fn is_dirty(&self) -> Result<bool, GitError>;

    /// Replace the index with the contents of `tree`. The working tree is
    /// left alone.
    fn reset_index(&self, tree: GitOid) -> Result<(), GitError>;

    // -----------------------------------------------------------------------
    // Config
    // -----------------------------------------------------------------------

    /// Identity configured in the repository (`user.name`/`user.email` and
    /// the usual environment overrides), if any.
    fn configured_identity(&self) -> Result<Option<(String, String)>, GitError>;

    // -----------------------------------------------------------------------
    // Ancestry
    // -----------------------------------------------------------------------

    /// `true` if `ancestor` is reachable from `descendant` via parent links
    /// (a commit counts as its own ancestor).
    fn is_ancestor(&self, ancestor: GitOid, descendant: GitOid) -> Result<bool, GitError>;
}
