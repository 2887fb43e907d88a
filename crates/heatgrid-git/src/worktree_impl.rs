//! Dirty detection, index reset and identity lookup for [`GixRepo`].

use crate::error::GitError;
use crate::gix_repo::{GixRepo, to_gix_oid};
use crate::types::GitOid;

pub fn is_dirty(repo: &GixRepo) -> Result<bool, GitError> {
    let head = repo.repo.head().map_err(|e| GitError::backend("HEAD", e))?;
    if head.is_unborn() {
        // No HEAD tree to compare against: anything staged counts.
        let index = repo
            .repo
            .index_or_empty()
            .map_err(|e| GitError::backend("read index", e))?;
        return Ok(!index.entries().is_empty());
    }
    repo.repo
        .is_dirty()
        .map_err(|e| GitError::backend("status", e))
}

/// Equivalent of `git read-tree <tree>`: the index now mirrors `tree`,
/// worktree files are not touched.
pub fn reset_index(repo: &GixRepo, tree: GitOid) -> Result<(), GitError> {
    let tree_id = to_gix_oid(tree);
    let state = gix::index::State::from_tree(&tree_id, &repo.repo.objects, Default::default())
        .map_err(|e| GitError::backend(&format!("index from tree {tree}"), e))?;
    let mut index = gix::index::File::from_state(state, repo.repo.index_path());
    index
        .write(Default::default())
        .map_err(|e| GitError::backend("write index", e))?;
    Ok(())
}

pub fn configured_identity(repo: &GixRepo) -> Result<Option<(String, String)>, GitError> {
    match repo.repo.committer() {
        None => Ok(None),
        Some(Ok(sig)) => Ok(Some((sig.name.to_string(), sig.email.to_string()))),
        Some(Err(e)) => Err(GitError::backend("read committer identity", e)),
    }
}
