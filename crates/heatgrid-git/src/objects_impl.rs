//! gix-backed object reads and writes.

use crate::error::GitError;
use crate::gix_repo::{GixRepo, from_gix_oid, to_gix_oid};
use crate::types::*;

fn from_gix_entry_mode(mode: gix::objs::tree::EntryMode) -> EntryMode {
    match mode.kind() {
        gix::objs::tree::EntryKind::Tree => EntryMode::Tree,
        gix::objs::tree::EntryKind::Blob => EntryMode::Blob,
        gix::objs::tree::EntryKind::BlobExecutable => EntryMode::BlobExecutable,
        gix::objs::tree::EntryKind::Link => EntryMode::Link,
        gix::objs::tree::EntryKind::Commit => EntryMode::Commit,
    }
}

const fn to_gix_entry_kind(mode: EntryMode) -> gix::objs::tree::EntryKind {
    match mode {
        EntryMode::Blob => gix::objs::tree::EntryKind::Blob,
        EntryMode::BlobExecutable => gix::objs::tree::EntryKind::BlobExecutable,
        EntryMode::Tree => gix::objs::tree::EntryKind::Tree,
        EntryMode::Link => gix::objs::tree::EntryKind::Link,
        EntryMode::Commit => gix::objs::tree::EntryKind::Commit,
    }
}

fn to_gix_signature(sig: &Signature) -> gix::actor::Signature {
    gix::actor::Signature {
        name: sig.name.as_str().into(),
        email: sig.email.as_str().into(),
        time: gix::date::Time::new(sig.seconds, sig.offset_seconds),
    }
}

pub fn read_blob(repo: &GixRepo, oid: GitOid) -> Result<Vec<u8>, GitError> {
    let mut blob = repo
        .repo
        .find_blob(to_gix_oid(oid))
        .map_err(|e| GitError::NotFound {
            message: format!("blob {oid}: {e}"),
        })?;
    Ok(blob.take_data())
}

pub fn read_tree(repo: &GixRepo, oid: GitOid) -> Result<Vec<TreeEntry>, GitError> {
    let tree = repo
        .repo
        .find_tree(to_gix_oid(oid))
        .map_err(|e| GitError::NotFound {
            message: format!("tree {oid}: {e}"),
        })?;

    let mut entries = Vec::new();
    for result in tree.iter() {
        let entry = result.map_err(|e| GitError::backend("decode tree entry", e))?;
        entries.push(TreeEntry {
            name: entry.inner.filename.to_string(),
            mode: from_gix_entry_mode(entry.inner.mode),
            oid: from_gix_oid(entry.inner.oid)?,
        });
    }
    Ok(entries)
}

pub fn read_commit(repo: &GixRepo, oid: GitOid) -> Result<CommitInfo, GitError> {
    let commit = repo
        .repo
        .find_commit(to_gix_oid(oid))
        .map_err(|e| GitError::NotFound {
            message: format!("commit {oid}: {e}"),
        })?;
    let decoded = commit
        .decode()
        .map_err(|e| GitError::backend(&format!("decode commit {oid}"), e))?;

    let tree_oid = from_gix_oid(&decoded.tree())?;
    let parents = decoded
        .parents()
        .map(|p| from_gix_oid(&p))
        .collect::<Result<Vec<_>, _>>()?;
    let message = decoded.message.to_string();

    let author = from_gix_signature(decoded.author(), oid)?;
    let committer = from_gix_signature(decoded.committer(), oid)?;

    Ok(CommitInfo {
        tree_oid,
        parents,
        message,
        author,
        committer,
    })
}

fn from_gix_signature(sig: gix::actor::SignatureRef<'_>, oid: GitOid) -> Result<Signature, GitError> {
    let time = sig
        .time()
        .map_err(|e| GitError::backend(&format!("commit {oid} signature time"), e))?;
    Ok(Signature::new(
        &sig.name.to_string(),
        &sig.email.to_string(),
        time.seconds,
        time.offset,
    ))
}

pub fn write_blob(repo: &GixRepo, data: &[u8]) -> Result<GitOid, GitError> {
    let id = repo
        .repo
        .write_blob(data)
        .map_err(|e| GitError::backend("write blob", e))?;
    from_gix_oid(id.as_ref())
}

pub fn write_tree(repo: &GixRepo, entries: &[TreeEntry]) -> Result<GitOid, GitError> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(compare_tree_entries);
    let tree = gix::objs::Tree {
        entries: sorted
            .iter()
            .map(|e| gix::objs::tree::Entry {
                mode: to_gix_entry_kind(e.mode).into(),
                filename: e.name.as_str().into(),
                oid: to_gix_oid(e.oid),
            })
            .collect(),
    };
    let id = repo
        .repo
        .write_object(&tree)
        .map_err(|e| GitError::backend("write tree", e))?;
    from_gix_oid(id.as_ref())
}

pub fn create_commit(
    repo: &GixRepo,
    tree: GitOid,
    parents: &[GitOid],
    message: &str,
    author: &Signature,
    committer: &Signature,
) -> Result<GitOid, GitError> {
    let commit = gix::objs::Commit {
        message: message.into(),
        tree: to_gix_oid(tree),
        author: to_gix_signature(author),
        committer: to_gix_signature(committer),
        encoding: None,
        parents: parents.iter().map(|p| to_gix_oid(*p)).collect(),
        extra_headers: Default::default(),
    };
    let id = repo
        .repo
        .write_object(&commit)
        .map_err(|e| GitError::backend("write commit", e))?;
    from_gix_oid(id.as_ref())
}
