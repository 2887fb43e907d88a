//! gix-backed ref, HEAD, rev-parse, and ancestry operations.

use gix::refs::transaction::{Change, LogChange, PreviousValue, RefLog};
use gix::refs::{FullName, Target};

use crate::error::GitError;
use crate::gix_repo::{GixRepo, from_gix_oid, to_gix_oid};
use crate::types::*;

fn full_name(name: &RefName) -> Result<FullName, GitError> {
    name.as_str()
        .try_into()
        .map_err(|e: gix::validate::reference::name::Error| GitError::backend(name.as_str(), e))
}

fn log_change(message: &str) -> LogChange {
    LogChange {
        mode: RefLog::AndReference,
        force_create_reflog: false,
        message: message.into(),
    }
}

/// gix reports CAS mismatches through its generic transaction error; the
/// message is the only place the distinction survives.
fn looks_like_cas_failure(msg: &str) -> bool {
    msg.contains("should have content")
        || msg.contains("did not match")
        || msg.contains("must not exist")
        || msg.contains("MustNotExist")
        || msg.contains("MustExistAndMatch")
        || msg.contains("existing object id")
}

pub fn read_ref(repo: &GixRepo, name: &RefName) -> Result<Option<GitOid>, GitError> {
    match repo.repo.try_find_reference(name.as_str()) {
        Ok(Some(mut r)) => {
            let id = r
                .peel_to_id_in_place()
                .map_err(|e| GitError::backend(name.as_str(), e))?;
            Ok(Some(from_gix_oid(id.as_ref())?))
        }
        Ok(None) => Ok(None),
        Err(e) => Err(GitError::backend(name.as_str(), e)),
    }
}

pub fn write_ref(
    repo: &GixRepo,
    name: &RefName,
    oid: GitOid,
    log_message: &str,
) -> Result<(), GitError> {
    repo.repo
        .reference(name.as_str(), to_gix_oid(oid), PreviousValue::Any, log_message)
        .map_err(|e| GitError::backend(name.as_str(), e))?;
    Ok(())
}

pub fn atomic_ref_update(
    repo: &GixRepo,
    edits: &[RefEdit],
    log_message: &str,
) -> Result<(), GitError> {
    let gix_edits = edits
        .iter()
        .map(|edit| {
            let expected = if edit.expected_old_oid.is_zero() {
                PreviousValue::MustNotExist
            } else {
                PreviousValue::MustExistAndMatch(Target::Object(to_gix_oid(edit.expected_old_oid)))
            };
            Ok(gix::refs::transaction::RefEdit {
                change: Change::Update {
                    log: log_change(log_message),
                    expected,
                    new: Target::Object(to_gix_oid(edit.new_oid)),
                },
                name: full_name(&edit.name)?,
                deref: false,
            })
        })
        .collect::<Result<Vec<_>, GitError>>()?;

    repo.repo.edit_references(gix_edits).map_err(|e| {
        let message = e.to_string();
        if looks_like_cas_failure(&message) {
            GitError::RefConflict {
                ref_name: edits
                    .first()
                    .map(|e| e.name.to_string())
                    .unwrap_or_default(),
                message,
            }
        } else {
            GitError::BackendError { message }
        }
    })?;
    Ok(())
}

pub fn head_target(repo: &GixRepo) -> Result<Option<RefName>, GitError> {
    let name = repo
        .repo
        .head_name()
        .map_err(|e| GitError::backend("HEAD", e))?;
    name.map(|n| {
        let s = n.as_bstr().to_string();
        RefName::new(&s).map_err(|e| GitError::backend("HEAD target", e))
    })
    .transpose()
}

pub fn set_head(repo: &GixRepo, target: &RefName) -> Result<(), GitError> {
    let head: FullName = "HEAD"
        .try_into()
        .map_err(|e: gix::validate::reference::name::Error| GitError::backend("HEAD", e))?;
    repo.repo
        .edit_reference(gix::refs::transaction::RefEdit {
            change: Change::Update {
                log: log_change(&format!("heatgrid: moving to {target}")),
                expected: PreviousValue::Any,
                new: Target::Symbolic(full_name(target)?),
            },
            name: head,
            deref: false,
        })
        .map_err(|e| GitError::backend("set HEAD", e))?;
    Ok(())
}

pub fn is_ancestor(
    repo: &GixRepo,
    ancestor: GitOid,
    descendant: GitOid,
) -> Result<bool, GitError> {
    if ancestor == descendant {
        return Ok(true);
    }
    let target = to_gix_oid(ancestor);
    let walk = repo
        .repo
        .rev_walk([to_gix_oid(descendant)])
        .all()
        .map_err(|e| GitError::backend("rev-walk", e))?;
    for info in walk {
        let info = info.map_err(|e| GitError::backend("rev-walk", e))?;
        if info.id == target {
            return Ok(true);
        }
    }
    Ok(false)
}
