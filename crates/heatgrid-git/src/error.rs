//! Error type for object-store and ref operations.
//!
//! [`GitError`] is returned by every [`GitRepo`](crate::GitRepo) method. The
//! variants are coarse on purpose: callers mostly need to tell "missing",
//! "somebody else moved the ref" and "try again" apart.

use thiserror::Error;

/// Errors returned by [`GitRepo`](crate::GitRepo) operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// A requested object, ref, or path was not found.
    #[error("not found: {message}")]
    NotFound { message: String },

    /// A compare-and-swap ref update saw a different current value.
    #[error("ref conflict on `{ref_name}`: {message}")]
    RefConflict { ref_name: String, message: String },

    /// A stored OID could not be parsed.
    #[error("invalid OID `{value}`: {reason}")]
    InvalidOid { value: String, reason: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Unclassified failure reported by gix. The message carries enough
    /// context to diagnose it.
    #[error("git backend error: {message}")]
    BackendError { message: String },
}

impl GitError {
    pub(crate) fn backend(context: &str, err: impl std::fmt::Display) -> Self {
        Self::BackendError {
            message: format!("{context}: {err}"),
        }
    }

    /// Whether retrying the same call may succeed.
    ///
    /// Lock-file contention on the object database or ref store and
    /// interrupted or timed-out I/O count as transient. Everything else,
    /// including CAS conflicts, is final.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::IoError(e) => matches!(
                e.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
            ),
            Self::BackendError { message } => {
                let msg = message.to_ascii_lowercase();
                msg.contains("lock")
                    || msg.contains("resource temporarily unavailable")
                    || msg.contains("interrupted")
            }
            Self::NotFound { .. } | Self::RefConflict { .. } | Self::InvalidOid { .. } => false,
        }
    }
}
