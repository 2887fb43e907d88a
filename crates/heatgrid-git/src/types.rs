//! Value types shared by the [`GitRepo`](crate::GitRepo) trait and its callers.
//!
//! Nothing here mentions gix. The backend converts to and from these types at
//! the trait boundary so the core can be tested against any store.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// GitOid
// ---------------------------------------------------------------------------

/// A git object identifier (SHA-1, 20 bytes).
///
/// Displays as 40 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GitOid([u8; 20]);

impl GitOid {
    /// Sentinel meaning "ref does not exist" in [`RefEdit::expected_old_oid`].
    pub const ZERO: Self = Self([0; 20]);

    #[must_use]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// The first `len` hex characters, for log lines.
    #[must_use]
    pub fn short(&self, len: usize) -> String {
        let mut s = self.to_string();
        s.truncate(len);
        s
    }
}

impl fmt::Display for GitOid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for GitOid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GitOid({self})")
    }
}

impl FromStr for GitOid {
    type Err = OidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = |reason: String| OidParseError {
            value: s.to_owned(),
            reason,
        };
        if s.len() != 40 {
            return Err(fail(format!("expected 40 hex characters, got {}", s.len())));
        }
        let mut bytes = [0u8; 20];
        for (slot, pair) in bytes.iter_mut().zip(s.as_bytes().chunks(2)) {
            let hi = hex_value(pair[0]).ok_or_else(|| fail(format!("bad hex digit {:?}", pair[0] as char)))?;
            let lo = hex_value(pair[1]).ok_or_else(|| fail(format!("bad hex digit {:?}", pair[1] as char)))?;
            *slot = (hi << 4) | lo;
        }
        Ok(Self(bytes))
    }
}

/// Error from parsing a hex string into a [`GitOid`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OidParseError {
    pub value: String,
    pub reason: String,
}

impl fmt::Display for OidParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid OID {:?}: {}", self.value, self.reason)
    }
}

impl std::error::Error for OidParseError {}

const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// RefName
// ---------------------------------------------------------------------------

/// A validated ref name: either `HEAD` or something under `refs/`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RefName(String);

impl RefName {
    /// The symbolic `HEAD` ref.
    #[must_use]
    pub fn head() -> Self {
        Self("HEAD".to_owned())
    }

    /// Build `refs/heads/<branch>`.
    ///
    /// # Errors
    /// Returns an error if `branch` is empty or contains characters git
    /// refuses in ref names.
    pub fn branch(branch: &str) -> Result<Self, RefNameError> {
        Self::new(&format!("refs/heads/{branch}"))
    }

    /// Validate and wrap a full ref name.
    ///
    /// # Errors
    /// Returns an error if the name is not `HEAD`, does not start with
    /// `refs/`, has an empty component, or contains forbidden characters.
    pub fn new(name: &str) -> Result<Self, RefNameError> {
        let reject = |reason: &str| {
            Err(RefNameError {
                value: name.to_owned(),
                reason: reason.to_owned(),
            })
        };
        if name == "HEAD" {
            return Ok(Self(name.to_owned()));
        }
        let Some(rest) = name.strip_prefix("refs/") else {
            return reject("ref name must start with 'refs/' or be HEAD");
        };
        if rest.is_empty() || rest.split('/').any(str::is_empty) {
            return reject("ref name has an empty component");
        }
        if name.ends_with(".lock") || name.contains("..") || name.contains("@{") {
            return reject("ref name contains a forbidden sequence");
        }
        if name
            .chars()
            .any(|c| c.is_ascii_control() || matches!(c, ' ' | '~' | '^' | ':' | '?' | '*' | '[' | '\\'))
        {
            return reject("ref name contains a forbidden character");
        }
        Ok(Self(name.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RefName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RefName {
    type Err = RefNameError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Error from validating a [`RefName`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefNameError {
    pub value: String,
    pub reason: String,
}

impl fmt::Display for RefNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid ref name {:?}: {}", self.value, self.reason)
    }
}

impl std::error::Error for RefNameError {}

/// A compare-and-swap ref update for [`GitRepo::atomic_ref_update`](crate::GitRepo::atomic_ref_update).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefEdit {
    pub name: RefName,
    pub new_oid: GitOid,
    /// Current value the ref must have. [`GitOid::ZERO`] asserts that the
    /// ref does not exist yet.
    pub expected_old_oid: GitOid,
}

// ---------------------------------------------------------------------------
// Trees
// ---------------------------------------------------------------------------

/// File mode of a tree entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryMode {
    /// `100644`
    Blob,
    /// `100755`
    BlobExecutable,
    /// `040000`
    Tree,
    /// `120000`
    Link,
    /// `160000` (gitlink)
    Commit,
}

/// One entry of a tree object (basename only, not a path).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    pub name: String,
    pub mode: EntryMode,
    pub oid: GitOid,
}

/// Git's canonical tree order: byte-wise by name, where a subtree compares
/// as if its name ended in `/`.
pub fn compare_tree_entries(a: &TreeEntry, b: &TreeEntry) -> Ordering {
    let key = |e: &TreeEntry| {
        let mut k = e.name.as_bytes().to_vec();
        if e.mode == EntryMode::Tree {
            k.push(b'/');
        }
        k
    };
    key(a).cmp(&key(b))
}

// ---------------------------------------------------------------------------
// Commits
// ---------------------------------------------------------------------------

/// Author or committer identity plus a fixed point in time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
    /// Seconds since the Unix epoch (UTC).
    pub seconds: i64,
    /// Offset east of UTC, in seconds.
    pub offset_seconds: i32,
}

impl Signature {
    #[must_use]
    pub fn new(name: &str, email: &str, seconds: i64, offset_seconds: i32) -> Self {
        Self {
            name: name.to_owned(),
            email: email.to_owned(),
            seconds,
            offset_seconds,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// A decoded commit object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitInfo {
    pub tree_oid: GitOid,
    /// Empty for root commits.
    pub parents: Vec<GitOid>,
    pub message: String,
    pub author: Signature,
    pub committer: Signature,
}

impl CommitInfo {
    /// First parent, if any.
    #[must_use]
    pub fn parent(&self) -> Option<GitOid> {
        self.parents.first().copied()
    }
}
