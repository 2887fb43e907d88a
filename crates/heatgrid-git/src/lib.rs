//! Object and ref store abstraction for heatgrid.
//!
//! This crate defines the [`GitRepo`] trait, the only interface through which
//! the history builder reaches git. Nothing outside this crate imports gix;
//! everything programs against the trait so tests can wrap the real store.
//!
//! # Crate layout
//!
//! - [`repo`]: the [`GitRepo`] trait.
//! - [`types`]: value types in trait signatures ([`GitOid`], [`RefName`],
//!   [`TreeEntry`], [`Signature`], ...).
//! - [`error`]: the [`GitError`] enum.

pub mod error;
pub mod repo;
pub mod types;

// gix-backed implementation modules
mod gix_repo;
mod objects_impl;
mod refs_impl;
mod worktree_impl;

pub use gix_repo::GixRepo;

pub use error::GitError;
pub use repo::GitRepo;
pub use types::{
    CommitInfo, EntryMode, GitOid, OidParseError, RefEdit, RefName, RefNameError, Signature,
    TreeEntry, compare_tree_entries,
};
