//! Version-control capability used by the store.
//!
//! [`VcsEngine`] is stateless over a repository root: each call opens the
//! repository at the root it is given, does one thing, and lets go. Paths
//! passed to it are relative to that root.
//!
//! - [`git::GitEngine`] — libgit2 through the `git2` crate.

pub mod git;

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;

pub use git::GitEngine;

/// Hex object id of a commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CommitId(pub String);

impl CommitId {
    /// First seven hex digits, as `git log --oneline` prints them.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(7);
        &self.0[..end]
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of the store's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    pub id: CommitId,
    pub summary: String,
    pub time: DateTime<Utc>,
}

/// External version-control capability.
pub trait VcsEngine {
    /// Whether `root` is already a repository.
    fn is_repository(&self, root: &Path) -> bool;

    /// Create a repository at `root`, creating the directory if needed.
    fn init(&self, root: &Path) -> Result<()>;

    /// Record the current on-disk state of exactly these paths in the index.
    /// A path missing from disk is removed from the index.
    fn stage(&self, root: &Path, paths: &[&Path]) -> Result<()>;

    /// Remove a path from the index, leaving the working tree alone.
    fn unstage(&self, root: &Path, path: &Path) -> Result<()>;

    /// Commit the index on top of HEAD and return the new commit id.
    fn commit(&self, root: &Path, message: &str) -> Result<CommitId>;

    /// Current HEAD commit, `None` before the first commit.
    fn head(&self, root: &Path) -> Result<Option<CommitId>>;

    /// Paths in HEAD's tree, sorted.
    fn tracked_paths(&self, root: &Path) -> Result<Vec<PathBuf>>;

    /// Up to `limit` commits reachable from HEAD, newest first.
    fn history(&self, root: &Path, limit: usize) -> Result<Vec<CommitInfo>>;
}
