//! [`VcsEngine`] backed by libgit2.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use git2::{ErrorCode, Repository, Signature, TreeWalkMode, TreeWalkResult};

use super::{CommitId, CommitInfo, VcsEngine};
use crate::error::{Result, StoreError};

/// Identity used for commits when the repository has none configured.
const FALLBACK_NAME: &str = "pwstore";
const FALLBACK_EMAIL: &str = "pwstore@localhost";

/// Git engine. Holds no open handles between calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitEngine;

impl GitEngine {
    pub fn new() -> Self {
        Self
    }

    fn open(&self, root: &Path) -> Result<Repository> {
        Ok(Repository::open(root)?)
    }

    fn signature(repo: &Repository) -> Result<Signature<'static>> {
        match repo.signature() {
            Ok(sig) => Ok(sig),
            Err(_) => Ok(Signature::now(FALLBACK_NAME, FALLBACK_EMAIL)?),
        }
    }
}

impl VcsEngine for GitEngine {
    fn is_repository(&self, root: &Path) -> bool {
        root.is_dir() && Repository::open(root).is_ok()
    }

    fn init(&self, root: &Path) -> Result<()> {
        std::fs::create_dir_all(root)?;
        Repository::init(root)?;
        Ok(())
    }

    fn stage(&self, root: &Path, paths: &[&Path]) -> Result<()> {
        let repo = self.open(root)?;
        let mut index = repo.index()?;
        for path in paths {
            if root.join(path).symlink_metadata().is_ok() {
                index.add_path(path)?;
            } else {
                index.remove_path(path)?;
            }
        }
        index.write()?;
        Ok(())
    }

    fn unstage(&self, root: &Path, path: &Path) -> Result<()> {
        let repo = self.open(root)?;
        let mut index = repo.index()?;
        index.remove_path(path)?;
        index.write()?;
        Ok(())
    }

    fn commit(&self, root: &Path, message: &str) -> Result<CommitId> {
        let repo = self.open(root)?;
        let mut index = repo.index()?;
        let tree_oid = index.write_tree()?;
        let tree = repo.find_tree(tree_oid)?;
        let signature = Self::signature(&repo)?;

        let parent = match repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if is_unborn(&e) => None,
            Err(e) => return Err(e.into()),
        };
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;
        Ok(CommitId(oid.to_string()))
    }

    fn head(&self, root: &Path) -> Result<Option<CommitId>> {
        let repo = self.open(root)?;
        let head = match repo.head() {
            Ok(head) => head,
            Err(e) if is_unborn(&e) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(head.target().map(|oid| CommitId(oid.to_string())))
    }

    fn tracked_paths(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let repo = self.open(root)?;
        let tree = match repo.head() {
            Ok(head) => head.peel_to_tree()?,
            Err(e) if is_unborn(&e) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        tree.walk(TreeWalkMode::PreOrder, |dir, entry| {
            if entry.kind() != Some(git2::ObjectType::Tree) {
                if let Some(name) = entry.name() {
                    paths.push(PathBuf::from(format!("{dir}{name}")));
                }
            }
            TreeWalkResult::Ok
        })?;
        paths.sort();
        Ok(paths)
    }

    fn history(&self, root: &Path, limit: usize) -> Result<Vec<CommitInfo>> {
        let repo = self.open(root)?;
        if self.head(root)?.is_none() {
            return Ok(Vec::new());
        }

        let mut walk = repo.revwalk()?;
        walk.push_head()?;

        let mut commits = Vec::new();
        for oid in walk.take(limit) {
            let commit = repo.find_commit(oid?)?;
            let time = DateTime::<Utc>::from_timestamp(commit.time().seconds(), 0)
                .ok_or_else(|| {
                    StoreError::Repository(format!("commit {} has an invalid timestamp", commit.id()))
                })?;
            commits.push(CommitInfo {
                id: CommitId(commit.id().to_string()),
                summary: commit.summary().unwrap_or_default().to_string(),
                time,
            });
        }
        Ok(commits)
    }
}

fn is_unborn(e: &git2::Error) -> bool {
    matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
