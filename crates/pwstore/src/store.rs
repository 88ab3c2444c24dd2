//! Versioned store — record files in a directory that is also a repository.
//!
//! Every record lives at `<root>/<name>.gpg`. Every change to the directory
//! made through this type is paired with exactly one commit, so after any
//! successful call HEAD's tree matches what is on disk.
//!
//! ```text
//! <root>/
//! ├── .git/
//! ├── github.gpg
//! ├── mail.gpg
//! └── gh.gpg -> github.gpg      (alias)
//! ```
//!
//! Single-writer: nothing here locks the directory against a second process.

use std::path::{Path, PathBuf};

use log::Level;

use crate::error::{Result, StoreError};
use crate::record::RecordName;
use crate::telemetry::SharedReporter;
use crate::vcs::{CommitId, CommitInfo, VcsEngine};

/// Commit message for field edits and aliases.
pub const DEFAULT_COMMIT_MESSAGE: &str = "Updated given records to password store.";

/// Suffix of the sibling file used for atomic writes.
const TEMP_SUFFIX: &str = "tmp";

/// Lifecycle of a store root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Uninitialized,
    Initialized,
}

/// Record files plus their version history.
pub struct VersionedStore<V> {
    root: PathBuf,
    vcs: V,
    reporter: SharedReporter,
}

impl<V: VcsEngine> VersionedStore<V> {
    pub fn new(root: impl Into<PathBuf>, vcs: V, reporter: SharedReporter) -> Self {
        Self {
            root: root.into(),
            vcs,
            reporter,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    pub fn state(&self) -> StoreState {
        if self.vcs.is_repository(&self.root) {
            StoreState::Initialized
        } else {
            StoreState::Uninitialized
        }
    }

    /// Make sure the root exists and is a repository.
    ///
    /// Idempotent. The first transition to `Initialized` is reported at
    /// warning level.
    pub fn ensure_initialized(&self) -> Result<StoreState> {
        if self.state() == StoreState::Initialized {
            return Ok(StoreState::Initialized);
        }
        self.vcs.init(&self.root)?;
        self.reporter.report(
            Level::Warn,
            &format!("Initialized a new password store at {}", self.root.display()),
        );
        Ok(StoreState::Initialized)
    }

    /// `<root>/<name>.gpg`
    pub fn record_path(&self, name: &RecordName) -> PathBuf {
        self.root.join(name.file_name())
    }

    /// Whether the record file (or alias link, even a dangling one) exists.
    pub fn exists(&self, path: &Path) -> bool {
        path.symlink_metadata().is_ok()
    }

    /// Read a record file, following an alias link.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if nothing is there.
    pub fn read_raw(&self, path: &Path) -> Result<Vec<u8>> {
        self.reporter.report(
            Level::Debug,
            &format!("Reading encrypted data from file {}", path.display()),
        );
        match std::fs::read(path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(self.display_name(path)))
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Replace a record file's contents atomically.
    ///
    /// The bytes go to a sibling temp file which is then renamed over the
    /// target, so a reader sees either the old or the new content. When
    /// `path` is an alias link, the record at the end of the link chain is
    /// written instead and every link is left in place. Returns the path
    /// actually written.
    ///
    /// # Errors
    ///
    /// `StoreError::Repository`, before anything is written, if `path` is a
    /// link that dangles or leads outside the root.
    pub fn write_raw(&self, path: &Path, bytes: &[u8]) -> Result<PathBuf> {
        let target = self.resolve_link(path)?;
        self.reporter.report(
            Level::Debug,
            &format!("Writing encrypted data to file {}", target.display()),
        );

        let mut tmp_name = target.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(format!(".{TEMP_SUFFIX}"));
        let tmp_path = target.with_file_name(tmp_name);

        if let Err(e) = std::fs::write(&tmp_path, bytes) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(StoreError::Io(e));
        }
        if let Err(e) = std::fs::rename(&tmp_path, &target) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(StoreError::Io(e));
        }
        Ok(target)
    }

    /// Stage exactly `paths` and make one commit.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Commit` if HEAD is not the commit just made.
    pub fn stage_and_commit<P: AsRef<Path>>(&self, paths: &[P], message: &str) -> Result<CommitId> {
        let relative = paths
            .iter()
            .map(|p| self.relative(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let relative: Vec<&Path> = relative.iter().map(PathBuf::as_path).collect();

        for path in &relative {
            self.reporter.report(
                Level::Debug,
                &format!("Staging file in pwstore: {}", path.display()),
            );
        }
        self.vcs.stage(&self.root, &relative)?;

        self.reporter
            .report(Level::Debug, "Committing staged files to pwstore...");
        let commit = self.vcs.commit(&self.root, message)?;

        match self.vcs.head(&self.root)? {
            Some(head) if head == commit => Ok(commit),
            Some(head) => Err(StoreError::Commit(format!(
                "HEAD is {head} but commit {commit} was just written"
            ))),
            None => Err(StoreError::Commit(format!(
                "HEAD is unborn after writing commit {commit}"
            ))),
        }
    }

    /// Untrack and delete a file, then commit.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the path is absent before removal.
    pub fn remove_and_commit(&self, path: &Path, message: &str) -> Result<CommitId> {
        if !self.exists(path) {
            return Err(StoreError::NotFound(self.display_name(path)));
        }
        let relative = self.relative(path)?;
        self.reporter.report(
            Level::Warn,
            &format!(
                "Dropping record {} from repository {}",
                relative.display(),
                self.root.display()
            ),
        );

        self.vcs.unstage(&self.root, &relative)?;
        std::fs::remove_file(path)?;
        self.stage_and_commit(&[path], message)
    }

    /// Create `alias` as a relative link to `target` and commit it.
    ///
    /// If `target` is itself an alias, the new link points at the record
    /// it resolves to, so links never chain.
    pub fn link_and_commit(&self, target: &Path, alias: &Path, message: &str) -> Result<CommitId> {
        let target = self.resolve_link(target)?;
        let link_text = self.relative(&target)?;
        make_symlink(&link_text, alias)?;
        self.stage_and_commit(&[alias], message)
    }

    /// Record names whose file name contains `fragment`, ignoring case.
    /// A plain scan of the root; aliases are included.
    pub fn search(&self, fragment: &str) -> Result<Vec<RecordName>> {
        let needle = fragment.to_uppercase();
        let mut found = Vec::new();
        for name in self.record_names()? {
            if name.file_name().to_uppercase().contains(&needle) {
                found.push(name);
            }
        }
        Ok(found)
    }

    /// Aliases that lead to `name`'s file, directly or through other links.
    pub fn aliases_of(&self, name: &RecordName) -> Result<Vec<RecordName>> {
        let target = self.record_path(name);
        let target_is_link = is_symlink(&target);
        let mut aliases = Vec::new();
        for candidate in self.record_names()? {
            let path = self.record_path(&candidate);
            let Ok(link) = std::fs::read_link(&path) else {
                continue;
            };
            let direct = path.parent().unwrap_or(&self.root).join(&link) == target
                || link == target;
            // Hand-made chains end at the record itself.
            let chained = !target_is_link
                && self.resolve_link(&path).is_ok_and(|resolved| resolved == target);
            if direct || chained {
                aliases.push(candidate);
            }
        }
        Ok(aliases)
    }

    /// Most recent commits, newest first.
    pub fn history(&self, limit: usize) -> Result<Vec<CommitInfo>> {
        self.vcs.history(&self.root, limit)
    }

    /// Paths tracked by HEAD.
    pub fn tracked_paths(&self) -> Result<Vec<PathBuf>> {
        self.vcs.tracked_paths(&self.root)
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    /// All record names present in the root, sorted.
    fn record_names(&self) -> Result<Vec<RecordName>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            if !(file_type.is_file() || file_type.is_symlink()) {
                continue;
            }
            let file_name = entry.file_name();
            if let Some(name) = RecordName::from_file_name(&file_name.to_string_lossy()) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn relative(&self, path: &Path) -> Result<PathBuf> {
        path.strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .map_err(|_| {
                StoreError::Repository(format!(
                    "{} is outside the store at {}",
                    path.display(),
                    self.root.display()
                ))
            })
    }

    /// Follow an alias through every link level to the record file it ends
    /// at. Anything that is not a link is returned unchanged.
    ///
    /// # Errors
    ///
    /// `StoreError::Repository` if the chain is dangling or ends anywhere
    /// but directly inside the root.
    fn resolve_link(&self, path: &Path) -> Result<PathBuf> {
        if !is_symlink(path) {
            return Ok(path.to_path_buf());
        }
        let resolved = std::fs::canonicalize(path).map_err(|e| {
            StoreError::Repository(format!(
                "alias {} cannot be resolved: {e}",
                self.display_name(path)
            ))
        })?;
        let root = std::fs::canonicalize(&self.root)?;
        let inside = resolved
            .strip_prefix(&root)
            .ok()
            .filter(|inside| inside.components().count() == 1)
            .ok_or_else(|| {
                StoreError::Repository(format!(
                    "alias {} does not lead to a record in the store at {}",
                    self.display_name(path),
                    self.root.display()
                ))
            })?;
        Ok(self.root.join(inside))
    }

    fn display_name(&self, path: &Path) -> String {
        path.file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }
}

fn is_symlink(path: &Path) -> bool {
    path.symlink_metadata()
        .is_ok_and(|meta| meta.file_type().is_symlink())
}

#[cfg(unix)]
fn make_symlink(link_text: &Path, alias: &Path) -> Result<()> {
    std::os::unix::fs::symlink(link_text, alias)?;
    Ok(())
}

#[cfg(windows)]
fn make_symlink(link_text: &Path, alias: &Path) -> Result<()> {
    std::os::windows::fs::symlink_file(link_text, alias)?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
