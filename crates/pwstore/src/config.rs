//! Environment-driven configuration.
//!
//! | Variable      | Meaning                                                    |
//! |---------------|------------------------------------------------------------|
//! | `PWSTORE_DIR` | store root, honoured only if it is an existing directory   |
//! | `PWSTORE_KEY` | recipient identity; required by every encrypting operation |
//! | `GNUPGHOME`   | gpg key-material directory                                 |
//!
//! Without `PWSTORE_DIR` the store lives in the platform data directory
//! (`$XDG_DATA_HOME/pwstore` on Linux). Without `GNUPGHOME` the engine home
//! is `$HOME/.gnupg`, accepted only if a `gpg.conf` exists there.

use std::path::{Path, PathBuf};

use crate::cipher::Recipient;
use crate::error::{Result, StoreError};

pub const STORE_DIR_VAR: &str = "PWSTORE_DIR";
pub const RECIPIENT_VAR: &str = "PWSTORE_KEY";
pub const ENGINE_HOME_VAR: &str = "GNUPGHOME";

/// Directory name used under the platform data directory.
const DEFAULT_STORE_NAME: &str = "pwstore";

/// Resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    store_dir: PathBuf,
    recipient: Option<Recipient>,
    engine_home: Option<PathBuf>,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Configuration` if no store root can be
    /// determined at all.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_dir = match non_empty(lookup(STORE_DIR_VAR)) {
            Some(dir) if Path::new(&dir).is_dir() => PathBuf::from(dir),
            _ => default_store_dir()?,
        };

        let recipient = non_empty(lookup(RECIPIENT_VAR)).map(Recipient::new);

        let engine_home = match non_empty(lookup(ENGINE_HOME_VAR)) {
            Some(dir) => Some(PathBuf::from(dir)),
            None => non_empty(lookup("HOME"))
                .map(|home| PathBuf::from(home).join(".gnupg"))
                .filter(|dir| dir.join("gpg.conf").is_file()),
        };

        Ok(Self {
            store_dir,
            recipient,
            engine_home,
        })
    }

    /// Explicit settings, bypassing the environment.
    pub fn new(
        store_dir: impl Into<PathBuf>,
        recipient: Option<Recipient>,
        engine_home: Option<PathBuf>,
    ) -> Self {
        Self {
            store_dir: store_dir.into(),
            recipient,
            engine_home,
        }
    }

    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    /// The identity records are encrypted for.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Configuration` if `PWSTORE_KEY` is unset or empty.
    pub fn find_recipient(&self) -> Result<Recipient> {
        require_recipient(self.recipient.as_ref())
    }

    pub fn recipient(&self) -> Option<&Recipient> {
        self.recipient.as_ref()
    }

    /// The encryption engine's key-material directory.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Configuration` if neither `GNUPGHOME` nor a
    /// usable `~/.gnupg` was found.
    pub fn engine_home(&self) -> Result<&Path> {
        self.engine_home.as_deref().ok_or_else(|| {
            StoreError::Configuration(format!(
                "{ENGINE_HOME_VAR} could not be found (set it, or create ~/.gnupg/gpg.conf)"
            ))
        })
    }
}

/// The configured recipient, or the error every encrypting operation
/// reports when there is none.
pub fn require_recipient(recipient: Option<&Recipient>) -> Result<Recipient> {
    recipient.cloned().ok_or_else(|| {
        StoreError::Configuration(format!("Failed to encrypt data. {RECIPIENT_VAR} is not set."))
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn default_store_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join(DEFAULT_STORE_NAME))
        .ok_or_else(|| {
            StoreError::Configuration("cannot determine the platform data directory".to_string())
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
