//! Record names and their on-disk file names.

use std::fmt;

use crate::error::{Result, StoreError};

/// Extension carried by every record file in the store root.
pub const RECORD_EXTENSION: &str = "gpg";

/// A validated record name: usable as a single filesystem leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordName(String);

impl RecordName {
    /// Validate a record name.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidName` if the name is empty, contains a
    /// path separator or NUL byte, or starts with `.`.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let invalid = name.is_empty()
            || name.starts_with('.')
            || name.contains(['/', '\\', '\0']);
        if invalid {
            return Err(StoreError::InvalidName(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `<name>.gpg`
    pub fn file_name(&self) -> String {
        format!("{}.{RECORD_EXTENSION}", self.0)
    }

    /// Inverse of [`RecordName::file_name`]; `None` for anything that is not
    /// a record file.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(&format!(".{RECORD_EXTENSION}"))?;
        Self::new(stem).ok()
    }
}

impl fmt::Display for RecordName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RecordName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
