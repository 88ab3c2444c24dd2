//! pwstore — an encrypted, version-controlled store for secret records.
//!
//! Each record is a named flat map of string fields (a website's
//! credentials, say), kept as one gpg-encrypted file in a directory that is
//! also a git repository. Every change is one commit, so the history of the
//! store is the history of its secrets.

pub mod cipher;
pub mod config;
pub mod error;
pub mod fields;
pub mod record;
pub mod service;
pub mod store;
pub mod telemetry;
pub mod vcs;

// Re-export primary types
pub use cipher::{Cipher, CipherEngine, EngineOutput, GpgEngine, MemoryEngine, Recipient};
pub use config::Settings;
pub use error::{Result, StoreError};
pub use fields::FieldMap;
pub use record::RecordName;
pub use service::RecordService;
pub use store::{StoreState, VersionedStore, DEFAULT_COMMIT_MESSAGE};
pub use telemetry::{LogReporter, RecordingReporter, Reporter, SharedReporter};
pub use vcs::{CommitId, CommitInfo, GitEngine, VcsEngine};
