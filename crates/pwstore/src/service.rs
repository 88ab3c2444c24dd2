//! Record service — the operations the CLI dispatches to.
//!
//! Each mutating operation runs the same sequence:
//!
//! 1. resolve the recipient (configuration errors stop here, before I/O)
//! 2. read and decrypt the current record, if there is one
//! 3. edit the [`FieldMap`]
//! 4. encrypt the new plaintext
//! 5. write the ciphertext atomically
//! 6. commit exactly that file
//!
//! Plaintext never reaches the disk, and nothing is written or committed
//! unless encryption already succeeded. The field map lives only for the
//! duration of one call.

use log::Level;
use zeroize::Zeroizing;

use crate::cipher::{Cipher, CipherEngine, Recipient};
use crate::config::require_recipient;
use crate::error::{Result, StoreError};
use crate::fields::FieldMap;
use crate::record::RecordName;
use crate::store::{VersionedStore, DEFAULT_COMMIT_MESSAGE};
use crate::telemetry::SharedReporter;
use crate::vcs::{CommitId, CommitInfo, VcsEngine};

/// Encrypted, versioned record operations over one store root.
pub struct RecordService<E, V> {
    cipher: Cipher<E>,
    store: VersionedStore<V>,
    recipient: Option<Recipient>,
    reporter: SharedReporter,
}

impl<E: CipherEngine, V: VcsEngine> RecordService<E, V> {
    pub fn new(
        cipher: Cipher<E>,
        store: VersionedStore<V>,
        recipient: Option<Recipient>,
        reporter: SharedReporter,
    ) -> Self {
        Self {
            cipher,
            store,
            recipient,
            reporter,
        }
    }

    /// Open a service, initializing the store root if needed.
    pub fn open(
        cipher: Cipher<E>,
        store: VersionedStore<V>,
        recipient: Option<Recipient>,
        reporter: SharedReporter,
    ) -> Result<Self> {
        store.ensure_initialized()?;
        Ok(Self::new(cipher, store, recipient, reporter))
    }

    pub fn store(&self) -> &VersionedStore<V> {
        &self.store
    }

    pub fn cipher(&self) -> &Cipher<E> {
        &self.cipher
    }

    // ── Operations ────────────────────────────────────────────────────────────

    /// Create an empty record.
    ///
    /// # Errors
    ///
    /// `Configuration` without a recipient, `AlreadyExists` if the record
    /// file (or an alias by that name) is present. Neither writes anything.
    pub fn create(&self, name: &str) -> Result<CommitId> {
        let name = RecordName::new(name)?;
        let recipient = self.find_recipient()?;
        let path = self.store.record_path(&name);

        if self.store.exists(&path) {
            self.reporter.report(
                Level::Error,
                "Record title already exists. Nothing was done.",
            );
            return Err(StoreError::AlreadyExists(name.file_name()));
        }

        let plaintext = Zeroizing::new(FieldMap::new().serialize().into_bytes());
        let ciphertext = self.cipher.encrypt(&plaintext, &recipient)?;
        let written = self.store.write_raw(&path, &ciphertext)?;
        self.store.stage_and_commit(
            &[&written],
            &format!("Created empty record {}", name.file_name()),
        )
    }

    /// Field names of a record, sorted.
    pub fn list(&self, name: &str) -> Result<Vec<String>> {
        let name = RecordName::new(name)?;
        Ok(self.load(&name)?.list_keys())
    }

    /// Value of one field.
    pub fn get(&self, name: &str, key: &str) -> Result<Zeroizing<String>> {
        let name = RecordName::new(name)?;
        let fields = self.load(&name)?;
        Ok(Zeroizing::new(fields.get(key)?.to_string()))
    }

    /// Set one field and commit.
    pub fn update(&self, name: &str, key: &str, value: &str) -> Result<CommitId> {
        let name = RecordName::new(name)?;
        let recipient = self.find_recipient()?;
        let mut fields = self.load(&name)?;
        fields.set(key, value);
        self.save(&name, &fields, &recipient, DEFAULT_COMMIT_MESSAGE)
    }

    /// Remove one field and commit.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` if the field is absent; nothing is written.
    pub fn delete(&self, name: &str, key: &str) -> Result<CommitId> {
        let name = RecordName::new(name)?;
        let recipient = self.find_recipient()?;
        let mut fields = self.load(&name)?;
        fields.remove(key)?;
        self.save(&name, &fields, &recipient, DEFAULT_COMMIT_MESSAGE)
    }

    /// `drop`: remove a whole record (or an alias link) from disk and from
    /// the tracked tree.
    ///
    /// # Errors
    ///
    /// `NotFound` if the record is absent. `Aliased` if any alias still
    /// points at it; drop the aliases first.
    pub fn drop_record(&self, name: &str) -> Result<CommitId> {
        let name = RecordName::new(name)?;
        let path = self.store.record_path(&name);

        if !self.store.exists(&path) {
            self.reporter.report(
                Level::Error,
                "Record title does not exist. Nothing was done.",
            );
            return Err(StoreError::NotFound(name.file_name()));
        }

        let aliases = self.store.aliases_of(&name)?;
        if !aliases.is_empty() {
            return Err(StoreError::Aliased {
                record: name.to_string(),
                aliases: aliases.iter().map(ToString::to_string).collect(),
            });
        }

        self.store.remove_and_commit(
            &path,
            &format!("Dropped record {} from password store.", name.file_name()),
        )
    }

    /// Make `alias` another name for `name`.
    ///
    /// # Errors
    ///
    /// `NotFound` if the record is absent, `AlreadyExists` if the alias
    /// name is taken.
    pub fn alias(&self, name: &str, alias: &str) -> Result<CommitId> {
        let name = RecordName::new(name)?;
        let alias = RecordName::new(alias)?;
        let target = self.store.record_path(&name);
        let link = self.store.record_path(&alias);

        if !target.exists() {
            return Err(StoreError::NotFound(name.file_name()));
        }
        if self.store.exists(&link) {
            return Err(StoreError::AlreadyExists(alias.file_name()));
        }

        self.store
            .link_and_commit(&target, &link, DEFAULT_COMMIT_MESSAGE)
    }

    /// The whole record, pretty-printed.
    pub fn select(&self, name: &str) -> Result<Zeroizing<String>> {
        let name = RecordName::new(name)?;
        Ok(Zeroizing::new(self.load(&name)?.pretty()))
    }

    /// Record names containing `fragment`, case-insensitively.
    pub fn search(&self, fragment: &str) -> Result<Vec<RecordName>> {
        self.store.search(fragment)
    }

    /// Most recent commits in the store, newest first.
    pub fn history(&self, limit: usize) -> Result<Vec<CommitInfo>> {
        self.store.history(limit)
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn find_recipient(&self) -> Result<Recipient> {
        let recipient = require_recipient(self.recipient.as_ref())?;
        self.reporter
            .report(Level::Debug, &format!("Recipient key is: {recipient}"));
        Ok(recipient)
    }

    fn load(&self, name: &RecordName) -> Result<FieldMap> {
        let path = self.store.record_path(name);
        let ciphertext = self.store.read_raw(&path)?;
        let plaintext = self.cipher.decrypt(&ciphertext).inspect_err(|e| {
            self.reporter.report(Level::Error, &e.to_string());
        })?;
        FieldMap::parse_bytes(&plaintext)
    }

    fn save(
        &self,
        name: &RecordName,
        fields: &FieldMap,
        recipient: &Recipient,
        message: &str,
    ) -> Result<CommitId> {
        let plaintext = Zeroizing::new(fields.serialize().into_bytes());
        let ciphertext = self.cipher.encrypt(&plaintext, recipient).inspect_err(|e| {
            self.reporter.report(Level::Error, &e.to_string());
        })?;
        let written = self
            .store
            .write_raw(&self.store.record_path(name), &ciphertext)?;
        self.store.stage_and_commit(&[&written], message)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
