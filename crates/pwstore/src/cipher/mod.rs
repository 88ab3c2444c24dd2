//! Cipher boundary — the only place plaintext crosses into ciphertext.
//!
//! The actual encryption is done by an external engine behind the
//! [`CipherEngine`] capability:
//! - [`gpg::GpgEngine`] — the `gpg` binary, used in production.
//! - [`memory::MemoryEngine`] — an in-memory fake for tests.
//!
//! [`Cipher`] wraps an engine and turns its status reports into typed
//! errors. A failed report never yields bytes: whatever partial output the
//! engine produced is scrubbed before the error is returned.

pub mod gpg;
pub mod memory;

use std::fmt;

use zeroize::{Zeroize, Zeroizing};

use crate::error::{Result, StoreError};

pub use gpg::GpgEngine;
pub use memory::MemoryEngine;

// ── Recipient ─────────────────────────────────────────────────────────────────

/// Identity that records are encrypted for (a key id, fingerprint or email).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Recipient(String);

impl Recipient {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Engine capability ─────────────────────────────────────────────────────────

/// What an engine reports back for a single operation.
pub struct EngineOutput {
    /// Whether the engine considers the operation successful.
    pub ok: bool,
    /// Engine status line, suitable for an error message.
    pub status: String,
    /// Produced bytes. May be partial when `ok` is false.
    pub data: Vec<u8>,
}

impl EngineOutput {
    pub fn success(data: Vec<u8>) -> Self {
        Self {
            ok: true,
            status: "ok".to_string(),
            data,
        }
    }

    pub fn failure(status: impl Into<String>, partial: Vec<u8>) -> Self {
        Self {
            ok: false,
            status: status.into(),
            data: partial,
        }
    }
}

impl fmt::Debug for EngineOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineOutput")
            .field("ok", &self.ok)
            .field("status", &self.status)
            .field("data_len", &self.data.len())
            .finish()
    }
}

/// External encryption capability.
///
/// Implementations report engine-level failures through
/// [`EngineOutput::ok`]; an `Err` return is reserved for failures to reach
/// the engine at all (e.g. the binary is missing).
pub trait CipherEngine {
    fn encrypt(&self, plaintext: &[u8], recipient: &Recipient) -> Result<EngineOutput>;
    fn decrypt(&self, ciphertext: &[u8]) -> Result<EngineOutput>;
}

// ── Boundary ──────────────────────────────────────────────────────────────────

/// Status-checking wrapper around a [`CipherEngine`].
pub struct Cipher<E> {
    engine: E,
}

impl<E: CipherEngine> Cipher<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Encrypt `plaintext` for `recipient`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Encryption` with the engine status if the engine
    /// reports failure (e.g. the recipient key is missing or untrusted).
    pub fn encrypt(&self, plaintext: &[u8], recipient: &Recipient) -> Result<Vec<u8>> {
        let mut output = self.engine.encrypt(plaintext, recipient)?;
        if !output.ok {
            output.data.zeroize();
            return Err(StoreError::Encryption(output.status));
        }
        Ok(output.data)
    }

    /// Decrypt `ciphertext`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Decryption` with the engine status if the engine
    /// reports failure (missing private key, corrupted input, passphrase
    /// unavailable). Partial plaintext is scrubbed, never returned.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let mut output = self.engine.decrypt(ciphertext)?;
        if !output.ok {
            output.data.zeroize();
            return Err(StoreError::Decryption(output.status));
        }
        Ok(Zeroizing::new(output.data))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
