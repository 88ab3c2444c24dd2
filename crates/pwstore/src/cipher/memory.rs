//! In-memory stand-in for the encryption engine.
//!
//! Produces an ASCII-armoured envelope that records the recipient and a
//! base64 payload. It is not encryption; it exists so the record store can
//! be exercised end to end without a keyring.
//!
//! ```text
//! -----BEGIN PWSTORE TEST MESSAGE-----
//! Recipient: alice@example.com
//!
//! eyJ1cmwiOiJleGFtcGxlLmNvbSJ9
//! -----END PWSTORE TEST MESSAGE-----
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use super::{CipherEngine, EngineOutput, Recipient};
use crate::error::Result;

const BEGIN: &str = "-----BEGIN PWSTORE TEST MESSAGE-----";
const END: &str = "-----END PWSTORE TEST MESSAGE-----";
const RECIPIENT_HEADER: &str = "Recipient: ";

/// Fake engine holding a set of usable keys. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    keys: Arc<Mutex<HashSet<Recipient>>>,
    fail_decrypt: Arc<AtomicBool>,
}

impl MemoryEngine {
    /// An engine holding key pairs for every recipient given.
    pub fn trusting(recipients: impl IntoIterator<Item = Recipient>) -> Self {
        let engine = Self::default();
        if let Ok(mut keys) = engine.keys.lock() {
            keys.extend(recipients);
        }
        engine
    }

    /// Drop the key pair for `recipient`; later encrypts for it and
    /// decrypts of messages addressed to it fail.
    pub fn forget(&self, recipient: &Recipient) {
        if let Ok(mut keys) = self.keys.lock() {
            keys.remove(recipient);
        }
    }

    /// Make every decrypt report failure while still handing back half of
    /// the recovered plaintext, as a misbehaving engine might.
    pub fn fail_decrypt_with_partial_output(&self, fail: bool) {
        self.fail_decrypt.store(fail, Ordering::SeqCst);
    }

    fn knows(&self, recipient: &Recipient) -> bool {
        self.keys
            .lock()
            .map(|keys| keys.contains(recipient))
            .unwrap_or(false)
    }
}

impl CipherEngine for MemoryEngine {
    fn encrypt(&self, plaintext: &[u8], recipient: &Recipient) -> Result<EngineOutput> {
        if !self.knows(recipient) {
            return Ok(EngineOutput::failure(
                format!("invalid recipient: {recipient}"),
                Vec::new(),
            ));
        }
        let armoured = format!(
            "{BEGIN}\n{RECIPIENT_HEADER}{recipient}\n\n{}\n{END}\n",
            STANDARD.encode(plaintext)
        );
        Ok(EngineOutput::success(armoured.into_bytes()))
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<EngineOutput> {
        let Some((recipient, payload)) = parse_envelope(ciphertext) else {
            return Ok(EngineOutput::failure("no valid OpenPGP data found", Vec::new()));
        };
        if !self.knows(&recipient) {
            return Ok(EngineOutput::failure("decryption failed: No secret key", Vec::new()));
        }
        let Ok(plaintext) = STANDARD.decode(payload) else {
            return Ok(EngineOutput::failure("decryption failed: bad data", Vec::new()));
        };
        if self.fail_decrypt.load(Ordering::SeqCst) {
            let half = plaintext[..plaintext.len() / 2].to_vec();
            return Ok(EngineOutput::failure("decryption failed: bad session key", half));
        }
        Ok(EngineOutput::success(plaintext))
    }
}

fn parse_envelope(ciphertext: &[u8]) -> Option<(Recipient, String)> {
    let text = std::str::from_utf8(ciphertext).ok()?;
    let mut lines = text.lines();
    if lines.next()? != BEGIN {
        return None;
    }
    let recipient = lines.next()?.strip_prefix(RECIPIENT_HEADER)?;
    if !lines.next()?.is_empty() {
        return None;
    }
    let payload = lines.next()?;
    if lines.next()? != END {
        return None;
    }
    Some((Recipient::new(recipient), payload.to_string()))
}
