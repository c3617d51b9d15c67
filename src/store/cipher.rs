//! Reversible value obfuscation for the credential store.
//!
//! Values are encrypted with ChaCha20-Poly1305 under a key compiled into
//! the binary, with a random nonce prepended, and base64-encoded. Because
//! the key ships with the client this is OBFUSCATION ONLY: anyone holding
//! the binary can recover stored values. It keeps tokens out of casual
//! `grep` reach and nothing more — do not treat it as a security boundary.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;

const OBFUSCATION_KEY: &[u8; 32] = b"adspay-dashboard-local-obfuscate";

const NONCE_LEN: usize = 12;

/// Obfuscate a value for storage. Returns `None` only if the cipher
/// rejects the input, which does not happen for any realistic value size.
pub(crate) fn seal(value: &str) -> Option<String> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(OBFUSCATION_KEY));
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);

    let ciphertext = cipher.encrypt(Nonce::from_slice(&nonce), value.as_bytes()).ok()?;
    let mut sealed = nonce.to_vec();
    sealed.extend_from_slice(&ciphertext);
    Some(STANDARD.encode(sealed))
}

/// Recover a previously sealed value. Any malformed, truncated, or
/// tampered input yields `None` — callers treat corruption as absence.
pub(crate) fn open(stored: &str) -> Option<String> {
    let bytes = STANDARD.decode(stored).ok()?;
    if bytes.len() <= NONCE_LEN {
        return None;
    }
    let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);

    let cipher = ChaCha20Poly1305::new(Key::from_slice(OBFUSCATION_KEY));
    let plaintext = cipher.decrypt(Nonce::from_slice(nonce), ciphertext).ok()?;
    String::from_utf8(plaintext).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_then_open_round_trips() {
        let sealed = seal("a-token-value").unwrap();
        assert_ne!(sealed, "a-token-value");
        assert_eq!(open(&sealed).as_deref(), Some("a-token-value"));
    }

    #[test]
    fn sealing_twice_yields_distinct_ciphertexts() {
        // Random nonce: identical plaintexts must not produce identical
        // stored values.
        let first = seal("same").unwrap();
        let second = seal("same").unwrap();
        assert_ne!(first, second);
        assert_eq!(open(&first).as_deref(), Some("same"));
        assert_eq!(open(&second).as_deref(), Some("same"));
    }

    #[test]
    fn open_rejects_non_base64() {
        assert!(open("not base64 at all!!!").is_none());
    }

    #[test]
    fn open_rejects_truncated_input() {
        assert!(open(&STANDARD.encode([0u8; 4])).is_none());
        assert!(open("").is_none());
    }

    #[test]
    fn open_rejects_tampered_ciphertext() {
        let sealed = seal("value").unwrap();
        let mut bytes = STANDARD.decode(&sealed).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        assert!(open(&STANDARD.encode(bytes)).is_none());
    }

    #[test]
    fn empty_value_round_trips() {
        let sealed = seal("").unwrap();
        assert_eq!(open(&sealed).as_deref(), Some(""));
    }
}
