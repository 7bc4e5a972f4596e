//! AES-GCM sealing of chat payloads.
//!
//! Wire layout of a sealed payload:
//!
//! ```text
//! ┌──────────────┬──────────────────────────────┐
//! │ nonce (12 B) │ ciphertext ‖ tag (16 B)      │
//! └──────────────┴──────────────────────────────┘
//! ```
//!
//! A fresh random nonce is drawn for every call and no associated data is
//! bound. The key length picks the cipher: 32 bytes is AES-256-GCM, 16 bytes
//! is AES-128-GCM.

use aes_gcm::{
    Aes128Gcm, Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use rand::{RngCore, rngs::OsRng};

use crate::error::CipherError;

/// GCM standard nonce size.
pub const NONCE_LEN: usize = 12;

/// GCM authentication tag size.
pub const TAG_LEN: usize = 16;

enum Engine {
    Aes128(Box<Aes128Gcm>),
    Aes256(Box<Aes256Gcm>),
}

impl Engine {
    fn new(key: &[u8]) -> Result<Self, CipherError> {
        let invalid = |_| CipherError::InvalidKeyLength(key.len());
        match key.len() {
            16 => Aes128Gcm::new_from_slice(key)
                .map(|c| Self::Aes128(Box::new(c)))
                .map_err(invalid),
            32 => Aes256Gcm::new_from_slice(key)
                .map(|c| Self::Aes256(Box::new(c)))
                .map_err(invalid),
            other => Err(CipherError::InvalidKeyLength(other)),
        }
    }
}

/// Seal `plaintext` under `key`, returning `nonce ‖ ciphertext ‖ tag`.
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>, CipherError> {
    let engine = Engine::new(key)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.try_fill_bytes(&mut nonce_bytes).map_err(|e| CipherError::Nonce(e.to_string()))?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    let sealed = match engine {
        Engine::Aes128(cipher) => cipher.encrypt(nonce, plaintext),
        Engine::Aes256(cipher) => cipher.encrypt(nonce, plaintext),
    }
    .map_err(|_| CipherError::Encrypt)?;

    let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Open a payload produced by [`encrypt`].
///
/// Fails on truncation, tampering, or a wrong key. Never returns unverified
/// plaintext.
pub fn decrypt(ciphertext: &[u8], key: &[u8]) -> Result<Vec<u8>, CipherError> {
    let engine = Engine::new(key)?;

    if ciphertext.len() < NONCE_LEN + TAG_LEN {
        return Err(CipherError::Truncated(ciphertext.len()));
    }
    let (nonce_bytes, sealed) = ciphertext.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    match engine {
        Engine::Aes128(cipher) => cipher.decrypt(nonce, sealed),
        Engine::Aes256(cipher) => cipher.decrypt(nonce, sealed),
    }
    .map_err(|_| CipherError::Decrypt)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [7u8; 32];

    #[test]
    fn roundtrip() {
        let sealed = encrypt(b"hello bob", &KEY).unwrap();
        assert_eq!(decrypt(&sealed, &KEY).unwrap(), b"hello bob");
    }

    #[test]
    fn output_layout() {
        let sealed = encrypt(b"abc", &KEY).unwrap();
        assert_eq!(sealed.len(), NONCE_LEN + 3 + TAG_LEN);
    }

    #[test]
    fn fresh_nonce_per_call() {
        let a = encrypt(b"same", &KEY).unwrap();
        let b = encrypt(b"same", &KEY).unwrap();
        assert_ne!(a[..NONCE_LEN], b[..NONCE_LEN]);
        assert_ne!(a, b);
    }

    #[test]
    fn aes128_key() {
        let key = [3u8; 16];
        let sealed = encrypt(b"short key", &key).unwrap();
        assert_eq!(decrypt(&sealed, &key).unwrap(), b"short key");
    }

    #[test]
    fn rejects_bad_key_length() {
        assert_eq!(encrypt(b"x", &[0u8; 24]), Err(CipherError::InvalidKeyLength(24)));
        assert_eq!(decrypt(&[0u8; 64], &[0u8; 5]), Err(CipherError::InvalidKeyLength(5)));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let mut sealed = encrypt(b"do not touch", &KEY).unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert_eq!(decrypt(&sealed, &KEY), Err(CipherError::Decrypt));
    }

    #[test]
    fn tampered_nonce_fails() {
        let mut sealed = encrypt(b"do not touch", &KEY).unwrap();
        sealed[0] ^= 0x80;
        assert_eq!(decrypt(&sealed, &KEY), Err(CipherError::Decrypt));
    }

    #[test]
    fn truncated_input_fails() {
        let sealed = encrypt(b"payload", &KEY).unwrap();
        assert_eq!(decrypt(&sealed[..NONCE_LEN + 4], &KEY), Err(CipherError::Truncated(16)));
        assert_eq!(decrypt(&[], &KEY), Err(CipherError::Truncated(0)));
    }

    #[test]
    fn empty_plaintext() {
        let sealed = encrypt(b"", &KEY).unwrap();
        assert_eq!(decrypt(&sealed, &KEY).unwrap(), b"");
    }
}
