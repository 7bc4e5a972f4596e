//! Shared-secret expansion.
//!
//! HKDF-SHA256 with no salt and no info bytes. Both peers feed in the same
//! big-endian shared secret and get byte-identical keys back without any
//! further round trip.

use hkdf::Hkdf;
use num_bigint::BigUint;
use sha2::Sha256;

use crate::{error::KeyDerivationError, key::SessionKey};

/// Default derived key length (AES-256).
pub const KEY_LEN: usize = 32;

/// Derive a [`KEY_LEN`]-byte key from a raw Diffie-Hellman shared secret.
pub fn derive_key(shared_secret: &BigUint) -> Result<SessionKey, KeyDerivationError> {
    derive_key_with_len(shared_secret, KEY_LEN)
}

/// Derive a key of `len` bytes from a raw Diffie-Hellman shared secret.
pub fn derive_key_with_len(
    shared_secret: &BigUint,
    len: usize,
) -> Result<SessionKey, KeyDerivationError> {
    if len == 0 {
        return Err(KeyDerivationError::InvalidLength(len));
    }

    let ikm = shared_secret.to_bytes_be();
    let hk = Hkdf::<Sha256>::new(None, &ikm);

    let mut okm = vec![0u8; len];
    hk.expand(&[], &mut okm).map_err(|_| KeyDerivationError::InvalidLength(len))?;

    Ok(SessionKey::from_bytes(okm))
}
