//! Error types for cryptographic operations.

use thiserror::Error;

/// AEAD failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    /// Key is neither 16 nor 32 bytes
    #[error("unsupported key length {0}, expected 16 or 32")]
    InvalidKeyLength(usize),

    /// Could not draw a nonce
    #[error("nonce generation failed: {0}")]
    Nonce(String),

    /// Sealing failed
    #[error("encryption failed")]
    Encrypt,

    /// Input shorter than nonce plus tag
    #[error("ciphertext too short: {0} bytes")]
    Truncated(usize),

    /// Authentication tag did not verify
    #[error("decryption failed: authentication tag mismatch")]
    Decrypt,
}

/// HKDF failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyDerivationError {
    /// Requested output length is not usable by HKDF-SHA256
    #[error("invalid derived key length {0}")]
    InvalidLength(usize),
}

/// Diffie-Hellman failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DhError {
    /// Randomness source failed
    #[error("randomness source failed: {0}")]
    Randomness(String),

    /// Bit length below what the strategy supports
    #[error("modulus of {bits} bits is below the minimum of {min}")]
    ModulusTooSmall {
        /// Requested width
        bits: usize,
        /// Smallest accepted width
        min: usize,
    },

    /// Bit length above what the strategy can handle
    #[error("modulus of {bits} bits is above the maximum of {max}")]
    ModulusTooLarge {
        /// Requested width
        bits: usize,
        /// Largest accepted width
        max: usize,
    },

    /// Modulus cannot host an exchange
    #[error("modulus must be greater than 3")]
    DegenerateModulus,

    /// Peer public salt outside `(1, p-1)`
    #[error("peer public salt out of range")]
    PublicSaltOutOfRange,

    /// No primitive root below the search limit
    #[error("no primitive root below {0}")]
    NoPrimitiveRoot(u32),
}
