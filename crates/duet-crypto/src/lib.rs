//! Cryptographic primitives for Duet.
//!
//! Two peers agree on a key through a finite-field Diffie-Hellman exchange
//! whose domain parameters come from the relay. The raw shared secret is
//! expanded with HKDF-SHA256 into a symmetric key, and every chat message is
//! sealed with AES-GCM under that key.
//!
//! # Security
//!
//! The exchange is unauthenticated. The relay chooses `p` and `g` and both
//! peers trust them, so a malicious relay can sit in the middle. Nothing in
//! this crate tries to detect that.

pub mod cipher;
pub mod dh;
pub mod error;
pub mod kdf;
pub mod key;
mod primitive_root;

pub use cipher::{NONCE_LEN, TAG_LEN, decrypt, encrypt};
pub use dh::{
    DhEngine, DomainParameters, ParameterStrategy, PrivateSalt, compute_shared_secret,
    generate_private_salt, public_salt,
};
pub use error::{CipherError, DhError, KeyDerivationError};
pub use kdf::{KEY_LEN, derive_key, derive_key_with_len};
pub use key::SessionKey;
