//! Error types for the peer side.

use duet_core::{ConfigError, TransportError};
use duet_crypto::{CipherError, DhError, KeyDerivationError};
use duet_proto::ProtocolError;
use thiserror::Error;

use crate::handshake::HandshakeState;

/// Handshake failure.
///
/// Any of these ends the handshake; the connection cannot be reused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandshakeError {
    /// Relay sent a malformed control message
    #[error("malformed control message: {0}")]
    Protocol(#[from] ProtocolError),

    /// Parameters or partner salt failed validation
    #[error("key exchange: {0}")]
    Dh(#[from] DhError),

    /// Key expansion failed
    #[error("key derivation: {0}")]
    KeyDerivation(#[from] KeyDerivationError),

    /// Control message that makes no sense in the current state
    #[error("unexpected {token} while {state:?}")]
    UnexpectedMessage {
        /// State the handshake was in
        state: HandshakeState,
        /// Token that arrived
        token: &'static str,
    },

    /// Input after the handshake already finished
    #[error("handshake already finished ({0:?})")]
    Finished(HandshakeState),
}

/// Failure of a peer connection.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Settings rejected before connecting
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    /// Socket failed or the relay hung up
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Pairing or key exchange failed
    #[error("handshake: {0}")]
    Handshake(#[from] HandshakeError),

    /// Chat payload could not be sealed or opened
    ///
    /// Fatal: a session whose ciphertext fails authentication is not resumed.
    #[error("cipher: {0}")]
    Cipher(#[from] CipherError),
}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        Self::Transport(TransportError::Io(e))
    }
}
