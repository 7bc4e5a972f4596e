//! Relay error types.

use duet_core::{ConfigError, TransportError};
use duet_crypto::DhError;
use duet_proto::ProtocolError;
use thiserror::Error;

/// Failure while bridging the handshake between two handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Partner's handler exited and closed its channel
    #[error("partner disconnected")]
    PartnerGone,
}

/// Failure that ends a single connection handler.
///
/// Scoped to the connection that hit it; the accept loop logs it and keeps
/// serving.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Socket read or write failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Registration was malformed
    #[error("malformed registration: {0}")]
    Protocol(#[from] ProtocolError),

    /// Partner vanished mid-handshake or mid-relay
    #[error("synchronization failed: {0}")]
    Sync(#[from] SyncError),

    /// Domain parameters could not be generated
    #[error("domain parameter generation failed: {0}")]
    Parameters(#[from] DhError),
}

impl ConnectionError {
    /// Whether this is an expected way for a connection to end.
    ///
    /// A vanished partner or a peer hanging up is routine and logged quietly.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::Sync(SyncError::PartnerGone) | Self::Transport(TransportError::Closed))
    }
}

/// Failure constructing the relay.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Rejected configuration
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Parameter generator rejected the configured width
    #[error("invalid Diffie-Hellman settings: {0}")]
    Dh(#[from] DhError),

    /// Could not bind or inspect the listener
    #[error("listener: {0}")]
    Io(#[from] std::io::Error),
}
