//! Error types for transport and configuration.

use std::io;

use thiserror::Error;

/// Transport failure on a single connection.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Peer closed its side of the stream
    #[error("connection closed by peer")]
    Closed,

    /// Read or write failed
    #[error("transport I/O: {0}")]
    Io(#[from] io::Error),
}

impl TransportError {
    /// Whether a retry on the same connection could succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Closed => false,
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),
        }
    }
}

/// Rejected configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Read buffer cannot be empty
    #[error("buffer size must be non-zero")]
    ZeroBuffer,

    /// Wait timeout cannot be zero
    #[error("wait timeout must be non-zero")]
    ZeroTimeout,

    /// Separator would collide with names or decimal fields
    #[error("separator {0:?} must not be alphanumeric or whitespace")]
    InvalidSeparator(char),

    /// Key length without a matching AES variant
    #[error("key length {0} is not 16 or 32")]
    InvalidKeyLength(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_kinds() {
        assert!(TransportError::Io(io::ErrorKind::Interrupted.into()).is_recoverable());
        assert!(TransportError::Io(io::ErrorKind::TimedOut.into()).is_recoverable());
        assert!(!TransportError::Io(io::ErrorKind::ConnectionReset.into()).is_recoverable());
        assert!(!TransportError::Closed.is_recoverable());
    }
}
