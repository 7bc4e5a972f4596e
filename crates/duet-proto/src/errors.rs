//! Error types for control message parsing.

use thiserror::Error;

/// Result alias for protocol parsing.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Malformed control traffic.
///
/// Every variant aborts the single connection that produced it. None of them
/// is ever reported back to the peer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Payload is not valid UTF-8
    #[error("payload is not valid UTF-8")]
    InvalidUtf8,

    /// Compound message lacks the field separator
    #[error("missing field separator {0:?}")]
    MissingSeparator(char),

    /// A required field is empty
    #[error("empty {0} field")]
    EmptyField(&'static str),

    /// Wrong number of separator-joined fields
    #[error("expected {expected} fields, got {actual}")]
    FieldCount {
        /// Fields the message kind requires
        expected: usize,
        /// Fields actually present
        actual: usize,
    },

    /// A peer asked to be paired with itself
    #[error("peer {0:?} cannot pair with itself")]
    SelfPairing(String),

    /// Leading token is not part of the vocabulary
    #[error("unexpected control token {0:?}")]
    UnexpectedToken(String),

    /// A numeric field is not a non-negative decimal integer
    #[error("{field} is not a decimal integer")]
    InvalidInteger {
        /// Name of the offending field
        field: &'static str,
    },
}
