//! Relay-to-peer control messages.

/// Name already waiting in the pool; the connection will close.
pub const CLIENT_EXISTS: &str = "CLIENT_EXISTS";

/// Parked in the waiting pool.
pub const NO_INTERLOCUTOR: &str = "NO_INTERLOCUTOR";

/// Paired; carries the Diffie-Hellman domain parameters.
pub const INTERLOCUTOR_FOUND: &str = "INTERLOCUTOR_FOUND";

/// Nobody showed up before the wait timeout.
pub const INTERLOCUTOR_WAIT_TIMEOUT: &str = "INTERLOCUTOR_WAIT_TIMEOUT";

/// Handshake confirmation; carries the partner's public salt.
pub const CHAT_CONFIRMED: &str = "CHAT_CONFIRMED";

/// A control message sent by the relay to a peer.
///
/// Numeric fields stay in their decimal wire form. The proto layer only checks
/// that they are well-formed integers; turning them into big integers is the
/// handshake's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Name is already registered
    ClientExists,

    /// Waiting for the interlocutor
    NoInterlocutor,

    /// Interlocutor found
    InterlocutorFound {
        /// Prime modulus, decimal
        p: String,
        /// Generator, decimal
        g: String,
    },

    /// Interlocutor did not arrive in time
    WaitTimeout,

    /// Partner's public salt, relayed after both sides sent theirs
    ChatConfirmed {
        /// Partner's public salt, decimal
        peer_salt: String,
    },
}

impl ServerMessage {
    /// Leading token identifying this message on the wire.
    pub fn token(&self) -> &'static str {
        match self {
            Self::ClientExists => CLIENT_EXISTS,
            Self::NoInterlocutor => NO_INTERLOCUTOR,
            Self::InterlocutorFound { .. } => INTERLOCUTOR_FOUND,
            Self::WaitTimeout => INTERLOCUTOR_WAIT_TIMEOUT,
            Self::ChatConfirmed { .. } => CHAT_CONFIRMED,
        }
    }
}
