//! Peer registration.

/// First message a peer sends: who it is and who it wants to talk to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Registration {
    /// Name the peer registers under
    pub name: String,
    /// Name of the peer it wants to be paired with
    pub interlocutor: String,
}

impl Registration {
    /// Create a registration.
    pub fn new(name: impl Into<String>, interlocutor: impl Into<String>) -> Self {
        Self { name: name.into(), interlocutor: interlocutor.into() }
    }
}
