//! Peer side of the Duet rendezvous protocol.
//!
//! A peer registers with the relay under its own name and the name of the peer
//! it wants to talk to. Once the relay pairs them, both sides run the same
//! Diffie-Hellman exchange over the relay and end up with the same session
//! key. After that every chat message is sealed with AES-GCM before it leaves
//! the peer, so the relay only ever forwards ciphertext.
//!
//! # Components
//!
//! - [`handshake`]: Action-based handshake state machine (no I/O)
//! - [`client`]: Async driver running the handshake over a stream
//! - [`channel`]: Encrypted chat once the key is agreed
//! - [`error`]: Handshake and connection errors

pub mod channel;
pub mod client;
pub mod error;
pub mod handshake;

pub use channel::SecureChannel;
pub use client::{Client, PairingOutcome, Registered};
pub use error::{ClientError, HandshakeError};
pub use handshake::{HandshakeAction, HandshakeState, PeerHandshake};
