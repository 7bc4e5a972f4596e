//! Wire vocabulary for the Duet rendezvous protocol.
//!
//! Every message is a single transport payload. Control messages are ASCII
//! tokens, optionally followed by fields joined with a configurable separator
//! character. After the handshake the relay carries opaque ciphertext that
//! this crate never inspects.
//!
//! ```text
//! peer  -> relay   alice:bob                       registration
//! relay -> peer    NO_INTERLOCUTOR                 parked
//! relay -> peer    INTERLOCUTOR_FOUND:<p>:<g>      paired, DH parameters
//! peer  -> relay   <public salt>                   forwarded verbatim
//! relay -> peer    CHAT_CONFIRMED:<peer salt>      handshake confirmation
//! ```
//!
//! There is no framing beyond one transport read. A payload that arrives
//! split or coalesced with its neighbour will fail to parse.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod control;
pub mod errors;
pub mod registration;

pub use codec::ControlCodec;
pub use control::ServerMessage;
pub use errors::{ProtocolError, Result};
pub use registration::Registration;
