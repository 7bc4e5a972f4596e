//! Duet rendezvous relay.
//!
//! Pairs two named peers, hands them Diffie-Hellman domain parameters, swaps
//! their public salts, then blindly forwards their encrypted traffic. The
//! relay never holds key material and never decrypts a payload.
//!
//! # Architecture
//!
//! One task per accepted connection. Two paired tasks never share a session
//! object: each owns a receiver and a sender of a cross-wired channel pair,
//! and that pair is their only coupling. Dropping a sender is how a task tells
//! its partner it is gone.
//!
//! ```text
//!  alice ──socket──> [handler A] ──writer──> (chan) ──reader──> [handler B] ──socket──> bob
//!  alice <──socket── [handler A] <──reader── (chan) <──writer── [handler B] <──socket── bob
//! ```
//!
//! The [`WaitingPool`] is the only state touched by more than one task. Its
//! lock is held for map operations only, never across an await.
//!
//! # Components
//!
//! - [`WaitingPool`]: name -> parked session registry
//! - [`ClientSession`]: per-connection identity and channel ends
//! - [`Server`]: accept loop and per-connection handler

mod error;
mod handler;
mod pool;
mod relay;
mod server;
mod session;
mod sync;

pub use error::{ConnectionError, ServerError, SyncError};
pub use handler::ConnectionOutcome;
pub use pool::{Removal, SessionInfo, WaitingPool};
pub use server::{Server, ServerContext};
pub use session::{CHANNEL_CAPACITY, ClientSession, PeerEnds, channel_pair};
