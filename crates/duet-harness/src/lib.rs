//! Deterministic simulation harness for the Duet relay.
//!
//! Turmoil-backed implementation of the [`duet_core::Listener`] seam, plus
//! helpers to run a relay host and connect peers inside a simulation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod sim_listener;
pub mod sim_peer;

pub use sim_listener::{RELAY_PORT, SimListener, serve};
pub use sim_peer::connect;
