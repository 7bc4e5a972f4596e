//! Shared plumbing for the Duet relay and its peers.
//!
//! # Components
//!
//! - [`transport`]: Listener abstraction and fixed-buffer message stream
//! - [`config`]: Deployment settings shared by relay and peers
//! - [`error`]: Transport and configuration errors

pub mod config;
pub mod error;
pub mod transport;

pub use config::Config;
pub use error::{ConfigError, TransportError};
pub use transport::{Listener, MessageStream};
