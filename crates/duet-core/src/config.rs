//! Deployment settings.

use std::{
    net::{Ipv4Addr, SocketAddr},
    time::Duration,
};

use duet_proto::ControlCodec;

use crate::error::ConfigError;

/// Settings shared by the relay and its peers.
///
/// Relay and peers must agree on `separator` and `buffer_size`. The relay
/// alone uses `wait_timeout` and `modulus_bits`; peers alone use `key_len`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Relay listen address
    pub listen_addr: SocketAddr,
    /// Bytes read per transport read; one read is one message
    pub buffer_size: usize,
    /// Field separator in control messages
    pub separator: char,
    /// How long a first-to-arrive peer waits for its interlocutor
    pub wait_timeout: Duration,
    /// Diffie-Hellman modulus width
    pub modulus_bits: usize,
    /// Derived symmetric key length in bytes
    pub key_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            buffer_size: 4096,
            separator: ControlCodec::DEFAULT_SEPARATOR,
            wait_timeout: Duration::from_secs(60),
            modulus_bits: 2048,
            key_len: 32,
        }
    }
}

impl Config {
    /// Check values that would break the protocol at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_size == 0 {
            return Err(ConfigError::ZeroBuffer);
        }
        if self.wait_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.separator.is_alphanumeric() || self.separator.is_whitespace() {
            return Err(ConfigError::InvalidSeparator(self.separator));
        }
        if !matches!(self.key_len, 16 | 32) {
            return Err(ConfigError::InvalidKeyLength(self.key_len));
        }
        Ok(())
    }
}
