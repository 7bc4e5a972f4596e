//! Encrypted chat over an established pairing.

use duet_core::{MessageStream, TransportError};
use duet_crypto::{SessionKey, decrypt, encrypt};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::ClientError;

/// Chat session sealed with the handshake key.
///
/// Each `send` is one AES-GCM ciphertext and one transport write. The relay
/// forwards ciphertexts verbatim.
#[derive(Debug)]
pub struct SecureChannel<S> {
    stream: MessageStream<S>,
    key: SessionKey,
}

impl<S> SecureChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a paired stream with its session key.
    pub fn new(stream: MessageStream<S>, key: SessionKey) -> Self {
        Self { stream, key }
    }

    /// Session key, for comparing both ends in tests.
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Encrypt and send one message.
    pub async fn send(&mut self, plaintext: &[u8]) -> Result<(), ClientError> {
        let sealed = encrypt(plaintext, self.key.as_bytes())?;
        self.stream.write_message(&sealed).await?;
        Ok(())
    }

    /// Receive and decrypt one message.
    ///
    /// Returns `None` once the relay closes the connection. A message that
    /// fails authentication is an error; the channel should be dropped.
    ///
    /// Cancel-safe, so it can sit in a `select!` next to a stdin reader.
    pub async fn recv(&mut self) -> Result<Option<Vec<u8>>, ClientError> {
        let sealed = match self.stream.read_message().await {
            Ok(sealed) => sealed,
            Err(TransportError::Closed) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(decrypt(&sealed, self.key.as_bytes())?))
    }

    /// Close the write half so the relay sees end-of-stream.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.stream.shutdown().await?;
        Ok(())
    }
}
