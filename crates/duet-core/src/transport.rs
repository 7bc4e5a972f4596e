//! Transport abstraction for the relay and its peers.
//!
//! Production uses TCP, tests use Turmoil (simulated TCP). Both hand out
//! byte streams; [`MessageStream`] turns one transport read into one message.
//!
//! NOTE: There is no application-level framing. A read returns whatever the
//! socket has buffered, up to the configured buffer size, so a message may
//! arrive split or coalesced with the next one. The protocol's lock-step
//! handshake keeps control messages apart in practice.

use std::{io, net::SocketAddr};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::TransportError;

/// Source of inbound connections.
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    /// Byte stream for one accepted connection.
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Accept an incoming connection.
    ///
    /// Blocks until a peer connects and returns the stream with the peer's
    /// address.
    async fn accept(&self) -> io::Result<(Self::Stream, SocketAddr)>;

    /// Address the listener is bound to.
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

#[async_trait]
impl Listener for tokio::net::TcpListener {
    type Stream = tokio::net::TcpStream;

    async fn accept(&self) -> io::Result<(Self::Stream, SocketAddr)> {
        tokio::net::TcpListener::accept(self).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        tokio::net::TcpListener::local_addr(self)
    }
}

/// Byte stream that reads and writes whole transport payloads.
#[derive(Debug)]
pub struct MessageStream<S> {
    inner: S,
    buffer: Vec<u8>,
    peer: SocketAddr,
}

impl<S> MessageStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a stream, reading at most `buffer_size` bytes per message.
    pub fn new(inner: S, peer: SocketAddr, buffer_size: usize) -> Self {
        Self { inner, buffer: vec![0u8; buffer_size], peer }
    }

    /// Remote address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Read one message.
    ///
    /// Cancel-safe: if the future is dropped before completing, no data has
    /// been consumed from the stream.
    ///
    /// # Errors
    ///
    /// `Closed` on end-of-stream, `Io` on any other read failure.
    pub async fn read_message(&mut self) -> Result<Bytes, TransportError> {
        let n = self.inner.read(&mut self.buffer).await?;
        if n == 0 {
            return Err(TransportError::Closed);
        }
        Ok(Bytes::copy_from_slice(&self.buffer[..n]))
    }

    /// Write one message and flush it.
    pub async fn write_message(&mut self, message: &[u8]) -> Result<(), TransportError> {
        self.inner.write_all(message).await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Shut down the write half.
    pub async fn shutdown(&mut self) -> Result<(), TransportError> {
        self.inner.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    fn addr() -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, 9))
    }

    #[tokio::test]
    async fn one_read_is_one_message() {
        let (a, b) = tokio::io::duplex(64);
        let mut left = MessageStream::new(a, addr(), 64);
        let mut right = MessageStream::new(b, addr(), 64);

        left.write_message(b"alice:bob").await.unwrap();
        assert_eq!(&right.read_message().await.unwrap()[..], b"alice:bob");
    }

    #[tokio::test]
    async fn read_is_capped_by_buffer() {
        let (a, b) = tokio::io::duplex(64);
        let mut left = MessageStream::new(a, addr(), 64);
        let mut right = MessageStream::new(b, addr(), 4);

        left.write_message(b"abcdefgh").await.unwrap();
        assert_eq!(&right.read_message().await.unwrap()[..], b"abcd");
        assert_eq!(&right.read_message().await.unwrap()[..], b"efgh");
    }

    #[tokio::test]
    async fn eof_is_closed() {
        let (a, b) = tokio::io::duplex(64);
        let mut right = MessageStream::new(b, addr(), 64);
        drop(a);

        assert!(matches!(right.read_message().await, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn tcp_listener_accepts() {
        let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let local = Listener::local_addr(&listener).unwrap();

        let connect = tokio::spawn(async move { tokio::net::TcpStream::connect(local).await });
        let (stream, peer) = Listener::accept(&listener).await.unwrap();
        let client = connect.await.unwrap().unwrap();

        assert_eq!(peer, client.local_addr().unwrap());
        drop(stream);
    }
}
