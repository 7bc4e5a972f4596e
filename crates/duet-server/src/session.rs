//! Relay-side session state.

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::{error::SyncError, pool::SessionInfo};

/// Buffering per direction. Enough for the parameters and the public salt to
/// queue up before the first peer's handler drains them.
pub const CHANNEL_CAPACITY: usize = 2;

/// One side's view of a cross-wired channel pair.
#[derive(Debug)]
pub struct PeerEnds {
    /// Messages from the partner's handler
    pub reader: mpsc::Receiver<Bytes>,
    /// Messages to the partner's handler
    pub writer: mpsc::Sender<Bytes>,
}

/// Allocate a cross-wired channel pair.
///
/// Whatever one side writes, the other side reads.
pub fn channel_pair(capacity: usize) -> (PeerEnds, PeerEnds) {
    let (a_tx, a_rx) = mpsc::channel(capacity);
    let (b_tx, b_rx) = mpsc::channel(capacity);
    (PeerEnds { reader: a_rx, writer: b_tx }, PeerEnds { reader: b_rx, writer: a_tx })
}

/// Per-connection state owned by exactly one handler.
///
/// Dropping the session (or calling [`ClientSession::close`]) closes the write
/// channel, which the partner's handler observes as "peer gone".
#[derive(Debug)]
pub struct ClientSession {
    info: SessionInfo,
    reader: mpsc::Receiver<Bytes>,
    writer: Option<mpsc::Sender<Bytes>>,
}

impl ClientSession {
    /// Bind a peer identity to its channel ends.
    pub fn new(info: SessionInfo, ends: PeerEnds) -> Self {
        Self { info, reader: ends.reader, writer: Some(ends.writer) }
    }

    /// Identity of the connected peer.
    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    /// Forward a message to the partner's handler.
    ///
    /// Waits while the partner's queue is full.
    pub async fn send(&self, message: Bytes) -> Result<(), SyncError> {
        let writer = self.writer.as_ref().ok_or(SyncError::PartnerGone)?;
        writer.send(message).await.map_err(|_| SyncError::PartnerGone)
    }

    /// Next message from the partner's handler, `None` once it is gone.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.reader.recv().await
    }

    /// Close the write channel. Idempotent.
    pub fn close(&mut self) {
        self.writer.take();
    }

    /// Whether [`ClientSession::close`] has run.
    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, SocketAddr};

    use super::*;

    fn info(name: &str, interlocutor: &str) -> SessionInfo {
        SessionInfo {
            address: SocketAddr::from((Ipv4Addr::LOCALHOST, 4000)),
            name: name.into(),
            interlocutor: interlocutor.into(),
        }
    }

    #[tokio::test]
    async fn pair_is_cross_wired() {
        let (a, b) = channel_pair(CHANNEL_CAPACITY);
        let mut alice = ClientSession::new(info("alice", "bob"), a);
        let mut bob = ClientSession::new(info("bob", "alice"), b);

        alice.send(Bytes::from_static(b"to bob")).await.unwrap();
        bob.send(Bytes::from_static(b"to alice")).await.unwrap();

        assert_eq!(bob.recv().await.unwrap(), Bytes::from_static(b"to bob"));
        assert_eq!(alice.recv().await.unwrap(), Bytes::from_static(b"to alice"));
    }

    #[tokio::test]
    async fn fifo_per_direction() {
        let (a, b) = channel_pair(CHANNEL_CAPACITY);
        let alice = ClientSession::new(info("alice", "bob"), a);
        let mut bob = ClientSession::new(info("bob", "alice"), b);

        alice.send(Bytes::from_static(b"1")).await.unwrap();
        alice.send(Bytes::from_static(b"2")).await.unwrap();

        assert_eq!(bob.recv().await.unwrap(), Bytes::from_static(b"1"));
        assert_eq!(bob.recv().await.unwrap(), Bytes::from_static(b"2"));
    }

    #[tokio::test]
    async fn close_signals_partner() {
        let (a, b) = channel_pair(CHANNEL_CAPACITY);
        let mut alice = ClientSession::new(info("alice", "bob"), a);
        let mut bob = ClientSession::new(info("bob", "alice"), b);

        alice.close();
        assert!(alice.is_closed());
        assert_eq!(bob.recv().await, None);
        assert_eq!(alice.send(Bytes::from_static(b"late")).await, Err(SyncError::PartnerGone));
    }

    #[tokio::test]
    async fn drop_signals_partner() {
        let (a, b) = channel_pair(CHANNEL_CAPACITY);
        let alice = ClientSession::new(info("alice", "bob"), a);
        let bob = ClientSession::new(info("bob", "alice"), b);

        drop(alice);
        assert_eq!(bob.send(Bytes::from_static(b"anyone?")).await, Err(SyncError::PartnerGone));
    }
}
