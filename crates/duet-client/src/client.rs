//! Async driver for the peer handshake.
//!
//! Pairing happens in two steps so callers can observe being parked:
//!
//! 1. [`Client::register`] sends the registration and reads the relay's first
//!    verdict ([`Registered`]).
//! 2. [`Client::establish`] reads until the handshake finishes and yields a
//!    [`PairingOutcome`].
//!
//! [`Client::pair`] runs both.

use std::net::SocketAddr;

use duet_core::{Config, MessageStream};
use duet_crypto::SessionKey;
use duet_proto::{ControlCodec, Registration};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
};
use tracing::{debug, info};

use crate::{
    channel::SecureChannel,
    error::ClientError,
    handshake::{HandshakeAction, HandshakeState, PeerHandshake},
};

/// Relay's answer to a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registered {
    /// Waiting for the interlocutor
    Parked,
    /// Interlocutor was already waiting; key exchange under way
    Paired,
    /// Name already taken
    Rejected,
}

/// How pairing ended.
#[derive(Debug)]
pub enum PairingOutcome<S> {
    /// Key agreed; chat is open
    Established(SecureChannel<S>),
    /// Name already taken
    Rejected,
    /// Interlocutor did not arrive in time
    TimedOut,
}

/// Peer connection driving a [`PeerHandshake`] over a stream.
#[derive(Debug)]
pub struct Client<S> {
    stream: MessageStream<S>,
    handshake: PeerHandshake,
}

impl Client<TcpStream> {
    /// Connect to the relay at `config.listen_addr`.
    pub async fn connect(config: &Config) -> Result<Self, ClientError> {
        config.validate()?;
        let stream = TcpStream::connect(config.listen_addr).await?;
        Ok(Self::new(stream, config.listen_addr, config))
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already connected stream.
    pub fn new(stream: S, relay: SocketAddr, config: &Config) -> Self {
        Self {
            stream: MessageStream::new(stream, relay, config.buffer_size),
            handshake: PeerHandshake::new(ControlCodec::new(config.separator), config.key_len),
        }
    }

    /// Handshake state.
    pub fn state(&self) -> HandshakeState {
        self.handshake.state()
    }

    /// Send the registration and read the relay's verdict.
    pub async fn register(
        &mut self,
        registration: &Registration,
    ) -> Result<Registered, ClientError> {
        let actions = self.handshake.register(registration)?;
        self.execute(actions).await?;

        let reply = self.stream.read_message().await?;
        let actions = self.handshake.handle_message(&reply)?;
        self.execute(actions).await?;

        let registered = match self.handshake.state() {
            HandshakeState::Parked => Registered::Parked,
            HandshakeState::Rejected => Registered::Rejected,
            _ => Registered::Paired,
        };
        info!(
            name = %registration.name,
            interlocutor = %registration.interlocutor,
            ?registered,
            "registered"
        );
        Ok(registered)
    }

    /// Drive the handshake to completion.
    pub async fn establish(mut self) -> Result<PairingOutcome<S>, ClientError> {
        loop {
            match self.handshake.state() {
                HandshakeState::Rejected => return Ok(PairingOutcome::Rejected),
                HandshakeState::TimedOut => return Ok(PairingOutcome::TimedOut),
                _ => {},
            }

            let message = self.stream.read_message().await?;
            let actions = self.handshake.handle_message(&message)?;
            if let Some(key) = self.execute(actions).await? {
                info!("session key established");
                return Ok(PairingOutcome::Established(SecureChannel::new(self.stream, key)));
            }
        }
    }

    /// Register and drive the handshake to completion.
    pub async fn pair(
        mut self,
        registration: &Registration,
    ) -> Result<PairingOutcome<S>, ClientError> {
        self.register(registration).await?;
        self.establish().await
    }

    async fn execute(
        &mut self,
        actions: Vec<HandshakeAction>,
    ) -> Result<Option<SessionKey>, ClientError> {
        let mut established = None;
        for action in actions {
            match action {
                HandshakeAction::Send(payload) => self.stream.write_message(&payload).await?,
                HandshakeAction::Parked => debug!("parked, waiting for interlocutor"),
                HandshakeAction::Established(key) => established = Some(key),
                HandshakeAction::Rejected => info!("name already registered"),
                HandshakeAction::TimedOut => info!("interlocutor did not arrive"),
            }
        }
        Ok(established)
    }
}
