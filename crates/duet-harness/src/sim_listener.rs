//! Simulated TCP listener.

use std::{
    io,
    net::{Ipv4Addr, SocketAddr},
};

use async_trait::async_trait;
use duet_core::{Config, Listener};
use duet_server::Server;
use tracing::debug;

/// Port the simulated relay listens on.
pub const RELAY_PORT: u16 = 8080;

/// Turmoil TCP listener usable by [`Server`].
pub struct SimListener {
    inner: turmoil::net::TcpListener,
}

impl SimListener {
    /// Bind on the current simulated host.
    pub async fn bind(port: u16) -> io::Result<Self> {
        let inner = turmoil::net::TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl Listener for SimListener {
    type Stream = turmoil::net::TcpStream;

    async fn accept(&self) -> io::Result<(Self::Stream, SocketAddr)> {
        let (stream, peer) = self.inner.accept().await?;
        debug!(peer = %peer, "sim accept");
        Ok((stream, peer))
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }
}

/// Run a relay on the current simulated host until the simulation ends.
pub async fn serve(config: Config) -> turmoil::Result {
    let listener = SimListener::bind(RELAY_PORT).await?;
    let server = Server::new(listener, &config)?;
    server.run().await;
    Ok(())
}
