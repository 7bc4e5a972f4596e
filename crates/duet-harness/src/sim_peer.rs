//! Simulated peers.

use duet_client::Client;
use duet_core::Config;

use crate::sim_listener::RELAY_PORT;

/// Connect a peer to the relay running on simulated host `relay`.
pub async fn connect(
    relay: &str,
    config: &Config,
) -> std::io::Result<Client<turmoil::net::TcpStream>> {
    let stream = turmoil::net::TcpStream::connect(format!("{relay}:{RELAY_PORT}").as_str()).await?;
    let relay_addr = stream.peer_addr()?;
    Ok(Client::new(stream, relay_addr, config))
}
