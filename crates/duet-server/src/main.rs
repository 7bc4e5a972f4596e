//! Duet relay binary.

use std::{net::SocketAddr, time::Duration};

use clap::{Parser, ValueEnum};
use duet_core::Config;
use duet_crypto::ParameterStrategy;
use duet_server::Server;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    SafePrime,
    PrimitiveRoot,
}

impl From<Strategy> for ParameterStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::SafePrime => Self::SafePrime,
            Strategy::PrimitiveRoot => Self::SmallestPrimitiveRoot,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "duet-server")]
#[command(about = "Rendezvous relay for Diffie-Hellman paired chats", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// Bytes read per message
    #[arg(long, default_value_t = 4096)]
    buffer_size: usize,

    /// Control message field separator
    #[arg(long, default_value_t = ':')]
    separator: char,

    /// Seconds a peer waits for its interlocutor
    #[arg(long, default_value_t = 60)]
    wait_timeout_secs: u64,

    /// Diffie-Hellman modulus width in bits
    #[arg(long, default_value_t = 2048)]
    modulus_bits: usize,

    /// Domain parameter construction
    #[arg(long, value_enum, default_value_t = Strategy::SafePrime)]
    strategy: Strategy,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            listen_addr: self.listen,
            buffer_size: self.buffer_size,
            separator: self.separator,
            wait_timeout: Duration::from_secs(self.wait_timeout_secs),
            modulus_bits: self.modulus_bits,
            ..Config::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.config();

    let listener = TcpListener::bind(config.listen_addr).await?;
    let server = Server::with_strategy(listener, &config, args.strategy.into())?;
    server.run().await;

    Ok(())
}
