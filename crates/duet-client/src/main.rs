//! Duet line-based chat peer.
//!
//! Registers with the relay, waits for the interlocutor, then sends each stdin
//! line encrypted and prints every decrypted message to stdout.

use std::{net::SocketAddr, process::ExitCode};

use clap::Parser;
use duet_client::{Client, ClientError, PairingOutcome, Registered};
use duet_core::Config;
use duet_proto::{ControlCodec, Registration};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "duet-client")]
#[command(about = "Encrypted chat through a Duet relay", long_about = None)]
struct Args {
    /// Name to register under
    name: String,

    /// Peer to talk to
    interlocutor: String,

    /// Relay address
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    server: SocketAddr,

    /// Bytes read per message
    #[arg(long, default_value_t = 4096)]
    buffer_size: usize,

    /// Control message field separator
    #[arg(long, default_value_t = ControlCodec::DEFAULT_SEPARATOR)]
    separator: char,

    /// Session key length in bytes (16 or 32)
    #[arg(long, default_value_t = 32)]
    key_len: usize,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            listen_addr: self.server,
            buffer_size: self.buffer_size,
            separator: self.separator,
            key_len: self.key_len,
            ..Config::default()
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "chat ended");
            ExitCode::FAILURE
        },
    }
}

async fn run(args: &Args) -> Result<(), ClientError> {
    let config = args.config();
    let registration = Registration::new(args.name.as_str(), args.interlocutor.as_str());

    let mut client = Client::connect(&config).await?;
    if client.register(&registration).await? == Registered::Parked {
        info!(interlocutor = %registration.interlocutor, "waiting for interlocutor");
    }

    let mut channel = match client.establish().await? {
        PairingOutcome::Established(channel) => channel,
        PairingOutcome::Rejected => {
            info!(name = %registration.name, "name already in use");
            return Ok(());
        },
        PairingOutcome::TimedOut => {
            info!(interlocutor = %registration.interlocutor, "interlocutor did not show up");
            return Ok(());
        },
    };
    info!(interlocutor = %registration.interlocutor, "chat open");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) if line.is_empty() => {},
                Some(line) => channel.send(line.as_bytes()).await?,
                None => break,
            },
            message = channel.recv() => match message? {
                Some(plaintext) => {
                    stdout.write_all(&plaintext).await?;
                    stdout.write_all(b"\n").await?;
                    stdout.flush().await?;
                },
                None => {
                    info!("relay closed the connection");
                    return Ok(());
                },
            },
        }
    }

    channel.close().await
}
