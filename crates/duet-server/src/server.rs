//! Accept loop.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use duet_core::{Config, Listener, MessageStream};
use duet_crypto::{DhEngine, ParameterStrategy};
use duet_proto::ControlCodec;
use tracing::{debug, info, warn};

use crate::{error::ServerError, handler::handle_connection, pool::WaitingPool};

/// Pause after a failed accept so a persistent error (e.g. fd exhaustion)
/// does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// State shared by every connection handler.
#[derive(Debug)]
pub struct ServerContext {
    /// Peers waiting for their interlocutor
    pub pool: Arc<WaitingPool>,
    /// Control message codec
    pub codec: ControlCodec,
    /// Domain parameter generator
    pub engine: DhEngine,
    /// Bound on a first-to-arrive peer's wait
    pub wait_timeout: Duration,
}

impl ServerContext {
    /// Build handler state from a validated configuration.
    ///
    /// The modulus width is checked here, by the engine.
    pub fn from_config(config: &Config, strategy: ParameterStrategy) -> Result<Self, ServerError> {
        config.validate()?;
        Ok(Self {
            pool: Arc::new(WaitingPool::new()),
            codec: ControlCodec::new(config.separator),
            engine: DhEngine::new(config.modulus_bits, strategy)?,
            wait_timeout: config.wait_timeout,
        })
    }
}

/// Rendezvous relay over any [`Listener`].
pub struct Server<L> {
    listener: L,
    context: Arc<ServerContext>,
    buffer_size: usize,
}

impl<L: Listener> Server<L> {
    /// Create a relay serving connections from `listener`, generating
    /// safe-prime domain parameters.
    pub fn new(listener: L, config: &Config) -> Result<Self, ServerError> {
        Self::with_strategy(listener, config, ParameterStrategy::default())
    }

    /// Create a relay with an explicit domain parameter construction.
    pub fn with_strategy(
        listener: L,
        config: &Config,
        strategy: ParameterStrategy,
    ) -> Result<Self, ServerError> {
        let context = Arc::new(ServerContext::from_config(config, strategy)?);
        Ok(Self { listener, context, buffer_size: config.buffer_size })
    }

    /// Address the relay is listening on.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle on the waiting pool, for inspection.
    pub fn pool(&self) -> Arc<WaitingPool> {
        Arc::clone(&self.context.pool)
    }

    /// Serve forever, one task per connection.
    ///
    /// Accept errors are logged and do not stop the loop.
    pub async fn run(self) {
        if let Ok(addr) = self.listener.local_addr() {
            info!(addr = %addr, "relay listening");
        }

        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                },
            };
            debug!(peer = %peer, "accepted connection");

            let context = Arc::clone(&self.context);
            let stream = MessageStream::new(stream, peer, self.buffer_size);
            tokio::spawn(async move {
                match handle_connection(&context, stream).await {
                    Ok(outcome) => debug!(peer = %peer, ?outcome, "connection finished"),
                    Err(e) if e.is_benign() => info!(peer = %peer, reason = %e, "connection ended"),
                    Err(e) => warn!(peer = %peer, error = %e, "connection aborted"),
                }
                debug!(peer = %peer, "closed connection");
            });
        }
    }
}
