//! Blind duplex forwarding after the handshake.

use duet_core::{MessageStream, TransportError};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::{error::ConnectionError, session::ClientSession};

/// Forward traffic between the local socket and the partner's handler.
///
/// Returns `Ok` when either side goes away cleanly: the peer closes its
/// socket or the partner's channel closes. A failed socket write is logged
/// and skipped; a non-recoverable read error ends the loop with an error.
pub(crate) async fn relay<S>(
    session: &mut ClientSession,
    stream: &mut MessageStream<S>,
) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let name = session.info().name.clone();
    let interlocutor = session.info().interlocutor.clone();

    loop {
        tokio::select! {
            incoming = session.recv() => match incoming {
                Some(message) => {
                    debug!(from = %interlocutor, to = %name, len = message.len(), "forwarding");
                    if let Err(e) = stream.write_message(&message).await {
                        warn!(to = %name, error = %e, "could not deliver message");
                    }
                },
                None => {
                    info!(name = %name, "interlocutor disconnected");
                    return Ok(());
                },
            },
            outgoing = stream.read_message() => match outgoing {
                Ok(message) => {
                    debug!(from = %name, to = %interlocutor, len = message.len(), "forwarding");
                    if session.send(message).await.is_err() {
                        info!(name = %name, "interlocutor disconnected");
                        return Ok(());
                    }
                },
                Err(TransportError::Closed) => {
                    info!(name = %name, "connection closed by peer");
                    return Ok(());
                },
                Err(e) if e.is_recoverable() => {
                    warn!(name = %name, error = %e, "transient read error");
                },
                Err(e) => return Err(e.into()),
            },
        }
    }
}
