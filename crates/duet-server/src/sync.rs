//! Public-salt exchange between two paired handlers.
//!
//! Both handlers run this once, independently:
//!
//! ```text
//! socket ──salt──> handler ──writer──> partner
//! socket <──CHAT_CONFIRMED:<partner salt>── handler <──reader── partner
//! ```
//!
//! Salts are forwarded as opaque bytes. The relay never combines them.

use duet_core::MessageStream;
use duet_proto::ControlCodec;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use crate::{
    error::{ConnectionError, SyncError},
    session::ClientSession,
};

/// Swap public salts with the partner and confirm to the local peer.
pub(crate) async fn synchronize<S>(
    session: &mut ClientSession,
    stream: &mut MessageStream<S>,
    codec: &ControlCodec,
) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let own_salt = stream.read_message().await?;
    debug!(name = %session.info().name, len = own_salt.len(), "received public salt");
    session.send(own_salt).await?;

    let partner_salt = session.recv().await.ok_or(SyncError::PartnerGone)?;
    stream.write_message(&codec.confirmation(&partner_salt)).await?;

    debug!(name = %session.info().name, "chat synchronized");
    Ok(())
}
