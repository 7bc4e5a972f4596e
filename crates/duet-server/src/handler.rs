//! Per-connection handler: registration, pairing, handshake, relay.
//!
//! # Lifecycle
//!
//! ```text
//!            registration
//!                 │
//!        name taken? ──yes──> CLIENT_EXISTS, close
//!                 │
//!   interlocutor waiting for us?
//!        │                      │
//!       no                     yes
//!        │                      │
//!   park in pool           adopt its ends
//!   NO_INTERLOCUTOR        generate p, g
//!   wait (bounded)         INTERLOCUTOR_FOUND to self and partner
//!    │         │                │
//!  found    timeout             │
//!    │         │                │
//!    │   INTERLOCUTOR_WAIT_TIMEOUT, close
//!    │                          │
//!    └──────> synchronize <─────┘
//!                 │
//!               relay
//! ```

use bytes::Bytes;
use duet_core::MessageStream;
use duet_crypto::{DhEngine, DomainParameters};
use duet_proto::{Registration, ServerMessage};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    runtime::{Handle, RuntimeFlavor},
};
use tracing::{debug, info};

use crate::{
    error::{ConnectionError, SyncError},
    pool::{Removal, SessionInfo},
    relay::relay,
    server::ServerContext,
    session::{CHANNEL_CAPACITY, ClientSession, channel_pair},
    sync::synchronize,
};

/// How a connection ended when nothing went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionOutcome {
    /// Name already waiting; sent `CLIENT_EXISTS`
    Rejected,
    /// Nobody arrived in time; sent `INTERLOCUTOR_WAIT_TIMEOUT`
    TimedOut,
    /// Paired, synchronized and relayed until one side left
    Relayed,
}

/// Drive one accepted connection to completion.
pub(crate) async fn handle_connection<S>(
    ctx: &ServerContext,
    mut stream: MessageStream<S>,
) -> Result<ConnectionOutcome, ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let raw = stream.read_message().await?;
    let registration = ctx.codec.parse_registration(&raw)?;
    let info = session_info(&stream, registration);
    info!(
        peer = %info.address,
        name = %info.name,
        interlocutor = %info.interlocutor,
        "peer registered"
    );

    if ctx.pool.contains(&info.name) {
        return reject(ctx, &mut stream, &info).await;
    }

    let mut session = match ctx.pool.adopt(&info.interlocutor, &info.name) {
        Some(ends) => {
            let session = ClientSession::new(info, ends);
            join_waiting(ctx, &mut stream, &session).await?;
            session
        },
        None => {
            let (own, reserved) = channel_pair(CHANNEL_CAPACITY);
            if ctx.pool.insert(info.clone(), reserved).is_err() {
                return reject(ctx, &mut stream, &info).await;
            }
            let mut session = ClientSession::new(info, own);
            if !wait_for_interlocutor(ctx, &mut stream, &mut session).await? {
                return Ok(ConnectionOutcome::TimedOut);
            }
            session
        },
    };

    synchronize(&mut session, &mut stream, &ctx.codec).await?;
    relay(&mut session, &mut stream).await?;
    session.close();

    Ok(ConnectionOutcome::Relayed)
}

fn session_info<S>(stream: &MessageStream<S>, registration: Registration) -> SessionInfo
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    SessionInfo {
        address: stream.peer_addr(),
        name: registration.name,
        interlocutor: registration.interlocutor,
    }
}

async fn reject<S>(
    ctx: &ServerContext,
    stream: &mut MessageStream<S>,
    info: &SessionInfo,
) -> Result<ConnectionOutcome, ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    info!(peer = %info.address, name = %info.name, "name already waiting, rejecting");
    let reply = ctx.codec.encode_server_message(&ServerMessage::ClientExists);
    stream.write_message(reply.as_bytes()).await?;
    Ok(ConnectionOutcome::Rejected)
}

/// Second-to-arrive path: generate parameters and wake the waiting partner.
async fn join_waiting<S>(
    ctx: &ServerContext,
    stream: &mut MessageStream<S>,
    session: &ClientSession,
) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let params = generate_parameters(&ctx.engine)?;
    debug!(
        name = %session.info().name,
        interlocutor = %session.info().interlocutor,
        bits = params.p.bits(),
        "generated domain parameters"
    );

    let found = ctx.codec.encode_server_message(&ServerMessage::InterlocutorFound {
        p: params.p.to_string(),
        g: params.g.to_string(),
    });
    let found = Bytes::from(found);

    stream.write_message(&found).await?;
    session.send(found).await?;
    Ok(())
}

/// First-to-arrive path. Returns `false` if the wait timed out.
///
/// Exactly one of {pairing, timeout} wins: if the timer fires after the
/// interlocutor already adopted this entry, the pairing proceeds.
async fn wait_for_interlocutor<S>(
    ctx: &ServerContext,
    stream: &mut MessageStream<S>,
    session: &mut ClientSession,
) -> Result<bool, ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let name = session.info().name.clone();

    let reply = ctx.codec.encode_server_message(&ServerMessage::NoInterlocutor);
    if let Err(e) = stream.write_message(reply.as_bytes()).await {
        ctx.pool.remove(&name);
        return Err(e.into());
    }

    let found = match tokio::time::timeout(ctx.wait_timeout, session.recv()).await {
        Ok(found) => {
            ctx.pool.remove(&name);
            found
        },
        Err(_) => match ctx.pool.remove(&name) {
            Removal::Adopted => {
                debug!(name = %name, "interlocutor arrived as the wait expired");
                session.recv().await
            },
            Removal::Waiting | Removal::Absent => {
                info!(name = %name, timeout = ?ctx.wait_timeout, "interlocutor wait timed out");
                let reply = ctx.codec.encode_server_message(&ServerMessage::WaitTimeout);
                stream.write_message(reply.as_bytes()).await?;
                return Ok(false);
            },
        },
    };

    let found = found.ok_or(SyncError::PartnerGone)?;
    stream.write_message(&found).await?;
    Ok(true)
}

/// Prime generation is CPU-bound; keep it off the async worker when the
/// runtime has other workers to lend.
fn generate_parameters(engine: &DhEngine) -> Result<DomainParameters, ConnectionError> {
    let params = match Handle::current().runtime_flavor() {
        RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| engine.generate_domain_parameters())
        },
        _ => engine.generate_domain_parameters(),
    }?;
    Ok(params)
}
