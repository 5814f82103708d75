//! Per-connection lifecycle: prompt for a name, register, relay lines, clean up.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, BufReader};
use tracing::{debug, info, warn};

use crate::{
    chat_log::ChatLog,
    connection::{Connection, MessageSink},
    message::{self, NAME_PROMPT, NAME_TAKEN, read_line},
    registry::{ChatterRegistry, RegisterError},
};

/// Outcome of the name handshake.
enum Handshake {
    /// Registered under `name`; `total` counts the new chatter too.
    Joined { name: String, total: usize },
    /// The name was taken and the rejection notice has been sent.
    Rejected,
    /// The stream ended before a name arrived.
    Disconnected,
}

/// Drives one accepted connection until it ends.
///
/// Cleanup always runs once the session is over, whichever way it ended: the
/// stream is shut down, then a registered chatter is removed from the registry
/// and its departure is announced. The logout broadcast is best effort and its
/// failure is only logged; any earlier error is returned.
pub async fn handle_connection<R, W, L>(
    reader: R,
    writer: W,
    registry: &ChatterRegistry<Connection<W>, L>,
) -> Result<()>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
    L: ChatLog,
{
    let mut reader = BufReader::new(reader);
    let connection = Arc::new(Connection::new(writer));
    let mut registered = None;

    let result = run_session(&mut reader, &connection, registry, &mut registered).await;

    if let Err(error) = connection.close().await {
        debug!(?error, "failed to shut down connection");
    }
    if let Some(name) = registered {
        cleanup_chatter_disconnect(registry, &name).await;
    }

    result
}

async fn run_session<R, W, L>(
    reader: &mut R,
    connection: &Arc<Connection<W>>,
    registry: &ChatterRegistry<Connection<W>, L>,
    registered: &mut Option<String>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
    L: ChatLog,
{
    let (name, total) = match perform_handshake(reader, connection, registry).await? {
        Handshake::Joined { name, total } => (name, total),
        Handshake::Rejected | Handshake::Disconnected => return Ok(()),
    };
    *registered = Some(name.clone());
    info!(%name, total, "chatter joined");

    connection
        .send(&message::welcome(&name, total))
        .await
        .context("failed to send welcome")?;
    registry
        .broadcast(&name, &message::login(&name))
        .await
        .context("failed to announce login")?;

    relay_lines(reader, registry, &name).await
}

async fn perform_handshake<R, W, L>(
    reader: &mut R,
    connection: &Arc<Connection<W>>,
    registry: &ChatterRegistry<Connection<W>, L>,
) -> Result<Handshake>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
    L: ChatLog,
{
    connection
        .send(NAME_PROMPT)
        .await
        .context("failed to send name prompt")?;

    let Some(name) = read_line(reader)
        .await
        .context("failed to read chatter name")?
    else {
        return Ok(Handshake::Disconnected);
    };

    match registry.try_add(&name, Arc::clone(connection)).await {
        Ok(total) => Ok(Handshake::Joined { name, total }),
        Err(RegisterError::NameTaken) => {
            debug!(%name, "rejected duplicate chatter name");
            connection
                .send(NAME_TAKEN)
                .await
                .context("failed to send name rejection")?;
            Ok(Handshake::Rejected)
        }
    }
}

async fn relay_lines<R, W, L>(
    reader: &mut R,
    registry: &ChatterRegistry<Connection<W>, L>,
    name: &str,
) -> Result<()>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
    L: ChatLog,
{
    while let Some(line) = read_line(reader).await.context("failed to read chat line")? {
        registry
            .broadcast(name, &message::chat(name, &line))
            .await
            .with_context(|| format!("failed to broadcast message from {name}"))?;
    }
    Ok(())
}

async fn cleanup_chatter_disconnect<S, L>(registry: &ChatterRegistry<S, L>, name: &str)
where
    S: MessageSink,
    L: ChatLog,
{
    registry.remove(name).await;
    info!(%name, "chatter left");

    if let Err(error) = registry.broadcast(name, &message::logout(name)).await {
        warn!(%name, ?error, "failed to announce logout");
    }
}
