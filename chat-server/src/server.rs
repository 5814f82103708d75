use std::{future::Future, net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use tokio::{
    net::{TcpListener, TcpStream, tcp::OwnedWriteHalf},
    select,
};
use tracing::warn;

use crate::{
    chat_log::ChatLog, connection::Connection, handler::handle_connection,
    registry::ChatterRegistry,
};

pub type TcpRegistry<L> = ChatterRegistry<Connection<OwnedWriteHalf>, L>;

/// Accepts TCP connections and runs one task per chatter.
pub struct ChatServer<L> {
    listener: TcpListener,
    registry: Arc<TcpRegistry<L>>,
}

impl<L> ChatServer<L>
where
    L: ChatLog + 'static,
{
    pub fn new(listener: TcpListener, chat_log: Arc<L>) -> Self {
        Self {
            listener,
            registry: Arc::new(ChatterRegistry::new(chat_log)),
        }
    }

    pub async fn bind(addr: &str, chat_log: Arc<L>) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        Ok(Self::new(listener, chat_log))
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn registry(&self) -> Arc<TcpRegistry<L>> {
        Arc::clone(&self.registry)
    }

    /// Accepts connections until the listener fails.
    pub async fn serve(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Accepts connections until `shutdown` resolves or accepting fails.
    ///
    /// Connected chatters are not notified on shutdown; their tasks keep
    /// running until the runtime stops.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let ChatServer { listener, registry } = self;
        tokio::pin!(shutdown);

        loop {
            select! {
                _ = &mut shutdown => break,
                accept_result = listener.accept() => {
                    let (stream, peer) = accept_result.context("failed to accept connection")?;
                    spawn_connection_handler(stream, peer, &registry);
                }
            }
        }

        Ok(())
    }

    pub async fn run_until_ctrl_c(self) -> Result<()> {
        self.run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = ?err, "failed to install ctrl-c handler");
                std::future::pending::<()>().await;
            }
        })
        .await
    }
}

fn spawn_connection_handler<L>(stream: TcpStream, peer: SocketAddr, registry: &Arc<TcpRegistry<L>>)
where
    L: ChatLog + 'static,
{
    let registry = Arc::clone(registry);
    tokio::spawn(async move {
        let (reader, writer) = stream.into_split();
        if let Err(err) = handle_connection(reader, writer, &*registry).await {
            warn!(peer = %peer, error = ?err, "connection closed with error");
        }
    });
}
