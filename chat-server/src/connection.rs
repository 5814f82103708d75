use std::{future::Future, io};

use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};

/// Outbound side of a chatter: anything the registry can push text into.
///
/// Implementations must tolerate concurrent `send` calls from different
/// broadcasting tasks.
pub trait MessageSink: Send + Sync {
    fn send(&self, message: &str) -> impl Future<Output = io::Result<()>> + Send;

    fn close(&self) -> impl Future<Output = io::Result<()>> + Send;
}

/// Write half of an accepted stream.
///
/// The owning connection task keeps the read half; this half is shared with
/// the registry once the chatter is registered, so writes are serialized
/// through a mutex to keep concurrent broadcasts from interleaving bytes.
pub struct Connection<W> {
    writer: Mutex<W>,
}

impl<W> Connection<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl<W> MessageSink for Connection<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&self, message: &str) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(message.as_bytes()).await?;
        writer.flush().await
    }

    async fn close(&self) -> io::Result<()> {
        self.writer.lock().await.shutdown().await
    }
}
