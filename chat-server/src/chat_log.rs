//! Append-only record of every broadcast.
//!
//! The registry hands each successfully delivered, already-timestamped
//! payload to a [`ChatLog`]. [`FileChatLog`] appends those payloads to a file
//! on disk; tests substitute in-memory logs.

use std::{
    future::Future,
    io,
    path::{Path, PathBuf},
};

use tokio::{
    fs::{File, OpenOptions},
    io::AsyncWriteExt,
    sync::Mutex,
};

pub trait ChatLog: Send + Sync {
    /// Records one broadcast payload.
    fn log(&self, message: &str) -> impl Future<Output = io::Result<()>> + Send;

    /// Flushes and releases the underlying resource. Called once at shutdown.
    fn close(&self) -> impl Future<Output = io::Result<()>> + Send;
}

/// Appends payloads to a file, creating it if needed.
///
/// Broadcasting tasks share one handle, so appends go through a mutex and land
/// whole. `None` marks a closed log.
pub struct FileChatLog {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl FileChatLog {
    pub async fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            file: Mutex::new(Some(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChatLog for FileChatLog {
    async fn log(&self, message: &str) -> io::Result<()> {
        let mut guard = self.file.lock().await;
        let file = guard
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "chat log is closed"))?;

        file.write_all(message.as_bytes()).await?;
        // tokio buffers file writes in the background; flush so the bytes are
        // handed to the OS before the broadcast is considered recorded.
        file.flush().await
    }

    async fn close(&self) -> io::Result<()> {
        if let Some(mut file) = self.file.lock().await.take() {
            file.flush().await?;
            file.sync_all().await?;
        }
        Ok(())
    }
}
