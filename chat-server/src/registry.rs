use std::{collections::HashMap, io, sync::Arc};

use tokio::sync::RwLock;
use tracing::warn;

use crate::{chat_log::ChatLog, connection::MessageSink, message};

/// Every currently registered chatter, keyed by display name.
///
/// One `RwLock` guards the whole map. Lookups and broadcasts share it, while
/// `add`, `try_add` and `remove` take it exclusively.
///
/// A broadcast keeps the read lock while it writes to every recipient, so a
/// recipient that stops reading stalls all other broadcasts and every pending
/// join or leave until its socket errors out. At the scale this server targets
/// that is an accepted cost; it also means broadcasts never interleave with
/// membership changes.
pub struct ChatterRegistry<S, L> {
    chatters: RwLock<HashMap<String, Arc<S>>>,
    chat_log: Arc<L>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum RegisterError {
    NameTaken,
}

impl<S, L> ChatterRegistry<S, L>
where
    S: MessageSink,
    L: ChatLog,
{
    pub fn new(chat_log: Arc<L>) -> Self {
        Self {
            chatters: RwLock::new(HashMap::new()),
            chat_log,
        }
    }

    /// Inserts `sink` under `name`, replacing any existing entry.
    ///
    /// The handshake must use [`try_add`](Self::try_add) instead; this is for
    /// callers that already own the name.
    pub async fn add(&self, name: &str, sink: Arc<S>) {
        self.chatters.write().await.insert(name.to_string(), sink);
    }

    /// Registers `name` unless it is already taken, checking and inserting
    /// under one write lock. Returns the chatter count including the new
    /// entry.
    pub async fn try_add(&self, name: &str, sink: Arc<S>) -> Result<usize, RegisterError> {
        let mut chatters = self.chatters.write().await;
        if chatters.contains_key(name) {
            return Err(RegisterError::NameTaken);
        }

        chatters.insert(name.to_string(), sink);
        Ok(chatters.len())
    }

    pub async fn remove(&self, name: &str) -> Option<Arc<S>> {
        self.chatters.write().await.remove(name)
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.chatters.read().await.contains_key(name)
    }

    pub async fn count(&self) -> usize {
        self.chatters.read().await.len()
    }

    /// Timestamps `message` and writes it to every chatter except `from`.
    ///
    /// The first failed write aborts the broadcast and is returned; chatters
    /// not yet visited miss the message. Only a fully delivered broadcast is
    /// recorded in the chat log, and a log failure never fails delivery.
    pub async fn broadcast(&self, from: &str, message: &str) -> io::Result<()> {
        let chatters = self.chatters.read().await;
        let stamped = message::timestamped(message);

        for (name, sink) in chatters.iter() {
            if name == from {
                continue;
            }
            sink.send(&stamped).await?;
        }

        if let Err(error) = self.chat_log.log(&stamped).await {
            warn!(?error, "failed to record broadcast in chat log");
        }

        Ok(())
    }
}
