use crate::buffer::{Conversation, ConversationBuffer, DEFAULT_BUFFER_CAPACITY};
use crate::store::{FileMemoryStore, InMemoryStore, MemoryStore};
use async_trait::async_trait;
use cadre_core::{CadreError, CadreResult, ContextSource};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Directory for the file store. When unset, memory is kept in-process.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Turns buffered before a flush to the store.
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
}

fn default_buffer_capacity() -> usize {
    DEFAULT_BUFFER_CAPACITY
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            buffer_capacity: default_buffer_capacity(),
        }
    }
}

/// Rolling buffer backed by a persistent store.
pub struct MemoryManager {
    buffer: Mutex<ConversationBuffer>,
    store: Arc<dyn MemoryStore>,
}

impl MemoryManager {
    /// Combine a buffer of `capacity` turns with `store`.
    pub fn new(store: Arc<dyn MemoryStore>, capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(ConversationBuffer::new(capacity)),
            store,
        }
    }

    /// Build from config: file store when `data_dir` is set, in-memory otherwise.
    pub async fn from_config(config: &MemoryConfig) -> CadreResult<Self> {
        let store: Arc<dyn MemoryStore> = match &config.data_dir {
            Some(dir) => Arc::new(FileMemoryStore::new(dir.clone()).await?),
            None => Arc::new(InMemoryStore::new()),
        };
        Ok(Self::new(store, config.buffer_capacity))
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn MemoryStore> {
        &self.store
    }

    /// Number of turns currently buffered.
    pub async fn buffered(&self) -> usize {
        self.buffer.lock().await.len()
    }

    /// Record a turn given as a JSON model response.
    pub async fn add_conversation_json(&self, raw: &str) -> CadreResult<()> {
        let conversation = Conversation::from_json(raw)
            .map_err(|e| CadreError::Memory(format!("Invalid conversation record: {e}")))?;
        self.add_conversation(conversation).await
    }

    /// Record a turn, flushing the buffer to the store when it fills up.
    /// The flushed batch is tagged with its most recent turn as pre-context.
    ///
    /// The buffer is only emptied once the upload succeeds; on failure the
    /// turns stay buffered and the flush is retried on the next turn.
    pub async fn add_conversation(&self, conversation: Conversation) -> CadreResult<()> {
        let mut buffer = self.buffer.lock().await;
        if !buffer.push(conversation) {
            return Ok(());
        }

        let batch = buffer.entries();
        let pre_context = batch.last().map(Conversation::render);
        let uploaded = self.store.upload(batch, pre_context.as_deref()).await;
        match uploaded {
            Ok(ids) => {
                buffer.drain();
                info!(flushed = ids.len(), "Conversation buffer flushed to store");
                Ok(())
            }
            Err(e) => {
                warn!(
                    buffered = buffer.len(),
                    error = %e,
                    "Conversation flush failed, keeping turns buffered"
                );
                Err(e)
            }
        }
    }
}

#[async_trait]
impl ContextSource for MemoryManager {
    async fn recent_context(&self, n: usize) -> Vec<String> {
        self.buffer.lock().await.recent(n)
    }

    /// `conversation:<id>` renders that stored turn; any other key yields the
    /// pre-context of the most recent flush.
    async fn lookup(&self, key: &str) -> CadreResult<Option<String>> {
        if let Some(id) = key.strip_prefix("conversation:") {
            let id: u64 = id
                .parse()
                .map_err(|_| CadreError::Memory(format!("Invalid conversation key '{key}'")))?;
            return Ok(self
                .store
                .fetch(id)
                .await?
                .map(|stored| stored.conversation.render()));
        }
        Ok(self.store.latest().await?.and_then(|s| s.pre_context))
    }
}
