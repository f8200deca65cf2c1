use crate::buffer::Conversation;
use async_trait::async_trait;
use cadre_core::{CadreError, CadreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// A conversation turn as persisted by a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredConversation {
    /// Store-assigned, monotonically increasing identifier.
    pub id: u64,
    /// The turn itself.
    #[serde(flatten)]
    pub conversation: Conversation,
    /// Context line captured when the batch was flushed.
    pub pre_context: Option<String>,
    /// When the turn was stored.
    pub stored_at: DateTime<Utc>,
}

/// Trait for conversation storage backends.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Persist a batch, tagging every entry with `pre_context`. Returns the
    /// assigned ids in order.
    async fn upload(
        &self,
        conversations: &[Conversation],
        pre_context: Option<&str>,
    ) -> CadreResult<Vec<u64>>;

    /// Fetch a stored turn by id.
    async fn fetch(&self, id: u64) -> CadreResult<Option<StoredConversation>>;

    /// The most recently stored turn.
    async fn latest(&self) -> CadreResult<Option<StoredConversation>>;

    /// Number of stored turns.
    async fn count(&self) -> CadreResult<usize>;
}

fn stamp(id: u64, conversation: &Conversation, pre_context: Option<&str>) -> StoredConversation {
    StoredConversation {
        id,
        conversation: conversation.clone(),
        pre_context: pre_context.map(str::to_string),
        stored_at: Utc::now(),
    }
}

/// Volatile store, useful for tests and single-process runs.
pub struct InMemoryStore {
    entries: RwLock<Vec<StoredConversation>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn upload(
        &self,
        conversations: &[Conversation],
        pre_context: Option<&str>,
    ) -> CadreResult<Vec<u64>> {
        let mut entries = self.entries.write().await;
        let mut ids = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let id = entries.len() as u64;
            entries.push(stamp(id, conversation, pre_context));
            ids.push(id);
        }
        Ok(ids)
    }

    async fn fetch(&self, id: u64) -> CadreResult<Option<StoredConversation>> {
        let entries = self.entries.read().await;
        Ok(entries.get(id as usize).cloned())
    }

    async fn latest(&self) -> CadreResult<Option<StoredConversation>> {
        Ok(self.entries.read().await.last().cloned())
    }

    async fn count(&self) -> CadreResult<usize> {
        Ok(self.entries.read().await.len())
    }
}

/// File-based store: one pretty-printed JSON file per turn,
/// named `conversation-<id>.json`.
pub struct FileMemoryStore {
    dir: PathBuf,
    next_id: Mutex<u64>,
}

impl FileMemoryStore {
    /// Open (creating if needed) a store rooted at `dir`. Ids continue after
    /// the highest one already on disk.
    pub async fn new(dir: PathBuf) -> CadreResult<Self> {
        tokio::fs::create_dir_all(&dir).await?;

        let mut next_id = 0;
        let mut read_dir = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            if let Some(id) = entry.file_name().to_str().and_then(parse_file_id) {
                next_id = next_id.max(id + 1);
            }
        }

        debug!(dir = %dir.display(), next_id, "Opened file memory store");
        Ok(Self {
            dir,
            next_id: Mutex::new(next_id),
        })
    }

    fn entry_path(&self, id: u64) -> PathBuf {
        self.dir.join(format!("conversation-{id}.json"))
    }
}

fn parse_file_id(file_name: &str) -> Option<u64> {
    file_name
        .strip_prefix("conversation-")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

#[async_trait]
impl MemoryStore for FileMemoryStore {
    async fn upload(
        &self,
        conversations: &[Conversation],
        pre_context: Option<&str>,
    ) -> CadreResult<Vec<u64>> {
        let mut next_id = self.next_id.lock().await;
        let mut ids = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let id = *next_id;
            let json = serde_json::to_string_pretty(&stamp(id, conversation, pre_context))?;
            tokio::fs::write(self.entry_path(id), json).await?;
            *next_id += 1;
            ids.push(id);
        }
        Ok(ids)
    }

    async fn fetch(&self, id: u64) -> CadreResult<Option<StoredConversation>> {
        let data = match tokio::fs::read_to_string(self.entry_path(id)).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored = serde_json::from_str(&data).map_err(|e| {
            CadreError::Memory(format!("Failed to parse stored conversation {id}: {e}"))
        })?;
        Ok(Some(stored))
    }

    async fn latest(&self) -> CadreResult<Option<StoredConversation>> {
        let next_id = *self.next_id.lock().await;
        match next_id.checked_sub(1) {
            Some(id) => self.fetch(id).await,
            None => Ok(None),
        }
    }

    async fn count(&self) -> CadreResult<usize> {
        Ok(*self.next_id.lock().await as usize)
    }
}
