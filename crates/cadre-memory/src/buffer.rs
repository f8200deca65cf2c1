use cadre_core::CadreResult;
use serde::{Deserialize, Serialize};

/// Turns kept in memory before a flush.
pub const DEFAULT_BUFFER_CAPACITY: usize = 5;

/// One question/answer exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// What was asked.
    pub question: String,
    /// What was answered.
    pub answer: String,
    /// Agents involved in producing the answer.
    #[serde(default)]
    pub agents: Vec<String>,
    /// Why the answer was given.
    #[serde(default)]
    pub reason: String,
}

impl Conversation {
    /// Parse a model response of the form
    /// `{"question": ..., "answer": ..., "agents": [...], "reason": ...}`.
    pub fn from_json(raw: &str) -> CadreResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Context line used in decomposition prompts.
    pub fn render(&self) -> String {
        format!("Previous Q: {}, Previous A: {}", self.question, self.answer)
    }
}

/// Bounded, in-process buffer of recent turns.
#[derive(Debug)]
pub struct ConversationBuffer {
    entries: Vec<Conversation>,
    capacity: usize,
}

impl ConversationBuffer {
    /// Create a buffer that flushes once it holds `capacity` turns.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append a turn. Returns `true` once the buffer has reached capacity and
    /// should be flushed.
    pub fn push(&mut self, conversation: Conversation) -> bool {
        self.entries.push(conversation);
        self.is_full()
    }

    /// Whether the buffer holds at least `capacity` turns.
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Buffered turns, oldest first.
    pub fn entries(&self) -> &[Conversation] {
        &self.entries
    }

    /// Empty the buffer, returning what it held.
    pub fn drain(&mut self) -> Vec<Conversation> {
        std::mem::take(&mut self.entries)
    }

    /// Turn at `index`; negative indices count from the most recent (`-1`).
    pub fn get(&self, index: isize) -> Option<&Conversation> {
        let len = self.entries.len() as isize;
        let idx = if index < 0 { len + index } else { index };
        if (0..len).contains(&idx) {
            self.entries.get(idx as usize)
        } else {
            None
        }
    }

    /// Rendered context line for the turn at `index`.
    pub fn memory_at(&self, index: isize) -> Option<String> {
        self.get(index).map(Conversation::render)
    }

    /// Up to `n` rendered turns, most recent first.
    pub fn recent(&self, n: usize) -> Vec<String> {
        self.entries
            .iter()
            .rev()
            .take(n)
            .map(Conversation::render)
            .collect()
    }

    /// Number of buffered turns.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flush threshold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ConversationBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}
