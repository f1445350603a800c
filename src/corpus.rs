//! Rolling sample of observed chat messages.
//!
//! Messages are kept oldest first. The buffer is only ever appended to or
//! cleared; it is owned by the generation controller and not shared.

/// Ordered buffer of recent chat messages.
#[derive(Debug, Clone, Default)]
pub struct CorpusBuffer {
    messages: Vec<String>,
}

impl CorpusBuffer {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty buffer with room for `capacity` messages.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: Vec::with_capacity(capacity),
        }
    }

    /// Append a message at the tail.
    pub fn append(&mut self, text: impl Into<String>) {
        self.messages.push(text.into());
    }

    /// Number of buffered messages.
    pub fn size(&self) -> usize {
        self.messages.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Read-only view of the messages, oldest first.
    pub fn snapshot(&self) -> &[String] {
        &self.messages
    }

    /// Messages joined one per line, the shape the Markov model reads.
    pub fn joined(&self) -> String {
        self.messages.join("\n")
    }

    /// Drop every message. Capacity is kept for the next round.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
