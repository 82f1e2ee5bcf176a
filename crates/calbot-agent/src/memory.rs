//! Conversation memory shared by every request to one agent process.

use std::collections::VecDeque;

use tokio::sync::Mutex;

use crate::reasoner::ChatMessage;

pub const DEFAULT_MEMORY_MESSAGES: usize = 20;

/// Keeps the most recent user and assistant messages.
#[derive(Debug)]
pub struct ConversationMemory {
    capacity: usize,
    messages: Mutex<VecDeque<ChatMessage>>,
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_MESSAGES)
    }
}

impl ConversationMemory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            messages: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub async fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.lock().await.iter().cloned().collect()
    }

    /// Stores one exchange, evicting the oldest messages past capacity.
    pub async fn record(&self, prompt: &str, answer: &str) {
        let mut messages = self.messages.lock().await;
        messages.push_back(ChatMessage::user(prompt));
        messages.push_back(ChatMessage::assistant(answer));
        while messages.len() > self.capacity {
            messages.pop_front();
        }
    }

    pub async fn len(&self) -> usize {
        self.messages.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.lock().await.is_empty()
    }

    pub async fn clear(&self) {
        self.messages.lock().await.clear();
    }
}
