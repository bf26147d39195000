//! Client-side conversation projection.
//!
//! The server owns conversation history; the client keeps a display
//! copy plus a per-conversation draft cache and nothing else. Field
//! renames follow the camelCase the endpoints emit.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Author of one chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// Display copy of a server-owned conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<ChatTurn>,
    #[serde(rename = "isFavorite", default)]
    pub is_favorite: bool,
    #[serde(rename = "isActive", default)]
    pub is_active: bool,
}

impl Conversation {
    #[must_use]
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self { id, title: title.into(), messages: Vec::new(), is_favorite: false, is_active: false }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatTurn { role: Role::User, content: content.into() });
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatTurn { role: Role::Assistant, content: content.into() });
    }
}

/// Unsent message drafts keyed by conversation id.
///
/// A draft survives switching conversations; a successful send consumes
/// it via [`DraftCache::take`].
#[derive(Debug, Default)]
pub struct DraftCache {
    drafts: HashMap<i64, String>,
}

impl DraftCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a draft. An empty draft clears the slot instead.
    pub fn set(&mut self, conversation_id: i64, draft: impl Into<String>) {
        let draft = draft.into();
        if draft.is_empty() {
            self.drafts.remove(&conversation_id);
        } else {
            self.drafts.insert(conversation_id, draft);
        }
    }

    #[must_use]
    pub fn get(&self, conversation_id: i64) -> Option<&str> {
        self.drafts.get(&conversation_id).map(String::as_str)
    }

    /// Remove and return the draft for `conversation_id`.
    pub fn take(&mut self, conversation_id: i64) -> Option<String> {
        self.drafts.remove(&conversation_id)
    }

    pub fn clear(&mut self) {
        self.drafts.clear();
    }
}

#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;
