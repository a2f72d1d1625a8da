//! Thread model representing an assembled conversation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EmailAddress, MessageId};

/// Unique identifier for a thread (remote thread ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub String);

impl ThreadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ThreadId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ThreadId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A person who sent or received a message in the thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub email: String,
    pub display_name: Option<String>,
}

/// Per-message view inside an assembled thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSummary {
    pub id: MessageId,
    pub thread_id: ThreadId,
    pub subject: String,
    pub from: Option<EmailAddress>,
    pub to: Vec<EmailAddress>,
    /// RFC 5322 Message-ID header
    pub message_id: Option<String>,
    pub in_reply_to: Option<String>,
    pub references: Vec<String>,
    pub snippet: String,
    pub label_ids: Vec<String>,
    /// Server-assigned timestamp (milliseconds since epoch)
    pub internal_date: i64,
    pub received_at: DateTime<Utc>,
    pub is_unread: bool,
    pub has_attachments: bool,
}

/// A whole thread, sorted oldest first, with aggregates
///
/// Built fresh on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub thread_id: ThreadId,
    pub messages: Vec<MessageSummary>,
    /// Unique by case-insensitive email, in first-seen order
    pub participants: Vec<Participant>,
    /// Subject of the earliest message
    pub subject: String,
    /// Snippet of the latest message
    pub snippet: String,
    /// Labels of the latest message
    pub labels: Vec<String>,
    pub first_message_timestamp: i64,
    pub last_message_timestamp: i64,
    pub has_unread: bool,
    pub has_attachments: bool,
}

impl ThreadSummary {
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

/// Lightweight listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadStub {
    pub id: MessageId,
    pub thread_id: ThreadId,
    pub snippet: String,
}

/// One page of stubs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadStubPage {
    pub stubs: Vec<ThreadStub>,
    pub next_page_token: Option<String>,
}
