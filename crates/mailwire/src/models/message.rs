//! Message model for messages fetched from the remote mailbox

use super::{MessagePart, ThreadId};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Label marking a message as unread
pub const UNREAD_LABEL: &str = "UNREAD";

/// Unique identifier for a message (remote message ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An email address with optional display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress {
    /// Display name (e.g., "John Doe")
    pub name: Option<String>,
    /// Email address (e.g., "john@example.com")
    pub email: String,
}

impl EmailAddress {
    /// Create a new email address with just the email
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }

    /// Create a new email address with a display name
    pub fn with_name(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: email.into(),
        }
    }

    /// Parse an email address from a string like `"John Doe" <john@example.com>`
    pub fn parse(s: &str) -> Self {
        crate::threading::parse_address(s)
    }

    /// Format the address for a header value
    pub fn display(&self) -> String {
        match &self.name {
            Some(name) if name.contains([',', '"', '<', '>', '@']) => {
                format!("\"{}\" <{}>", name.replace('"', ""), self.email)
            }
            Some(name) => format!("{} <{}>", name, self.email),
            None => self.email.clone(),
        }
    }
}

/// Format a list of addresses as a comma-separated header value
pub fn format_address_list(addresses: &[EmailAddress]) -> String {
    addresses
        .iter()
        .map(EmailAddress::display)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A message as returned by one fetch from the remote mailbox
///
/// Attachment references inside `payload` belong to this fetch only.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteMessage {
    /// Remote message ID
    pub id: MessageId,
    /// ID of the thread this message belongs to
    pub thread_id: ThreadId,
    /// Label IDs (e.g., "INBOX", "SENT", "UNREAD")
    pub label_ids: Vec<String>,
    /// Server-generated preview text
    pub snippet: String,
    /// Server-assigned timestamp (milliseconds since epoch)
    pub internal_date: i64,
    /// Root of the MIME part tree, carrying the top-level headers
    pub payload: MessagePart,
}

impl RemoteMessage {
    /// Look up a top-level header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.payload.headers.get(name)
    }

    /// Whether the message carries the unread marker
    pub fn is_unread(&self) -> bool {
        self.label_ids.iter().any(|l| l == UNREAD_LABEL)
    }

    /// The internal timestamp as a UTC instant
    pub fn received_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.internal_date)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

/// The messages of one thread as fetched, in server order
#[derive(Debug, Clone, PartialEq)]
pub struct RawThread {
    pub id: ThreadId,
    pub messages: Vec<RemoteMessage>,
}
