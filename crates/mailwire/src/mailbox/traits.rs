//! Remote mailbox service boundary

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::models::{MessageId, RawThread, RemoteMessage, ThreadId, TransientAttachmentRef};

/// One entry of a message listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageListEntry {
    pub id: MessageId,
    pub thread_id: ThreadId,
    pub snippet: Option<String>,
}

/// One page of a message listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageListPage {
    pub messages: Vec<MessageListEntry>,
    pub next_page_token: Option<String>,
}

/// Result of sending a raw message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
    pub id: MessageId,
    pub thread_id: ThreadId,
    pub label_ids: Vec<String>,
}

/// Operations consumed from the remote mailbox service
///
/// Implementations report rejected credentials by returning
/// [`AuthExpiredError`](crate::error::AuthExpiredError) inside the error.
pub trait MailboxService: Send + Sync {
    /// Fetch one message with its full part tree
    ///
    /// Every call issues fresh attachment references.
    fn fetch_message(&self, id: &MessageId) -> Result<RemoteMessage>;

    /// Fetch every message of a thread, in whatever order the server uses
    fn fetch_thread(&self, id: &ThreadId) -> Result<RawThread>;

    /// List messages, optionally restricted to one label
    fn list_messages(
        &self,
        label_id: Option<&str>,
        page_size: usize,
        page_token: Option<&str>,
    ) -> Result<MessageListPage>;

    /// Download an attachment payload (base64) through a reference from the latest fetch
    fn fetch_attachment_bytes(
        &self,
        message_id: &MessageId,
        reference: &TransientAttachmentRef,
    ) -> Result<String>;

    /// Send a message given as a transport token
    fn send_raw_message(&self, raw: &str, thread_id: Option<&ThreadId>) -> Result<SentMessage>;

    /// Add and remove labels on a set of messages
    fn modify_labels(&self, message_ids: &[MessageId], add: &[&str], remove: &[&str])
    -> Result<()>;
}
