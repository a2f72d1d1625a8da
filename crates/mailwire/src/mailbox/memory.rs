//! In-memory mailbox implementation
//!
//! Used by tests and for running the components without a remote service.
//! Attachment references are reissued on every fetch so that stale
//! references are rejected the way the real service rejects them.

use anyhow::{Context, Result, anyhow, bail};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use super::{MailboxService, MessageListEntry, MessageListPage, SentMessage};
use crate::error::AuthExpiredError;
use crate::models::{
    MessageId, MessagePart, RawThread, RemoteMessage, ThreadId, TransientAttachmentRef,
};

/// A raw message handed to `send_raw_message`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRecord {
    pub raw: String,
    pub thread_id: Option<ThreadId>,
}

/// In-memory implementation of MailboxService
///
/// Messages are stored with attachment *keys* in place of references; each
/// fetch rewrites them to `key#generation` and bumps the generation.
pub struct InMemoryMailbox {
    messages: RwLock<Vec<RemoteMessage>>,
    attachments: RwLock<HashMap<(String, String), String>>,
    generations: RwLock<HashMap<String, u64>>,
    sent: RwLock<Vec<SentRecord>>,
    failing_labels: RwLock<HashSet<String>>,
    auth_expired_labels: RwLock<HashSet<String>>,
    auth_expired: AtomicBool,
    next_sent_id: AtomicU64,
}

impl Default for InMemoryMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMailbox {
    /// Create a new empty mailbox
    pub fn new() -> Self {
        Self {
            messages: RwLock::new(Vec::new()),
            attachments: RwLock::new(HashMap::new()),
            generations: RwLock::new(HashMap::new()),
            sent: RwLock::new(Vec::new()),
            failing_labels: RwLock::new(HashSet::new()),
            auth_expired_labels: RwLock::new(HashSet::new()),
            auth_expired: AtomicBool::new(false),
            next_sent_id: AtomicU64::new(1),
        }
    }

    /// Insert or replace a message
    ///
    /// Attachment references in the part tree are treated as keys into the
    /// payloads registered with [`InMemoryMailbox::insert_attachment`].
    pub fn insert_message(&self, message: RemoteMessage) {
        let mut messages = self.messages.write().unwrap();
        match messages.iter_mut().find(|m| m.id == message.id) {
            Some(existing) => *existing = message,
            None => messages.push(message),
        }
    }

    /// Register the base64 payload behind an attachment key
    pub fn insert_attachment(&self, message_id: &MessageId, key: &str, data: impl Into<String>) {
        self.attachments
            .write()
            .unwrap()
            .insert((message_id.as_str().to_string(), key.to_string()), data.into());
    }

    /// Make every listing of this label fail
    pub fn fail_label(&self, label: &str) {
        self.failing_labels.write().unwrap().insert(label.to_string());
    }

    /// Make listings of this label fail as if credentials were revoked
    pub fn expire_auth_for_label(&self, label: &str) {
        self.auth_expired_labels
            .write()
            .unwrap()
            .insert(label.to_string());
    }

    /// Make every subsequent call fail as if credentials were revoked
    pub fn expire_auth(&self) {
        self.auth_expired.store(true, Ordering::SeqCst);
    }

    /// Messages handed to `send_raw_message`, oldest first
    pub fn sent_messages(&self) -> Vec<SentRecord> {
        self.sent.read().unwrap().clone()
    }

    /// Current labels of a stored message
    pub fn labels_of(&self, id: &MessageId) -> Option<Vec<String>> {
        self.messages
            .read()
            .unwrap()
            .iter()
            .find(|m| &m.id == id)
            .map(|m| m.label_ids.clone())
    }

    fn check_auth(&self) -> Result<()> {
        if self.auth_expired.load(Ordering::SeqCst) {
            return Err(AuthExpiredError.into());
        }
        Ok(())
    }

    /// Copy a stored message, issuing references for a new generation
    fn issue_fetch(&self, stored: &RemoteMessage) -> RemoteMessage {
        let generation = {
            let mut generations = self.generations.write().unwrap();
            let entry = generations.entry(stored.id.as_str().to_string()).or_insert(0);
            *entry += 1;
            *entry
        };

        let mut fetched = stored.clone();
        let mut stack: Vec<&mut MessagePart> = vec![&mut fetched.payload];
        while let Some(part) = stack.pop() {
            if let Some(key) = part.body.attachment_ref.take() {
                part.body.attachment_ref = Some(TransientAttachmentRef::new(format!(
                    "{}#{}",
                    key.as_str(),
                    generation
                )));
            }
            stack.extend(part.children.iter_mut());
        }
        fetched
    }
}

impl MailboxService for InMemoryMailbox {
    fn fetch_message(&self, id: &MessageId) -> Result<RemoteMessage> {
        self.check_auth()?;
        let stored = self
            .messages
            .read()
            .unwrap()
            .iter()
            .find(|m| &m.id == id)
            .cloned()
            .with_context(|| format!("Message {} not found", id))?;
        Ok(self.issue_fetch(&stored))
    }

    fn fetch_thread(&self, id: &ThreadId) -> Result<RawThread> {
        self.check_auth()?;
        let stored: Vec<RemoteMessage> = self
            .messages
            .read()
            .unwrap()
            .iter()
            .filter(|m| &m.thread_id == id)
            .cloned()
            .collect();
        Ok(RawThread {
            id: id.clone(),
            messages: stored.iter().map(|m| self.issue_fetch(m)).collect(),
        })
    }

    fn list_messages(
        &self,
        label_id: Option<&str>,
        page_size: usize,
        page_token: Option<&str>,
    ) -> Result<MessageListPage> {
        self.check_auth()?;
        if let Some(label) = label_id
            && self.auth_expired_labels.read().unwrap().contains(label)
        {
            return Err(AuthExpiredError.into());
        }
        if let Some(label) = label_id
            && self.failing_labels.read().unwrap().contains(label)
        {
            bail!("Listing label {} failed", label);
        }

        let offset: usize = match page_token {
            Some(token) => token.parse().context("Invalid page token")?,
            None => 0,
        };

        let mut matching: Vec<RemoteMessage> = self
            .messages
            .read()
            .unwrap()
            .iter()
            .filter(|m| label_id.is_none_or(|label| m.label_ids.iter().any(|l| l == label)))
            .cloned()
            .collect();
        matching.sort_by_key(|m| Reverse(m.internal_date));

        let page_size = page_size.max(1);
        let messages = matching
            .iter()
            .skip(offset)
            .take(page_size)
            .map(|m| MessageListEntry {
                id: m.id.clone(),
                thread_id: m.thread_id.clone(),
                snippet: Some(m.snippet.clone()),
            })
            .collect();
        let next_page_token =
            (offset + page_size < matching.len()).then(|| (offset + page_size).to_string());

        Ok(MessageListPage {
            messages,
            next_page_token,
        })
    }

    fn fetch_attachment_bytes(
        &self,
        message_id: &MessageId,
        reference: &TransientAttachmentRef,
    ) -> Result<String> {
        self.check_auth()?;
        let (key, generation) = reference
            .as_str()
            .rsplit_once('#')
            .context("Malformed attachment reference")?;
        let generation: u64 = generation.parse().context("Malformed attachment reference")?;

        let current = self
            .generations
            .read()
            .unwrap()
            .get(message_id.as_str())
            .copied();
        if current != Some(generation) {
            bail!("Stale attachment reference for message {}", message_id);
        }

        self.attachments
            .read()
            .unwrap()
            .get(&(message_id.as_str().to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| anyhow!("Attachment {} not found", key))
    }

    fn send_raw_message(&self, raw: &str, thread_id: Option<&ThreadId>) -> Result<SentMessage> {
        self.check_auth()?;
        let n = self.next_sent_id.fetch_add(1, Ordering::SeqCst);
        self.sent.write().unwrap().push(SentRecord {
            raw: raw.to_string(),
            thread_id: thread_id.cloned(),
        });

        Ok(SentMessage {
            id: MessageId::new(format!("sent-{}", n)),
            thread_id: thread_id
                .cloned()
                .unwrap_or_else(|| ThreadId::new(format!("thread-sent-{}", n))),
            label_ids: vec!["SENT".to_string()],
        })
    }

    fn modify_labels(
        &self,
        message_ids: &[MessageId],
        add: &[&str],
        remove: &[&str],
    ) -> Result<()> {
        self.check_auth()?;
        let mut messages = self.messages.write().unwrap();
        for id in message_ids {
            let message = messages
                .iter_mut()
                .find(|m| &m.id == id)
                .with_context(|| format!("Message {} not found", id))?;
            message.label_ids.retain(|l| !remove.contains(&l.as_str()));
            for label in add {
                if !message.label_ids.iter().any(|l| l == label) {
                    message.label_ids.push(label.to_string());
                }
            }
        }
        Ok(())
    }
}
