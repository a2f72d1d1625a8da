//! Thread assembly
//!
//! Turns the raw messages of a thread into a [`ThreadSummary`]: messages in
//! chronological order plus thread-level aggregates.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::attachments::has_attachment;
use crate::error::{MailError, Result};
use crate::logging::ComponentLogger;
use crate::mailbox::{MailboxService, MessageListPage};
use crate::models::{
    MessageSummary, Participant, RawThread, RemoteMessage, ThreadId, ThreadStub, ThreadStubPage,
    ThreadSummary,
};
use crate::threading::{self, parse_address, parse_address_list};

/// Build a thread summary from the messages of one fetch
///
/// Fails with `OperationFailed` when the thread has no messages.
pub fn assemble(raw: RawThread) -> Result<ThreadSummary> {
    let RawThread {
        id: thread_id,
        mut messages,
    } = raw;

    if messages.is_empty() {
        return Err(MailError::OperationFailed(format!(
            "Thread {} has no messages",
            thread_id
        )));
    }

    // Stable sort: equal timestamps keep server order
    messages.sort_by_key(|m| m.internal_date);

    let summaries: Vec<MessageSummary> = messages.iter().map(summarize_message).collect();
    let participants = collect_participants(&summaries);

    let (Some(first), Some(last)) = (summaries.first(), summaries.last()) else {
        return Err(MailError::OperationFailed(format!(
            "Thread {} has no messages",
            thread_id
        )));
    };

    Ok(ThreadSummary {
        thread_id,
        subject: first.subject.clone(),
        first_message_timestamp: first.internal_date,
        snippet: last.snippet.clone(),
        labels: last.label_ids.clone(),
        last_message_timestamp: last.internal_date,
        has_unread: summaries.iter().any(|m| m.is_unread),
        has_attachments: summaries.iter().any(|m| m.has_attachments),
        participants,
        messages: summaries,
    })
}

/// Per-message view used inside a thread summary
pub fn summarize_message(message: &RemoteMessage) -> MessageSummary {
    let context = threading::extract(message);

    MessageSummary {
        id: message.id.clone(),
        thread_id: message.thread_id.clone(),
        subject: context.subject,
        from: context.from.as_deref().map(parse_address),
        to: context
            .to
            .as_deref()
            .map(parse_address_list)
            .unwrap_or_default(),
        message_id: context.message_id,
        in_reply_to: context.in_reply_to,
        references: context.references.unwrap_or_default(),
        snippet: message.snippet.clone(),
        label_ids: message.label_ids.clone(),
        internal_date: message.internal_date,
        received_at: message.received_at(),
        is_unread: message.is_unread(),
        has_attachments: has_attachment(&message.payload),
    }
}

/// Union of senders and recipients, keyed by lowercase email
///
/// The first display name seen for an address wins.
fn collect_participants(messages: &[MessageSummary]) -> Vec<Participant> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut participants = Vec::new();

    let addresses = messages
        .iter()
        .flat_map(|m| m.from.iter().chain(m.to.iter()));
    for address in addresses {
        let key = address.email.trim().to_lowercase();
        if key.is_empty() || !seen.insert(key) {
            continue;
        }
        participants.push(Participant {
            email: address.email.trim().to_string(),
            display_name: address.name.clone(),
        });
    }

    participants
}

/// Stubs gathered from several labels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelAggregate {
    /// Stubs in label order, each label's stubs in server order
    pub stubs: Vec<ThreadStub>,
    pub succeeded_labels: Vec<String>,
    pub failed_labels: Vec<String>,
}

/// Fetches and assembles threads through the remote mailbox
pub struct ThreadAssembler {
    mailbox: Arc<dyn MailboxService>,
    log: ComponentLogger,
}

impl ThreadAssembler {
    pub fn new(mailbox: Arc<dyn MailboxService>, log: ComponentLogger) -> Self {
        Self { mailbox, log }
    }

    /// Fetch a thread and assemble it
    pub fn get_thread(&self, thread_id: &ThreadId) -> Result<ThreadSummary> {
        let raw = self
            .mailbox
            .fetch_thread(thread_id)
            .map_err(|e| MailError::remote("fetch_thread", e))?;

        self.log.debug(format_args!(
            "Assembling thread {} ({} messages)",
            thread_id,
            raw.messages.len()
        ));
        assemble(raw)
    }

    /// One page of message stubs, in the order the server returns them
    pub fn list_thread_stubs(
        &self,
        label_id: Option<&str>,
        page_size: usize,
        page_token: Option<&str>,
    ) -> Result<ThreadStubPage> {
        let page = self
            .mailbox
            .list_messages(label_id, page_size, page_token)
            .map_err(|e| MailError::remote("list_messages", e))?;
        Ok(to_stub_page(page))
    }

    /// List the first page of several labels concurrently
    ///
    /// A failing label is logged and skipped. Fails only when every label
    /// failed, or with `AuthExpired` as soon as any label reports it.
    pub fn collect_label_stubs(
        &self,
        labels: &[String],
        page_size: usize,
    ) -> Result<LabelAggregate> {
        let results: Vec<(&String, Result<ThreadStubPage>)> = labels
            .par_iter()
            .map(|label| (label, self.list_thread_stubs(Some(label), page_size, None)))
            .collect();

        let mut aggregate = LabelAggregate::default();
        let mut auth_error = None;
        for (label, result) in results {
            match result {
                Ok(page) => {
                    aggregate.stubs.extend(page.stubs);
                    aggregate.succeeded_labels.push(label.clone());
                }
                Err(e) => {
                    self.log
                        .warn(format_args!("Skipping label {}: {}", label, e));
                    aggregate.failed_labels.push(label.clone());
                    if auth_error.is_none() && e.is_auth_expired() {
                        auth_error = Some(e);
                    }
                }
            }
        }

        // Expired credentials take precedence over partial results
        if let Some(e) = auth_error {
            return Err(e);
        }

        if !labels.is_empty() && aggregate.succeeded_labels.is_empty() {
            return Err(MailError::OperationFailed(format!(
                "Listing failed for every label: {}",
                aggregate.failed_labels.join(", ")
            )));
        }

        self.log.info(format_args!(
            "Collected {} stubs from {} of {} labels",
            aggregate.stubs.len(),
            aggregate.succeeded_labels.len(),
            labels.len()
        ));
        Ok(aggregate)
    }
}

fn to_stub_page(page: MessageListPage) -> ThreadStubPage {
    ThreadStubPage {
        stubs: page
            .messages
            .into_iter()
            .map(|entry| ThreadStub {
                id: entry.id,
                thread_id: entry.thread_id,
                snippet: entry.snippet.unwrap_or_default(),
            })
            .collect(),
        next_page_token: page.next_page_token,
    }
}
