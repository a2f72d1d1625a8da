//! Mail actions facade
//!
//! Coordinates composition, attachment access, thread assembly and label
//! changes against one remote mailbox.

use std::sync::Arc;

use crate::attachments::AttachmentIndexer;
use crate::compose::{self, ComposeFields, ComposedMessage, OutgoingAttachment, ReplyDraft};
use crate::config::MailConfig;
use crate::error::{MailError, Result};
use crate::logging::ComponentLogger;
use crate::mailbox::{MailboxService, SentMessage};
use crate::models::{
    AttachmentDescriptor, DownloadedAttachment, MessageId, RemoteMessage, StableAttachmentId,
    ThreadId, ThreadStubPage, ThreadSummary,
};
use crate::thread::{LabelAggregate, ThreadAssembler};

/// Label IDs used by Gmail for common states
pub mod labels {
    pub const INBOX: &str = "INBOX";
    pub const UNREAD: &str = "UNREAD";
    pub const STARRED: &str = "STARRED";
    pub const TRASH: &str = "TRASH";
}

/// A label change applied to a set of messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelAction {
    Archive,
    Unarchive,
    MarkRead,
    MarkUnread,
    Star,
    Unstar,
    Trash,
}

impl LabelAction {
    /// Labels to add and labels to remove
    pub fn label_changes(self) -> (&'static [&'static str], &'static [&'static str]) {
        match self {
            LabelAction::Archive => (&[], &[labels::INBOX]),
            LabelAction::Unarchive => (&[labels::INBOX], &[]),
            LabelAction::MarkRead => (&[], &[labels::UNREAD]),
            LabelAction::MarkUnread => (&[labels::UNREAD], &[]),
            LabelAction::Star => (&[labels::STARRED], &[]),
            LabelAction::Unstar => (&[], &[labels::STARRED]),
            LabelAction::Trash => (&[labels::TRASH], &[labels::INBOX]),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LabelAction::Archive => "archive",
            LabelAction::Unarchive => "unarchive",
            LabelAction::MarkRead => "mark-read",
            LabelAction::MarkUnread => "mark-unread",
            LabelAction::Star => "star",
            LabelAction::Unstar => "unstar",
            LabelAction::Trash => "trash",
        }
    }
}

/// Entry point for calling application code
///
/// Every operation is synchronous; remote calls happen in sequence and
/// failures are wrapped with the name of the attempted operation.
pub struct MailActions {
    mailbox: Arc<dyn MailboxService>,
    config: MailConfig,
    attachments: AttachmentIndexer,
    threads: ThreadAssembler,
    log: ComponentLogger,
}

impl MailActions {
    /// Create the facade; `log` is reused for the sub-components
    pub fn new(mailbox: Arc<dyn MailboxService>, config: MailConfig, log: ComponentLogger) -> Self {
        let attachments = AttachmentIndexer::new(
            mailbox.clone(),
            &config,
            log.for_component("attachments"),
        );
        let threads = ThreadAssembler::new(mailbox.clone(), log.for_component("thread"));
        Self {
            mailbox,
            config,
            attachments,
            threads,
            log: log.for_component("actions"),
        }
    }

    pub fn config(&self) -> &MailConfig {
        &self.config
    }

    /// Compose a reply without sending it
    pub fn build_reply(
        &self,
        original: &RemoteMessage,
        draft: &ReplyDraft,
    ) -> Result<ComposedMessage> {
        compose::build_reply(original, draft, &self.config)
    }

    /// Compose a multipart message without sending it
    pub fn build_multipart(
        &self,
        fields: &ComposeFields,
        attachments: &[OutgoingAttachment],
    ) -> Result<ComposedMessage> {
        compose::build_multipart(fields, attachments, &self.config)
    }

    /// Reply to a message: fetch it, compose the reply, send it
    pub fn reply(&self, message_id: &MessageId, draft: &ReplyDraft) -> Result<SentMessage> {
        let original = self
            .mailbox
            .fetch_message(message_id)
            .map_err(|e| MailError::remote("fetch_message", e))?;
        let composed = self.build_reply(&original, draft)?;

        self.log.info(format_args!(
            "Sending reply to {} in thread {}",
            message_id, original.thread_id
        ));
        self.send_composed(composed)
    }

    /// Compose and send a free-form message
    pub fn send(
        &self,
        fields: &ComposeFields,
        attachments: &[OutgoingAttachment],
    ) -> Result<SentMessage> {
        let composed = self.build_multipart(fields, attachments)?;
        self.log.info(format_args!(
            "Sending message with {} attachments",
            attachments.len()
        ));
        self.send_composed(composed)
    }

    fn send_composed(&self, composed: ComposedMessage) -> Result<SentMessage> {
        let sent = self
            .mailbox
            .send_raw_message(&composed.raw, composed.thread_id.as_ref())
            .map_err(|e| MailError::remote("send_raw_message", e))?;
        self.log.debug(format_args!(
            "Sent {} as {} (thread {})",
            composed.message_id, sent.id, sent.thread_id
        ));
        Ok(sent)
    }

    pub fn list_attachments(&self, message_id: &MessageId) -> Result<Vec<AttachmentDescriptor>> {
        self.attachments.list(message_id)
    }

    pub fn download_attachment(
        &self,
        message_id: &MessageId,
        stable_id: &StableAttachmentId,
    ) -> Result<DownloadedAttachment> {
        self.attachments.download(message_id, stable_id)
    }

    pub fn get_thread(&self, thread_id: &ThreadId) -> Result<ThreadSummary> {
        self.threads.get_thread(thread_id)
    }

    /// One page of stubs; `page_size` 0 uses the configured default
    pub fn list_thread_stubs(
        &self,
        label_id: Option<&str>,
        page_size: usize,
        page_token: Option<&str>,
    ) -> Result<ThreadStubPage> {
        self.threads
            .list_thread_stubs(label_id, self.page_size(page_size), page_token)
    }

    pub fn collect_label_stubs(
        &self,
        labels: &[String],
        page_size: usize,
    ) -> Result<LabelAggregate> {
        self.threads
            .collect_label_stubs(labels, self.page_size(page_size))
    }

    /// Apply a label change to every given message
    ///
    /// An empty id list is a no-op.
    pub fn apply_label_action(&self, message_ids: &[MessageId], action: LabelAction) -> Result<()> {
        if message_ids.is_empty() {
            return Ok(());
        }

        let (add, remove) = action.label_changes();
        self.log.info(format_args!(
            "Applying {} to {} messages",
            action.as_str(),
            message_ids.len()
        ));
        self.mailbox
            .modify_labels(message_ids, add, remove)
            .map_err(|e| MailError::remote("modify_labels", e))
    }

    fn page_size(&self, requested: usize) -> usize {
        if requested == 0 {
            self.config.default_page_size
        } else {
            requested
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;
    use crate::mailbox::InMemoryMailbox;
    use crate::models::{EmailAddress, MessagePart};
    use crate::mime::codec::decode_transport_token;

    fn setup() -> (Arc<InMemoryMailbox>, MailActions, Arc<MemorySink>) {
        let mailbox = Arc::new(InMemoryMailbox::new());
        let sink = Arc::new(MemorySink::new());
        let actions = MailActions::new(
            mailbox.clone(),
            MailConfig::default(),
            ComponentLogger::new("actions", sink.clone()),
        );
        (mailbox, actions, sink)
    }

    fn message(id: &str, labels: &[&str]) -> RemoteMessage {
        RemoteMessage {
            id: MessageId::new(id),
            thread_id: ThreadId::new("t1"),
            label_ids: labels.iter().map(|l| l.to_string()).collect(),
            snippet: String::new(),
            internal_date: 1,
            payload: MessagePart {
                headers: [("Subject", "Plan"), ("Message-ID", "<orig@x>")]
                    .into_iter()
                    .collect(),
                ..MessagePart::new("text/plain")
            },
        }
    }

    #[test]
    fn test_label_changes_are_disjoint() {
        let all = [
            LabelAction::Archive,
            LabelAction::Unarchive,
            LabelAction::MarkRead,
            LabelAction::MarkUnread,
            LabelAction::Star,
            LabelAction::Unstar,
            LabelAction::Trash,
        ];
        for action in all {
            let (add, remove) = action.label_changes();
            assert!(!add.is_empty() || !remove.is_empty());
            assert!(add.iter().all(|l| !remove.contains(l)), "{:?}", action);
        }
    }

    #[test]
    fn test_apply_label_action() {
        let (mailbox, actions, _) = setup();
        mailbox.insert_message(message("m1", &["INBOX", "UNREAD"]));
        let ids = vec![MessageId::new("m1")];

        actions.apply_label_action(&ids, LabelAction::Archive).unwrap();
        actions.apply_label_action(&ids, LabelAction::MarkRead).unwrap();
        actions.apply_label_action(&ids, LabelAction::Star).unwrap();

        assert_eq!(mailbox.labels_of(&ids[0]), Some(vec!["STARRED".to_string()]));
    }

    #[test]
    fn test_apply_label_action_empty_is_noop() {
        let (mailbox, actions, sink) = setup();
        mailbox.expire_auth();
        actions.apply_label_action(&[], LabelAction::Trash).unwrap();
        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_reply_sends_into_original_thread() {
        let (mailbox, actions, sink) = setup();
        mailbox.insert_message(message("m1", &["INBOX"]));

        let draft = ReplyDraft {
            to: vec![EmailAddress::new("alice@example.com")],
            body_html: "<p>ok</p>".to_string(),
            ..ReplyDraft::default()
        };
        let sent = actions.reply(&MessageId::new("m1"), &draft).unwrap();
        assert_eq!(sent.thread_id, ThreadId::new("t1"));

        let records = mailbox.sent_messages();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].thread_id, Some(ThreadId::new("t1")));
        let raw = decode_transport_token(&records[0].raw).unwrap();
        assert!(raw.contains("\r\nIn-Reply-To: <orig@x>\r\n"));
        assert!(raw.contains("Subject: Re: Plan\r\n"));

        let info = sink.at_level(log::Level::Info);
        assert!(info.iter().all(|r| r.component == "actions"));
        assert!(!info.is_empty());
    }

    #[test]
    fn test_reply_missing_original_is_remote_error() {
        let (_, actions, _) = setup();
        let err = actions
            .reply(&MessageId::new("missing"), &ReplyDraft::default())
            .unwrap_err();
        assert!(matches!(
            err,
            MailError::Remote {
                operation: "fetch_message",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_message_is_not_sent() {
        let (mailbox, actions, _) = setup();
        let fields = ComposeFields {
            to: vec![EmailAddress::new("bob@example.com")],
            subject: String::new(),
            ..ComposeFields::default()
        };
        assert!(actions.send(&fields, &[]).is_err());
        assert!(mailbox.sent_messages().is_empty());
    }

    #[test]
    fn test_default_page_size() {
        let (mailbox, actions, _) = setup();
        for i in 0..60 {
            let mut m = message(&format!("m{}", i), &["INBOX"]);
            m.internal_date = i;
            mailbox.insert_message(m);
        }
        let page = actions.list_thread_stubs(Some("INBOX"), 0, None).unwrap();
        assert_eq!(page.stubs.len(), 50);
        assert!(page.next_page_token.is_some());
    }
}
