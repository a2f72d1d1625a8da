//! Integration tests for the mailwire crate
//!
//! These tests drive the public facade against the in-memory mailbox and
//! check the wire bytes and error surfaces end to end.

use std::sync::Arc;

use log::Level;
use mailwire::mime::codec::{decode_transport_token, encode_base64};
use mailwire::models::{StableAttachmentId, TransientAttachmentRef};
use mailwire::{
    ComponentLogger, ComposeFields, EmailAddress, InMemoryMailbox, LabelAction, MailActions,
    MailConfig, MailError, MailboxService, MemorySink, MessageId, MessagePart,
    OutgoingAttachment, RemoteMessage, ReplyDraft, ThreadId,
};

struct Harness {
    mailbox: Arc<InMemoryMailbox>,
    actions: MailActions,
    sink: Arc<MemorySink>,
}

fn harness_with(config: MailConfig) -> Harness {
    let mailbox = Arc::new(InMemoryMailbox::new());
    let sink = Arc::new(MemorySink::new());
    let actions = MailActions::new(
        mailbox.clone(),
        config,
        ComponentLogger::new("actions", sink.clone()),
    );
    Harness {
        mailbox,
        actions,
        sink,
    }
}

impl Harness {
    fn fetch(&self, id: &str) -> RemoteMessage {
        self.mailbox.fetch_message(&MessageId::new(id)).unwrap()
    }
}

fn harness() -> Harness {
    harness_with(MailConfig::default())
}

fn message(id: &str, thread: &str, date: i64, headers: &[(&str, &str)]) -> RemoteMessage {
    RemoteMessage {
        id: MessageId::new(id),
        thread_id: ThreadId::new(thread),
        label_ids: vec!["INBOX".to_string()],
        snippet: format!("snippet {}", id),
        internal_date: date,
        payload: MessagePart {
            headers: headers.iter().copied().collect(),
            ..MessagePart::new("text/plain")
        },
    }
}

/// A message with an inline body and two attachments
fn message_with_attachments(id: &str) -> RemoteMessage {
    RemoteMessage {
        payload: MessagePart::new("multipart/mixed")
            .with_header("Subject", "Files")
            .with_children(vec![
                MessagePart::new("text/plain").with_data("aGk"),
                MessagePart::new("application/pdf")
                    .with_filename("report.pdf")
                    .with_attachment_ref(TransientAttachmentRef::new("pdf"), 11),
                MessagePart::new("image/png")
                    .with_header("Content-Disposition", "attachment; filename=\"chart.png\"")
                    .with_attachment_ref(TransientAttachmentRef::new("png"), 4),
            ]),
        ..message(id, "t-files", 1, &[])
    }
}

fn header_value<'a>(raw: &'a str, name: &str) -> Option<&'a str> {
    let prefix = format!("{}: ", name);
    raw.split("\r\n")
        .take_while(|line| !line.is_empty())
        .find_map(|line| line.strip_prefix(prefix.as_str()))
}

#[test]
fn test_reply_round_trip() {
    let h = harness();
    h.mailbox.insert_message(message(
        "m2",
        "t1",
        200,
        &[
            ("Subject", "Re: Launch"),
            ("From", "Alice <alice@example.com>"),
            ("Message-ID", "<m2@example.com>"),
            ("In-Reply-To", "<m1@example.com>"),
            ("References", "<m1@example.com>"),
        ],
    ));

    let draft = ReplyDraft {
        from: Some(EmailAddress::with_name("Bob", "bob@example.org")),
        to: vec![EmailAddress::with_name("Alice", "alice@example.com")],
        body_html: "<p>Ship it</p>".to_string(),
        body_text: Some("Ship it".to_string()),
        ..ReplyDraft::default()
    };
    let sent = h.actions.reply(&MessageId::new("m2"), &draft).unwrap();
    assert_eq!(sent.thread_id, ThreadId::new("t1"));

    let records = h.mailbox.sent_messages();
    assert_eq!(records.len(), 1);
    let raw = decode_transport_token(&records[0].raw).unwrap();

    assert_eq!(header_value(&raw, "Subject"), Some("Re: Launch"));
    assert_eq!(header_value(&raw, "In-Reply-To"), Some("<m2@example.com>"));
    assert_eq!(
        header_value(&raw, "References"),
        Some("<m1@example.com> <m2@example.com>")
    );
    assert_eq!(header_value(&raw, "MIME-Version"), Some("1.0"));

    let content_type = header_value(&raw, "Content-Type").unwrap();
    let boundary = content_type
        .strip_prefix("multipart/alternative; boundary=\"")
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap();
    assert_eq!(raw.matches(&format!("--{}\r\n", boundary)).count(), 2);
    assert!(raw.ends_with(&format!("--{}--", boundary)));
    assert!(!raw.contains("\n\n"));
}

#[test]
fn test_reply_chain_grows_without_duplicates() {
    let h = harness();
    h.mailbox.insert_message(message(
        "m3",
        "t1",
        300,
        &[
            ("Subject", "Re: Launch"),
            ("Message-ID", "<m3@example.com>"),
            ("References", "<m1@example.com>\r\n <m2@example.com>   <m3@example.com>"),
        ],
    ));

    let draft = ReplyDraft {
        to: vec![EmailAddress::new("alice@example.com")],
        body_html: "ok".to_string(),
        ..ReplyDraft::default()
    };
    let original = h.fetch("m3");
    let composed = h.actions.build_reply(&original, &draft).unwrap();
    let raw = decode_transport_token(&composed.raw).unwrap();
    assert_eq!(
        header_value(&raw, "References"),
        Some("<m1@example.com> <m2@example.com> <m3@example.com>")
    );
}

#[test]
fn test_send_with_attachment() {
    let h = harness();
    let fields = ComposeFields {
        from: Some(EmailAddress::new("me@example.org")),
        to: vec![EmailAddress::new("you@example.com")],
        subject: "Rapport trimestriel é".to_string(),
        html: Some("<p>Voir pièce jointe</p>".to_string()),
        ..ComposeFields::default()
    };
    let data = encode_base64(&[7u8; 200]);
    let attachment = OutgoingAttachment {
        filename: "rapport \"final\".pdf".to_string(),
        mime_type: "application/pdf".to_string(),
        data_base64: data,
    };

    let sent = h.actions.send(&fields, &[attachment]).unwrap();
    assert!(sent.thread_id.as_str().starts_with("thread-sent-"));

    let raw = decode_transport_token(&h.mailbox.sent_messages()[0].raw).unwrap();
    assert!(header_value(&raw, "Subject").unwrap().starts_with("=?UTF-8?B?"));
    assert!(raw.contains("Content-Type: multipart/mixed; boundary="));
    assert!(raw.contains("Content-Disposition: attachment; filename=\"rapport final.pdf\""));
    assert!(raw.contains("Content-Transfer-Encoding: 8bit"));
    for line in raw.split("\r\n") {
        assert!(line.len() <= 998, "line too long: {}", line.len());
    }
}

#[test]
fn test_list_and_download_attachments() {
    let h = harness();
    let id = MessageId::new("f1");
    h.mailbox.insert_message(message_with_attachments("f1"));
    h.mailbox.insert_attachment(&id, "pdf", encode_base64(b"%PDF-1.7..."));
    h.mailbox.insert_attachment(&id, "png", encode_base64(&[0x89, b'P', b'N', b'G']));

    let listed = h.actions.list_attachments(&id).unwrap();
    let ids: Vec<&str> = listed.iter().map(|a| a.stable_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
    assert_eq!(listed[1].filename, "chart.png");

    // The references from the listing are stale by now; download refetches
    let pdf = h
        .actions
        .download_attachment(&id, &StableAttachmentId::new("1"))
        .unwrap();
    assert_eq!(pdf.bytes, b"%PDF-1.7...");
    assert_eq!(pdf.filename, "report.pdf");
    assert_eq!(pdf.mime_type, "application/pdf");
    assert_eq!(pdf.size_bytes, 11);

    let png = h
        .actions
        .download_attachment(&id, &StableAttachmentId::new("2"))
        .unwrap();
    assert_eq!(png.bytes, vec![0x89, b'P', b'N', b'G']);

    let downloads = h
        .sink
        .records()
        .into_iter()
        .filter(|r| r.component == "attachments" && r.level == Level::Info)
        .count();
    assert_eq!(downloads, 2);
}

#[test]
fn test_download_missing_after_message_changed() {
    let h = harness();
    let id = MessageId::new("f1");
    h.mailbox.insert_message(message_with_attachments("f1"));

    // The server now returns the message without its attachments
    h.mailbox
        .insert_message(message("f1", "t-files", 1, &[("Subject", "Files")]));

    let err = h
        .actions
        .download_attachment(&id, &StableAttachmentId::new("2"))
        .unwrap_err();
    match err {
        MailError::NotFound {
            message_id,
            stable_id,
        } => {
            assert_eq!(message_id, "f1");
            assert_eq!(stable_id, "2");
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_download_over_limit() {
    let h = harness_with(MailConfig {
        max_attachment_bytes: 8,
        ..MailConfig::default()
    });
    let id = MessageId::new("f1");
    h.mailbox.insert_message(message_with_attachments("f1"));
    h.mailbox.insert_attachment(&id, "pdf", encode_base64(b"%PDF-1.7..."));

    let err = h
        .actions
        .download_attachment(&id, &StableAttachmentId::new("1"))
        .unwrap_err();
    assert!(matches!(err, MailError::SizeExceeded { size: 11, limit: 8 }));
}

#[test]
fn test_thread_assembly() {
    let h = harness();
    h.mailbox.insert_message(message(
        "c",
        "t1",
        300,
        &[("Subject", "Re: Launch"), ("From", "Carol <carol@example.com>")],
    ));
    h.mailbox.insert_message(message(
        "a",
        "t1",
        100,
        &[
            ("Subject", "Launch"),
            ("From", "Alice <alice@example.com>"),
            ("To", "carol@example.com, Bob <bob@example.com>"),
        ],
    ));
    h.mailbox.insert_message(message("x", "other", 200, &[("Subject", "Other")]));

    let thread = h.actions.get_thread(&ThreadId::new("t1")).unwrap();
    let ids: Vec<&str> = thread.messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c"]);
    assert_eq!(thread.subject, "Launch");
    assert_eq!(thread.snippet, "snippet c");

    let emails: Vec<&str> = thread.participants.iter().map(|p| p.email.as_str()).collect();
    assert_eq!(
        emails,
        vec!["alice@example.com", "carol@example.com", "bob@example.com"]
    );
    // First-seen name for carol is the bare address in message a
    assert_eq!(thread.participants[1].display_name, None);

    let err = h.actions.get_thread(&ThreadId::new("empty")).unwrap_err();
    assert!(matches!(err, MailError::OperationFailed(_)));
}

#[test]
fn test_multi_label_partial_failure() {
    let h = harness();
    let mut starred = message("s", "t2", 10, &[]);
    starred.label_ids = vec!["STARRED".to_string()];
    h.mailbox.insert_message(message("i", "t1", 20, &[]));
    h.mailbox.insert_message(starred);
    h.mailbox.fail_label("IMPORTANT");

    let labels = vec![
        "INBOX".to_string(),
        "IMPORTANT".to_string(),
        "STARRED".to_string(),
    ];
    let aggregate = h.actions.collect_label_stubs(&labels, 0).unwrap();
    assert_eq!(aggregate.failed_labels, vec!["IMPORTANT"]);
    assert_eq!(aggregate.stubs.len(), 2);

    let warnings = h.sink.at_level(Level::Warn);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].component, "thread");
}

#[test]
fn test_label_actions() {
    let h = harness();
    let id = MessageId::new("m1");
    h.mailbox.insert_message(message("m1", "t1", 1, &[]));

    h.actions.apply_label_action(&[id.clone()], LabelAction::Trash).unwrap();
    assert_eq!(h.mailbox.labels_of(&id), Some(vec!["TRASH".to_string()]));

    h.actions
        .apply_label_action(&[id.clone()], LabelAction::Unarchive)
        .unwrap();
    assert_eq!(
        h.mailbox.labels_of(&id),
        Some(vec!["TRASH".to_string(), "INBOX".to_string()])
    );
}

#[test]
fn test_auth_expired_surfaces_everywhere() {
    let h = harness();
    h.mailbox.insert_message(message_with_attachments("f1"));
    h.mailbox.expire_auth();
    let id = MessageId::new("f1");

    let draft = ReplyDraft {
        to: vec![EmailAddress::new("a@example.com")],
        body_html: "x".to_string(),
        ..ReplyDraft::default()
    };
    let errors = vec![
        h.actions.reply(&id, &draft).unwrap_err(),
        h.actions.list_attachments(&id).unwrap_err(),
        h.actions
            .download_attachment(&id, &StableAttachmentId::new("1"))
            .unwrap_err(),
        h.actions.get_thread(&ThreadId::new("t-files")).unwrap_err(),
        h.actions.list_thread_stubs(None, 10, None).unwrap_err(),
        h.actions
            .apply_label_action(&[id.clone()], LabelAction::Star)
            .unwrap_err(),
    ];
    for err in errors {
        assert!(err.is_auth_expired(), "{:?}", err);
    }

    let labels = vec!["INBOX".to_string(), "STARRED".to_string()];
    let aggregate_err = h.actions.collect_label_stubs(&labels, 10).unwrap_err();
    assert!(aggregate_err.is_auth_expired(), "{:?}", aggregate_err);
}

#[test]
fn test_label_aggregate_reports_expired_auth_over_partial_results() {
    let h = harness();
    h.mailbox.insert_message(RemoteMessage {
        label_ids: vec!["INBOX".to_string(), "STARRED".to_string()],
        ..message("m1", "t1", 1, &[("Subject", "Hello")])
    });
    h.mailbox.expire_auth_for_label("STARRED");

    let labels = vec!["INBOX".to_string(), "STARRED".to_string()];
    let err = h.actions.collect_label_stubs(&labels, 10).unwrap_err();
    assert!(err.is_auth_expired(), "{:?}", err);

    let page = h.actions.list_thread_stubs(Some("INBOX"), 10, None).unwrap();
    assert_eq!(page.stubs.len(), 1);
}

#[test]
fn test_config_file_drives_components() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mailwire.json");
    std::fs::write(&path, r#"{"message_id_domain": "corp.example", "default_page_size": 1}"#)
        .unwrap();
    let config = MailConfig::from_file(&path).unwrap();

    let h = harness_with(config);
    h.mailbox.insert_message(message("a", "t1", 1, &[]));
    h.mailbox.insert_message(message("b", "t2", 2, &[]));

    let page = h.actions.list_thread_stubs(Some("INBOX"), 0, None).unwrap();
    assert_eq!(page.stubs.len(), 1);
    assert_eq!(page.stubs[0].id, MessageId::new("b"));

    let composed = h
        .actions
        .build_multipart(
            &ComposeFields {
                to: vec![EmailAddress::new("x@example.com")],
                subject: "Hi".to_string(),
                text: Some("hello".to_string()),
                ..ComposeFields::default()
            },
            &[],
        )
        .unwrap();
    assert!(composed.message_id.ends_with("@corp.example>"));
}
