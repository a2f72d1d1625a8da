//! Gmail API response normalization
//!
//! Converts Gmail API responses to the part-tree model consumed by the
//! attachment indexer and the thread assembler.

use anyhow::{Context, Result};

use super::api::{self, GmailMessage, GmailThread, ListMessagesResponse, MessageRef};
use crate::mailbox::{MessageListEntry, MessageListPage};
use crate::models::{
    HeaderSet, MessageId, MessagePart, PartBody, RawThread, RemoteMessage, ThreadId,
    TransientAttachmentRef,
};

/// Normalize a Gmail API message
pub fn normalize_message(gmail_msg: GmailMessage) -> Result<RemoteMessage> {
    let payload = gmail_msg
        .payload
        .with_context(|| format!("Message {} has no payload", gmail_msg.id))?;

    // Milliseconds since epoch, sent as a string
    let internal_date = match gmail_msg.internal_date.as_deref() {
        Some(value) => value
            .parse()
            .with_context(|| format!("Invalid internalDate: {}", value))?,
        None => 0,
    };

    Ok(RemoteMessage {
        id: MessageId::new(gmail_msg.id),
        thread_id: ThreadId::new(gmail_msg.thread_id),
        label_ids: gmail_msg.label_ids.unwrap_or_default(),
        snippet: decode_html_entities(&gmail_msg.snippet),
        internal_date,
        payload: normalize_part(payload),
    })
}

/// Normalize every message of a thread, keeping server order
pub fn normalize_thread(thread: GmailThread) -> Result<RawThread> {
    let messages = thread
        .messages
        .unwrap_or_default()
        .into_iter()
        .map(normalize_message)
        .collect::<Result<Vec<_>>>()?;

    Ok(RawThread {
        id: ThreadId::new(thread.id),
        messages,
    })
}

/// Normalize a message listing
///
/// `fetch_minimal` loads each listed message without its payload so the
/// entry can carry the message snippet.
pub fn normalize_list_page<F>(
    list: ListMessagesResponse,
    mut fetch_minimal: F,
) -> Result<MessageListPage>
where
    F: FnMut(&MessageRef) -> Result<GmailMessage>,
{
    let messages = list
        .messages
        .unwrap_or_default()
        .iter()
        .map(|entry| {
            let minimal = fetch_minimal(entry)
                .with_context(|| format!("Failed to load snippet of message {}", entry.id))?;
            Ok(MessageListEntry {
                id: MessageId::new(entry.id.as_str()),
                thread_id: ThreadId::new(entry.thread_id.as_str()),
                snippet: Some(decode_html_entities(&minimal.snippet)),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(MessageListPage {
        messages,
        next_page_token: list.next_page_token,
    })
}

/// Normalize a part tree
///
/// Empty part ids and filenames are treated as absent.
pub fn normalize_part(part: api::MessagePart) -> MessagePart {
    let headers: HeaderSet = part
        .headers
        .unwrap_or_default()
        .into_iter()
        .map(|h| (h.name, h.value))
        .collect();

    let body = part
        .body
        .map(|body| PartBody {
            size: body.size,
            data: body.data.filter(|d| !d.is_empty()),
            attachment_ref: body
                .attachment_id
                .filter(|id| !id.is_empty())
                .map(TransientAttachmentRef::new),
        })
        .unwrap_or_default();

    MessagePart {
        part_id: part.part_id.filter(|id| !id.is_empty()),
        mime_type: part.mime_type.unwrap_or_default(),
        filename: part.filename.filter(|f| !f.is_empty()),
        headers,
        body,
        children: part
            .parts
            .unwrap_or_default()
            .into_iter()
            .map(normalize_part)
            .collect(),
    }
}

/// Decode common HTML entities in snippets
fn decode_html_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachments::index_attachments;

    fn parse(json: &str) -> GmailMessage {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_normalize_multipart_message() {
        let msg = parse(
            r#"{
                "id": "18c1",
                "threadId": "18c0",
                "labelIds": ["INBOX", "UNREAD"],
                "snippet": "See &quot;report&quot; attached",
                "internalDate": "1700000000000",
                "payload": {
                    "partId": "",
                    "mimeType": "multipart/mixed",
                    "filename": "",
                    "headers": [
                        {"name": "Subject", "value": "Report"},
                        {"name": "Message-ID", "value": "<r@x>"}
                    ],
                    "body": {"size": 0},
                    "parts": [
                        {
                            "partId": "0",
                            "mimeType": "text/plain",
                            "filename": "",
                            "body": {"size": 5, "data": "aGVsbG8"}
                        },
                        {
                            "partId": "1",
                            "mimeType": "application/pdf",
                            "filename": "report.pdf",
                            "headers": [
                                {"name": "Content-Disposition",
                                 "value": "attachment; filename=\"report.pdf\""}
                            ],
                            "body": {"size": 1024, "attachmentId": "ANGjdJ8"}
                        }
                    ]
                }
            }"#,
        );

        let message = normalize_message(msg).unwrap();
        assert_eq!(message.id, MessageId::new("18c1"));
        assert_eq!(message.internal_date, 1_700_000_000_000);
        assert!(message.is_unread());
        assert_eq!(message.snippet, "See \"report\" attached");
        assert_eq!(message.header("subject"), Some("Report"));

        let payload = &message.payload;
        assert_eq!(payload.part_id, None);
        assert_eq!(payload.filename, None);
        assert_eq!(payload.children.len(), 2);
        assert_eq!(payload.children[0].body.data.as_deref(), Some("aGVsbG8"));
        assert_eq!(
            payload.children[1]
                .body
                .attachment_ref
                .as_ref()
                .map(|r| r.as_str()),
            Some("ANGjdJ8")
        );

        let attachments = index_attachments(payload);
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].stable_id.as_str(), "1");
        assert_eq!(attachments[0].filename, "report.pdf");
        assert_eq!(attachments[0].size_bytes, Some(1024));
    }

    #[test]
    fn test_normalize_missing_payload_fails() {
        let msg = parse(r#"{"id": "a", "threadId": "t", "snippet": ""}"#);
        assert!(normalize_message(msg).is_err());
    }

    #[test]
    fn test_normalize_invalid_date_fails() {
        let msg = parse(
            r#"{"id": "a", "threadId": "t", "internalDate": "soon",
                "payload": {"mimeType": "text/plain"}}"#,
        );
        assert!(normalize_message(msg).is_err());
    }

    #[test]
    fn test_normalize_thread_keeps_order() {
        let thread: GmailThread = serde_json::from_str(
            r#"{"id": "t", "messages": [
                {"id": "b", "threadId": "t", "internalDate": "2",
                 "payload": {"mimeType": "text/plain"}},
                {"id": "a", "threadId": "t", "internalDate": "1",
                 "payload": {"mimeType": "text/plain"}}
            ]}"#,
        )
        .unwrap();

        let raw = normalize_thread(thread).unwrap();
        let ids: Vec<&str> = raw.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_normalize_list_page_carries_snippets() {
        let list: ListMessagesResponse = serde_json::from_str(
            r#"{"messages": [{"id": "m1", "threadId": "t1"}, {"id": "m2", "threadId": "t1"}],
                "nextPageToken": "next", "resultSizeEstimate": 2}"#,
        )
        .unwrap();

        let mut fetched = Vec::new();
        let page = normalize_list_page(list, |entry| {
            fetched.push(entry.id.clone());
            Ok(parse(&format!(
                r#"{{"id": "{}", "threadId": "t1", "snippet": "Hi &amp; bye {}",
                    "internalDate": "1"}}"#,
                entry.id, entry.id
            )))
        })
        .unwrap();

        assert_eq!(fetched, vec!["m1", "m2"]);
        assert_eq!(page.next_page_token.as_deref(), Some("next"));
        assert_eq!(page.messages.len(), 2);
        assert_eq!(page.messages[0].id, MessageId::new("m1"));
        assert_eq!(page.messages[0].thread_id, ThreadId::new("t1"));
        assert_eq!(page.messages[0].snippet.as_deref(), Some("Hi & bye m1"));
    }

    #[test]
    fn test_normalize_empty_list_page() {
        let list: ListMessagesResponse =
            serde_json::from_str(r#"{"resultSizeEstimate": 0}"#).unwrap();
        let page = normalize_list_page(list, |_| unreachable!()).unwrap();
        assert!(page.messages.is_empty());
        assert_eq!(page.next_page_token, None);
    }

    #[test]
    fn test_normalize_list_page_propagates_fetch_failure() {
        let list: ListMessagesResponse =
            serde_json::from_str(r#"{"messages": [{"id": "m1", "threadId": "t1"}]}"#).unwrap();
        let err = normalize_list_page(list, |_| Err(anyhow::anyhow!("boom"))).unwrap_err();
        assert!(err.to_string().contains("m1"));
    }

    #[test]
    fn test_decode_html_entities() {
        assert_eq!(decode_html_entities("a &amp; b &lt;c&gt;"), "a & b <c>");
        assert_eq!(decode_html_entities("it&#39;s"), "it's");
    }
}
