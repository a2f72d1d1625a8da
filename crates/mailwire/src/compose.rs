//! Outgoing message composition
//!
//! Combines the threading functions and the multipart builder into the two
//! composition entry points: replies to a fetched message and free-form
//! multipart messages. Threading headers are validated before anything is
//! rendered, so a malformed message never reaches the transport.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::MailConfig;
use crate::error::{MailError, Result};
use crate::mime::codec::{format_date, generate_message_id};
use crate::mime::{MultipartKind, MultipartMessageBuilder};
use crate::models::{EmailAddress, RemoteMessage, ThreadId, format_address_list};
use crate::threading::{self, build_references, reply_subject, validate_headers};

/// An attachment to send, with data already base64 encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingAttachment {
    pub filename: String,
    pub mime_type: String,
    pub data_base64: String,
}

/// What the user typed when replying
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyDraft {
    pub from: Option<EmailAddress>,
    pub to: Vec<EmailAddress>,
    pub cc: Vec<EmailAddress>,
    pub bcc: Vec<EmailAddress>,
    pub body_html: String,
    /// Plain-text alternative, sent only when there are no attachments
    pub body_text: Option<String>,
    pub attachments: Vec<OutgoingAttachment>,
}

/// Fields of a free-form message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposeFields {
    pub from: Option<EmailAddress>,
    pub to: Vec<EmailAddress>,
    pub cc: Vec<EmailAddress>,
    pub bcc: Vec<EmailAddress>,
    pub subject: String,
    pub html: Option<String>,
    pub text: Option<String>,
    pub in_reply_to: Option<String>,
    pub references: Option<String>,
    pub thread_id: Option<ThreadId>,
}

/// A rendered message ready for `send_raw_message`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMessage {
    /// Transport token (URL-safe base64 of the RFC 5322 text)
    pub raw: String,
    pub thread_id: Option<ThreadId>,
    /// The `Message-ID` header of the new message
    pub message_id: String,
}

/// Compose a reply to `original`
///
/// The subject gains one `Re: ` prefix, `In-Reply-To` is the original's
/// `Message-ID` and `References` is the original's chain with that id
/// appended. The reply stays in the original's thread.
pub fn build_reply(
    original: &RemoteMessage,
    draft: &ReplyDraft,
    config: &MailConfig,
) -> Result<ComposedMessage> {
    let context = threading::extract(original);
    let references = build_references(
        context.message_id.as_deref(),
        context.references_header().as_deref(),
    );

    let fields = ComposeFields {
        from: draft.from.clone(),
        to: draft.to.clone(),
        cc: draft.cc.clone(),
        bcc: draft.bcc.clone(),
        subject: reply_subject(&context.subject),
        html: Some(draft.body_html.clone()),
        text: draft.body_text.clone(),
        in_reply_to: context.message_id,
        references,
        thread_id: Some(original.thread_id.clone()),
    };

    build_multipart(&fields, &draft.attachments, config)
}

/// Compose a multipart message
///
/// Without attachments the bodies go into `multipart/alternative` (text
/// first, then HTML). With attachments the message is `multipart/mixed`
/// with the HTML body (or the text body when there is no HTML) followed by
/// the attachments.
pub fn build_multipart(
    fields: &ComposeFields,
    attachments: &[OutgoingAttachment],
    config: &MailConfig,
) -> Result<ComposedMessage> {
    if fields.to.is_empty() {
        return Err(MailError::Validation("No recipients".to_string()));
    }

    let domain = fields
        .from
        .as_ref()
        .and_then(|from| address_domain(&from.email))
        .unwrap_or(config.message_id_domain.as_str());
    let message_id = generate_message_id(domain);

    let kind = if attachments.is_empty() {
        MultipartKind::Alternative
    } else {
        MultipartKind::Mixed
    };

    let mut builder = MultipartMessageBuilder::new(kind);
    if let Some(from) = &fields.from {
        builder = builder.from(from.display());
    }
    builder = builder.to(format_address_list(&fields.to));
    if !fields.cc.is_empty() {
        builder = builder.cc(format_address_list(&fields.cc));
    }
    if !fields.bcc.is_empty() {
        builder = builder.bcc(format_address_list(&fields.bcc));
    }
    builder = builder
        .subject(&fields.subject)
        .header("Date", format_date(Utc::now()))
        .header("Message-ID", message_id.as_str())
        .threading_headers(fields.in_reply_to.as_deref(), fields.references.as_deref());

    validate_headers(builder.headers())?;

    let html = fields.html.as_deref().filter(|h| !h.is_empty());
    let text = fields.text.as_deref().filter(|t| !t.is_empty());
    match kind {
        MultipartKind::Alternative => {
            if let Some(text) = text {
                builder = builder.text_part(text);
            }
            if let Some(html) = html {
                builder = builder.html_part(html);
            }
        }
        _ => {
            if let Some(html) = html {
                builder = builder.html_part(html);
            } else if let Some(text) = text {
                builder = builder.text_part(text);
            }
            for attachment in attachments {
                builder = builder.attachment(
                    &attachment.filename,
                    &attachment.mime_type,
                    &attachment.data_base64,
                );
            }
        }
    }

    Ok(ComposedMessage {
        raw: builder.build_and_encode(),
        thread_id: fields.thread_id.clone(),
        message_id,
    })
}

fn address_domain(email: &str) -> Option<&str> {
    email
        .rsplit_once('@')
        .map(|(_, domain)| domain.trim_end_matches('>').trim())
        .filter(|domain| !domain.is_empty())
}
