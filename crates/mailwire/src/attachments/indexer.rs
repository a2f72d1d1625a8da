//! Stable attachment addressing and download
//!
//! Remote attachment references are only valid for the fetch that produced
//! them, so callers address attachments by a [`StableAttachmentId`] computed
//! from the part tree. Downloads always refetch the message and resolve the
//! current reference for that id.

use chrono::Utc;
use regex::Regex;
use std::ops::ControlFlow;
use std::sync::{Arc, LazyLock};

use super::walk::walk_parts;
use crate::config::MailConfig;
use crate::error::{MailError, Result};
use crate::logging::ComponentLogger;
use crate::mailbox::MailboxService;
use crate::mime::codec::decode_base64_payload;
use crate::models::{
    AttachmentDescriptor, DownloadedAttachment, MessageId, MessagePart, StableAttachmentId,
};

static DISPOSITION_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"filename="?([^";\n]+)"?"#).expect("valid disposition filename regex")
});

/// List every attachment in a part tree, in document order
pub fn index_attachments(root: &MessagePart) -> Vec<AttachmentDescriptor> {
    let mut found = Vec::new();
    walk_parts(root, |part, path| {
        if let Some(descriptor) = describe_attachment(part, path) {
            found.push(descriptor);
        }
        ControlFlow::Continue(())
    });
    found
}

/// Whether any part of the tree is an attachment; stops at the first one
pub fn has_attachment(root: &MessagePart) -> bool {
    let mut found = false;
    walk_parts(root, |part, _| {
        if is_attachment(part) {
            found = true;
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });
    found
}

/// A part is an attachment when it has a download reference and is named
/// either explicitly or by an `attachment` disposition
fn is_attachment(part: &MessagePart) -> bool {
    part.body.attachment_ref.is_some()
        && (explicit_filename(part).is_some() || disposition_is_attachment(part))
}

fn describe_attachment(part: &MessagePart, path: &str) -> Option<AttachmentDescriptor> {
    if !is_attachment(part) {
        return None;
    }
    let transient_ref = part.body.attachment_ref.clone()?;

    Some(AttachmentDescriptor {
        stable_id: StableAttachmentId::new(path),
        filename: resolve_filename(part),
        mime_type: part.mime_type.clone(),
        size_bytes: part.body.size,
        transient_ref,
    })
}

fn explicit_filename(part: &MessagePart) -> Option<&str> {
    part.filename
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
}

fn disposition_is_attachment(part: &MessagePart) -> bool {
    part.headers
        .get("Content-Disposition")
        .is_some_and(|d| d.trim_start().to_ascii_lowercase().starts_with("attachment"))
}

/// Explicit filename, then the Content-Disposition parameter, then a default
pub fn resolve_filename(part: &MessagePart) -> String {
    if let Some(name) = explicit_filename(part) {
        return name.to_string();
    }

    if let Some(disposition) = part.headers.get("Content-Disposition")
        && let Some(captures) = DISPOSITION_FILENAME.captures(disposition)
    {
        let name = captures[1].trim();
        if !name.is_empty() {
            return name.to_string();
        }
    }

    format!(
        "attachment-{}.{}",
        Utc::now().timestamp_millis(),
        extension_for_mime(&part.mime_type)
    )
}

/// File extension for a MIME type, used when no filename is declared
pub fn extension_for_mime(mime_type: &str) -> &str {
    let essence = mime_type.split(';').next().unwrap_or_default().trim();
    match essence.to_ascii_lowercase().as_str() {
        "application/pdf" => "pdf",
        "application/zip" => "zip",
        "application/json" => "json",
        "application/msword" => "doc",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "docx",
        "application/vnd.ms-excel" => "xls",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => "xlsx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation" => "pptx",
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/svg+xml" => "svg",
        "text/plain" => "txt",
        "text/html" => "html",
        "text/csv" => "csv",
        "text/calendar" => "ics",
        "message/rfc822" => "eml",
        _ => match essence.split_once('/') {
            Some((_, subtype))
                if !subtype.is_empty()
                    && subtype.len() <= 8
                    && subtype.chars().all(|c| c.is_ascii_alphanumeric()) =>
            {
                subtype
            }
            _ => "bin",
        },
    }
}

/// Lists and downloads attachments through the remote mailbox
pub struct AttachmentIndexer {
    mailbox: Arc<dyn MailboxService>,
    max_attachment_bytes: u64,
    log: ComponentLogger,
}

impl AttachmentIndexer {
    pub fn new(
        mailbox: Arc<dyn MailboxService>,
        config: &MailConfig,
        log: ComponentLogger,
    ) -> Self {
        Self {
            mailbox,
            max_attachment_bytes: config.max_attachment_bytes,
            log,
        }
    }

    /// Fetch the message once and return its attachment metadata
    pub fn list(&self, message_id: &MessageId) -> Result<Vec<AttachmentDescriptor>> {
        let message = self
            .mailbox
            .fetch_message(message_id)
            .map_err(|e| MailError::remote("fetch_message", e))?;

        let attachments = index_attachments(&message.payload);
        self.log.debug(format_args!(
            "Message {} has {} attachments",
            message_id,
            attachments.len()
        ));
        Ok(attachments)
    }

    /// Download an attachment by its stable id
    ///
    /// The message is always refetched; an id missing from the fresh tree
    /// fails with `NotFound` rather than falling back to older data.
    pub fn download(
        &self,
        message_id: &MessageId,
        stable_id: &StableAttachmentId,
    ) -> Result<DownloadedAttachment> {
        let message = self
            .mailbox
            .fetch_message(message_id)
            .map_err(|e| MailError::remote("fetch_message", e))?;

        let Some(descriptor) = index_attachments(&message.payload)
            .into_iter()
            .find(|d| &d.stable_id == stable_id)
        else {
            self.log.warn(format_args!(
                "Attachment {} not present in fresh fetch of message {}",
                stable_id, message_id
            ));
            return Err(MailError::NotFound {
                message_id: message_id.as_str().to_string(),
                stable_id: stable_id.as_str().to_string(),
            });
        };

        if let Some(declared) = descriptor.size_bytes {
            self.check_size(declared)?;
        }

        let payload = self
            .mailbox
            .fetch_attachment_bytes(message_id, &descriptor.transient_ref)
            .map_err(|e| MailError::remote("fetch_attachment_bytes", e))?;
        let bytes = decode_base64_payload(&payload)?;
        let size_bytes = bytes.len() as u64;
        self.check_size(size_bytes)?;

        self.log.info(format_args!(
            "Downloaded attachment {} ({} bytes) from message {}",
            stable_id, size_bytes, message_id
        ));

        Ok(DownloadedAttachment {
            bytes,
            filename: descriptor.filename,
            mime_type: descriptor.mime_type,
            size_bytes,
        })
    }

    fn check_size(&self, size: u64) -> Result<()> {
        if size > self.max_attachment_bytes {
            return Err(MailError::SizeExceeded {
                size,
                limit: self.max_attachment_bytes,
            });
        }
        Ok(())
    }
}
