//! Threading context extraction and reply header derivation (RFC 5322 §3.6.4)

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{MailError, Result};
use crate::models::{HeaderSet, RemoteMessage, ThreadId};

static MSG_ID_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^<>\s]+>").expect("valid message-id token regex"));

static SINGLE_MSG_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*<[^<>\s]+>\s*$").expect("valid message-id regex"));

/// Threading headers and identity of one message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadingContext {
    pub message_id: Option<String>,
    pub in_reply_to: Option<String>,
    /// `<...>` tokens of the References header, de-duplicated, in order
    pub references: Option<Vec<String>>,
    pub subject: String,
    pub thread_id: Option<ThreadId>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl ThreadingContext {
    /// References rendered as a single header value
    pub fn references_header(&self) -> Option<String> {
        self.references.as_ref().map(|refs| refs.join(" "))
    }
}

/// Read the threading context of a message; missing headers stay `None`
pub fn extract(message: &RemoteMessage) -> ThreadingContext {
    let header = |name: &str| {
        message
            .header(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    ThreadingContext {
        message_id: header("Message-ID"),
        in_reply_to: header("In-Reply-To"),
        references: header("References").map(|r| reference_tokens(&r)),
        subject: header("Subject").unwrap_or_default(),
        thread_id: Some(message.thread_id.clone()),
        from: header("From"),
        to: header("To"),
    }
}

/// Split a References value into unique `<...>` tokens, keeping first occurrence
pub fn reference_tokens(value: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for token in MSG_ID_TOKEN.find_iter(value) {
        let token = token.as_str();
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}

/// Compute the References value for a reply to `current_message_id`
///
/// Existing references are whitespace-normalized; the current id is appended
/// unless it is already present.
pub fn build_references(
    current_message_id: Option<&str>,
    existing_references: Option<&str>,
) -> Option<String> {
    let Some(current) = current_message_id else {
        return existing_references.map(str::to_string);
    };

    let normalized = existing_references
        .map(|refs| refs.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();

    if normalized.is_empty() {
        return Some(current.to_string());
    }
    if normalized.contains(current) {
        return Some(normalized);
    }
    Some(format!("{} {}", normalized, current))
}

/// Trim and collapse internal whitespace
pub fn clean_subject(subject: &str) -> String {
    subject.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Subject for a reply, adding `Re: ` once
pub fn reply_subject(subject: &str) -> String {
    prefixed_subject(subject, "Re:", &["re:"])
}

/// Subject for a forward, adding `Fwd: ` once
pub fn forward_subject(subject: &str) -> String {
    prefixed_subject(subject, "Fwd:", &["fwd:", "fw:"])
}

fn prefixed_subject(subject: &str, prefix: &str, recognized: &[&str]) -> String {
    let cleaned = clean_subject(subject);
    let lower = cleaned.to_lowercase();
    if recognized.iter().any(|p| lower.starts_with(p)) {
        return cleaned;
    }
    if cleaned.is_empty() {
        return prefix.to_string();
    }
    format!("{} {}", prefix, cleaned)
}

/// Depth of a message in its reply chain
pub fn thread_depth(message: &RemoteMessage) -> usize {
    match message.header("References") {
        Some(references) => MSG_ID_TOKEN.find_iter(references).count(),
        None if message.header("In-Reply-To").is_some() => 1,
        None => 0,
    }
}

/// Check threading headers before send
pub fn validate(headers: &HeaderSet) -> bool {
    validate_headers(headers).is_ok()
}

/// Like [`validate`], reporting which header is malformed
pub fn validate_headers(headers: &HeaderSet) -> Result<()> {
    let subject = headers.get("Subject").unwrap_or_default();
    if subject.trim().is_empty() {
        return Err(MailError::Validation("Subject is empty".to_string()));
    }

    if let Some(in_reply_to) = headers.get("In-Reply-To")
        && !SINGLE_MSG_ID.is_match(in_reply_to)
    {
        return Err(MailError::Validation(format!(
            "In-Reply-To is not a <message-id>: {}",
            in_reply_to
        )));
    }

    if let Some(references) = headers.get("References")
        && !MSG_ID_TOKEN.is_match(references)
    {
        return Err(MailError::Validation(format!(
            "References contains no <message-id>: {}",
            references
        )));
    }

    Ok(())
}
