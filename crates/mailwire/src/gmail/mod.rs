//! Gmail API integration
//!
//! This module provides:
//! - a blocking Gmail REST client implementing [`MailboxService`](crate::mailbox::MailboxService)
//! - response normalization to the part-tree model

mod client;
mod normalize;

pub use client::{AccessTokenProvider, GmailClient, StaticToken};
pub use normalize::{normalize_message, normalize_part, normalize_thread};

/// Gmail API request and response types
pub mod api {
    use serde::{Deserialize, Serialize};

    /// Response from listing messages
    #[derive(Debug, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ListMessagesResponse {
        pub messages: Option<Vec<MessageRef>>,
        pub next_page_token: Option<String>,
        pub result_size_estimate: Option<u32>,
    }

    /// Reference to a message (just ID and thread ID)
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessageRef {
        pub id: String,
        pub thread_id: String,
    }

    /// Full message from Gmail API
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GmailMessage {
        pub id: String,
        pub thread_id: String,
        pub label_ids: Option<Vec<String>>,
        #[serde(default)]
        pub snippet: String,
        pub internal_date: Option<String>,
        pub payload: Option<MessagePart>,
    }

    /// Thread with its messages
    #[derive(Debug, Deserialize)]
    pub struct GmailThread {
        pub id: String,
        pub messages: Option<Vec<GmailMessage>>,
    }

    /// Email header (name-value pair)
    #[derive(Debug, Deserialize, Serialize)]
    pub struct Header {
        pub name: String,
        pub value: String,
    }

    /// Part body: inline data or a handle to download it
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessageBody {
        pub size: Option<u64>,
        pub data: Option<String>,
        pub attachment_id: Option<String>,
    }

    /// Message part; the top-level payload has the same shape
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessagePart {
        pub part_id: Option<String>,
        pub mime_type: Option<String>,
        pub filename: Option<String>,
        pub headers: Option<Vec<Header>>,
        pub body: Option<MessageBody>,
        pub parts: Option<Vec<MessagePart>>,
    }

    /// Response from `messages.attachments.get`
    #[derive(Debug, Deserialize)]
    pub struct AttachmentResponse {
        pub size: Option<u64>,
        pub data: String,
    }

    /// Body of `messages.send`
    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SendRequest<'a> {
        pub raw: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub thread_id: Option<&'a str>,
    }

    /// Response from `messages.send`
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SendResponse {
        pub id: String,
        pub thread_id: String,
        pub label_ids: Option<Vec<String>>,
    }

    /// Body of `messages.batchModify`
    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BatchModifyRequest<'a> {
        pub ids: Vec<&'a str>,
        pub add_label_ids: &'a [&'a str],
        pub remove_label_ids: &'a [&'a str],
    }
}
