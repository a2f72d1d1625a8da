//! Gmail API HTTP client
//!
//! Implements the remote mailbox boundary against the Gmail REST API.
//! Uses synchronous HTTP (ureq) to be executor-agnostic. No retries happen
//! here; a 401 is reported as [`AuthExpiredError`] so the session layer can
//! re-authenticate.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use super::api::{
    AttachmentResponse, BatchModifyRequest, GmailMessage, GmailThread, ListMessagesResponse,
    SendRequest, SendResponse,
};
use super::normalize::{normalize_list_page, normalize_message, normalize_thread};
use crate::config::MailConfig;
use crate::error::AuthExpiredError;
use crate::logging::ComponentLogger;
use crate::mailbox::{MailboxService, MessageListPage, SentMessage};
use crate::models::{MessageId, RawThread, RemoteMessage, ThreadId, TransientAttachmentRef};

/// Gmail caps `maxResults` at 500
const MAX_PAGE_SIZE: usize = 500;

/// Source of OAuth access tokens
///
/// Token acquisition and refresh live outside this crate.
pub trait AccessTokenProvider: Send + Sync {
    fn access_token(&self) -> Result<String>;
}

/// A fixed access token
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl AccessTokenProvider for StaticToken {
    fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Gmail API client
pub struct GmailClient {
    tokens: Arc<dyn AccessTokenProvider>,
    base_url: String,
    log: ComponentLogger,
}

impl GmailClient {
    pub fn new(tokens: Arc<dyn AccessTokenProvider>, config: &MailConfig) -> Self {
        Self {
            tokens,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            log: ComponentLogger::from_log_crate("gmail"),
        }
    }

    /// Replace the default `log`-backed logger
    pub fn with_logger(mut self, log: ComponentLogger) -> Self {
        self.log = log;
        self
    }

    fn messages_url(
        &self,
        label_id: Option<&str>,
        page_size: usize,
        page_token: Option<&str>,
    ) -> String {
        let mut url = format!(
            "{}/users/me/messages?maxResults={}",
            self.base_url,
            page_size.clamp(1, MAX_PAGE_SIZE)
        );
        if let Some(label) = label_id {
            url.push_str(&format!("&labelIds={}", urlencoding::encode(label)));
        }
        if let Some(token) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
        }
        url
    }

    fn message_url(&self, id: &MessageId) -> String {
        format!(
            "{}/users/me/messages/{}",
            self.base_url,
            urlencoding::encode(id.as_str())
        )
    }

    fn bearer(&self) -> Result<String> {
        let token = self
            .tokens
            .access_token()
            .context("Failed to obtain access token")?;
        Ok(format!("Bearer {}", token))
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        self.log.debug(format_args!("GET {}", what));
        let response = ureq::get(url)
            .header("Authorization", &self.bearer()?)
            .call();

        let mut response = check_status(response, what)?;
        response
            .body_mut()
            .read_json()
            .with_context(|| format!("Failed to parse {} response", what))
    }

    fn post_json<B: Serialize>(
        &self,
        url: &str,
        body: &B,
        what: &str,
    ) -> Result<ureq::http::Response<ureq::Body>> {
        self.log.debug(format_args!("POST {}", what));
        let response = ureq::post(url)
            .header("Authorization", &self.bearer()?)
            .send_json(body);
        check_status(response, what)
    }
}

/// Map transport errors, singling out rejected credentials
fn check_status<T>(result: std::result::Result<T, ureq::Error>, what: &str) -> Result<T> {
    match result {
        Ok(response) => Ok(response),
        Err(ureq::Error::StatusCode(401)) => Err(AuthExpiredError.into()),
        Err(e) => Err(anyhow::Error::new(e).context(format!("Failed to send {} request", what))),
    }
}

impl MailboxService for GmailClient {
    fn fetch_message(&self, id: &MessageId) -> Result<RemoteMessage> {
        let url = format!("{}?format=full", self.message_url(id));
        let message: GmailMessage = self.get_json(&url, "get message")?;
        normalize_message(message)
    }

    fn fetch_thread(&self, id: &ThreadId) -> Result<RawThread> {
        let url = format!(
            "{}/users/me/threads/{}?format=full",
            self.base_url,
            urlencoding::encode(id.as_str())
        );
        let thread: GmailThread = self.get_json(&url, "get thread")?;
        normalize_thread(thread)
    }

    fn list_messages(
        &self,
        label_id: Option<&str>,
        page_size: usize,
        page_token: Option<&str>,
    ) -> Result<MessageListPage> {
        let url = self.messages_url(label_id, page_size, page_token);
        let list: ListMessagesResponse = self.get_json(&url, "list messages")?;

        // messages.list carries no snippets; a minimal fetch per entry does
        normalize_list_page(list, |entry| {
            let url = format!(
                "{}/users/me/messages/{}?format=minimal",
                self.base_url,
                urlencoding::encode(&entry.id)
            );
            self.get_json(&url, "get message snippet")
        })
    }

    fn fetch_attachment_bytes(
        &self,
        message_id: &MessageId,
        reference: &TransientAttachmentRef,
    ) -> Result<String> {
        let url = format!(
            "{}/attachments/{}",
            self.message_url(message_id),
            urlencoding::encode(reference.as_str())
        );
        let attachment: AttachmentResponse = self.get_json(&url, "get attachment")?;
        Ok(attachment.data)
    }

    fn send_raw_message(&self, raw: &str, thread_id: Option<&ThreadId>) -> Result<SentMessage> {
        let url = format!("{}/users/me/messages/send", self.base_url);
        let request = SendRequest {
            raw,
            thread_id: thread_id.map(ThreadId::as_str),
        };

        let mut response = self.post_json(&url, &request, "send message")?;
        let sent: SendResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse send message response")?;

        self.log
            .info(format_args!("Sent message {} in thread {}", sent.id, sent.thread_id));
        Ok(SentMessage {
            id: MessageId::new(sent.id),
            thread_id: ThreadId::new(sent.thread_id),
            label_ids: sent.label_ids.unwrap_or_default(),
        })
    }

    fn modify_labels(
        &self,
        message_ids: &[MessageId],
        add: &[&str],
        remove: &[&str],
    ) -> Result<()> {
        if message_ids.is_empty() {
            return Ok(());
        }

        let url = format!("{}/users/me/messages/batchModify", self.base_url);
        let request = BatchModifyRequest {
            ids: message_ids.iter().map(MessageId::as_str).collect(),
            add_label_ids: add,
            remove_label_ids: remove,
        };
        self.post_json(&url, &request, "batch modify")?;
        Ok(())
    }
}
