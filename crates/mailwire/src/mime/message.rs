//! Single-part RFC 5322 message builder

use super::codec::{CRLF, encode_transport_token};

/// Builder for a minimal single-part message
///
/// Only headers that were set are emitted; nothing is validated. A builder
/// is consumed by [`MessageBuilder::build`]; start over with
/// `MessageBuilder::default()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageBuilder {
    from: Option<String>,
    to: Option<String>,
    cc: Option<String>,
    bcc: Option<String>,
    subject: Option<String>,
    content_type: Option<String>,
    body: String,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn to(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }

    pub fn cc(mut self, cc: impl Into<String>) -> Self {
        self.cc = Some(cc.into());
        self
    }

    pub fn bcc(mut self, bcc: impl Into<String>) -> Self {
        self.bcc = Some(bcc.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Render headers, a blank line, then the body
    pub fn build(self) -> String {
        let headers = [
            ("From", self.from),
            ("To", self.to),
            ("Cc", self.cc),
            ("Bcc", self.bcc),
            ("Subject", self.subject),
            ("Content-Type", self.content_type),
        ];

        let mut lines: Vec<String> = headers
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| format!("{}: {}", name, v)))
            .collect();
        lines.push(String::new());
        lines.push(self.body);
        lines.join(CRLF)
    }

    /// Render and encode as a transport token
    pub fn build_and_encode(self) -> String {
        encode_transport_token(&self.build())
    }
}
