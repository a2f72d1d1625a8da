//! RFC 2046 multipart message builder

use serde::{Deserialize, Serialize};

use super::codec::{
    CRLF, DEFAULT_LINE_WIDTH, chunk_base64, encode_header_word, encode_transport_token,
    generate_boundary,
};
use crate::models::HeaderSet;

/// Text emitted between the top-level headers and the first boundary
const PREAMBLE: &str = "This is a multi-part message in MIME format.";

/// Multipart subtype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultipartKind {
    Mixed,
    Alternative,
    Related,
}

impl MultipartKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mixed => "mixed",
            Self::Alternative => "alternative",
            Self::Related => "related",
        }
    }
}

/// Content-Transfer-Encoding of a body part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    SevenBit,
    EightBit,
    Base64,
}

impl TransferEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SevenBit => "7bit",
            Self::EightBit => "8bit",
            Self::Base64 => "base64",
        }
    }

    fn for_text(content: &str) -> Self {
        if content.is_ascii() {
            Self::SevenBit
        } else {
            Self::EightBit
        }
    }
}

/// One part of a multipart body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyPart {
    pub content_type: String,
    /// Extra headers; when present they replace the default transfer-encoding line
    pub headers: HeaderSet,
    pub encoding: TransferEncoding,
    pub content: String,
}

impl BodyPart {
    fn render(&self, out: &mut Vec<String>) {
        out.push(format!("Content-Type: {}", self.content_type));
        if self.headers.is_empty() {
            out.push(format!("Content-Transfer-Encoding: {}", self.encoding.as_str()));
        } else {
            out.extend(self.headers.to_lines());
        }
        out.push(String::new());
        match self.encoding {
            TransferEncoding::Base64 => out.push(chunk_base64(&self.content, DEFAULT_LINE_WIDTH)),
            TransferEncoding::SevenBit | TransferEncoding::EightBit => {
                out.push(self.content.clone())
            }
        }
    }
}

/// Builder for multipart messages
///
/// Setters do not validate; malformed input produces a malformed message.
/// Consumed by [`MultipartMessageBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartMessageBuilder {
    kind: MultipartKind,
    headers: HeaderSet,
    parts: Vec<BodyPart>,
    boundary: String,
}

impl Default for MultipartMessageBuilder {
    fn default() -> Self {
        Self::new(MultipartKind::Mixed)
    }
}

impl MultipartMessageBuilder {
    pub fn new(kind: MultipartKind) -> Self {
        Self {
            kind,
            headers: HeaderSet::new(),
            parts: Vec::new(),
            boundary: generate_boundary(),
        }
    }

    /// Replace the generated boundary
    pub fn boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = boundary.into();
        self
    }

    pub fn boundary_str(&self) -> &str {
        &self.boundary
    }

    pub fn kind(&self) -> MultipartKind {
        self.kind
    }

    /// Top-level headers set so far
    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    /// Set an arbitrary top-level header (last write wins)
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn from(self, from: impl Into<String>) -> Self {
        self.header("From", from)
    }

    pub fn to(self, to: impl Into<String>) -> Self {
        self.header("To", to)
    }

    pub fn cc(self, cc: impl Into<String>) -> Self {
        self.header("Cc", cc)
    }

    pub fn bcc(self, bcc: impl Into<String>) -> Self {
        self.header("Bcc", bcc)
    }

    pub fn subject(self, subject: &str) -> Self {
        self.header("Subject", encode_header_word(subject))
    }

    /// Set `In-Reply-To` / `References` verbatim
    pub fn threading_headers(
        mut self,
        in_reply_to: Option<&str>,
        references: Option<&str>,
    ) -> Self {
        if let Some(in_reply_to) = in_reply_to {
            self.headers.set("In-Reply-To", in_reply_to);
        }
        if let Some(references) = references {
            self.headers.set("References", references);
        }
        self
    }

    /// Sent as `7bit`, or `8bit` when the content is not ASCII
    pub fn html_part(self, html: impl Into<String>) -> Self {
        self.text_like_part("text/html; charset=\"UTF-8\"", html.into())
    }

    /// Sent as `7bit`, or `8bit` when the content is not ASCII
    pub fn text_part(self, text: impl Into<String>) -> Self {
        self.text_like_part("text/plain; charset=\"UTF-8\"", text.into())
    }

    fn text_like_part(mut self, content_type: &str, content: String) -> Self {
        self.parts.push(BodyPart {
            content_type: content_type.to_string(),
            headers: HeaderSet::new(),
            encoding: TransferEncoding::for_text(&content),
            content,
        });
        self
    }

    /// Add an attachment whose data is already base64 encoded
    pub fn attachment(mut self, filename: &str, mime_type: &str, base64_data: &str) -> Self {
        let filename = encode_header_word(&sanitize_filename(filename));

        let mut headers = HeaderSet::new();
        headers.set(
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", filename),
        );
        headers.set("Content-Transfer-Encoding", TransferEncoding::Base64.as_str());

        self.parts.push(BodyPart {
            content_type: format!("{}; name=\"{}\"", mime_type, filename),
            headers,
            encoding: TransferEncoding::Base64,
            content: base64_data.to_string(),
        });
        self
    }

    /// Append a fully specified part
    pub fn part(mut self, part: BodyPart) -> Self {
        self.parts.push(part);
        self
    }

    pub fn parts(&self) -> &[BodyPart] {
        &self.parts
    }

    /// Render the message with CRLF line endings
    pub fn build(self) -> String {
        let mut lines = self.headers.to_lines();
        lines.push("MIME-Version: 1.0".to_string());
        lines.push(format!(
            "Content-Type: multipart/{}; boundary=\"{}\"",
            self.kind.as_str(),
            self.boundary
        ));
        lines.push(String::new());
        lines.push(PREAMBLE.to_string());
        lines.push(String::new());

        for part in &self.parts {
            lines.push(format!("--{}", self.boundary));
            part.render(&mut lines);
        }
        lines.push(format!("--{}--", self.boundary));

        lines.join(CRLF)
    }

    /// Render and encode as a transport token
    pub fn build_and_encode(self) -> String {
        encode_transport_token(&self.build())
    }
}

/// Strip characters that would break a quoted filename parameter
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .filter(|c| !matches!(c, '"' | '\r' | '\n'))
        .map(|c| if c == '\\' { '/' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}
