//! MIME encoding primitives
//!
//! Transport tokens use the URL-safe base64 alphabet without padding, which is
//! what the remote send endpoint expects for raw messages.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::prelude::*;
use chrono::{DateTime, Utc};
use rand::Rng;

use crate::error::{MailError, Result};

/// Maximum encoded line length for base64 bodies (RFC 2045 §6.8)
pub const DEFAULT_LINE_WIDTH: usize = 76;

/// Line terminator used in every emitted message
pub const CRLF: &str = "\r\n";

/// Encode a full message as a transport token
pub fn encode_transport_token(text: &str) -> String {
    URL_SAFE_NO_PAD.encode(text.as_bytes())
}

/// Decode a transport token back to the message text
pub fn decode_transport_token(token: &str) -> Result<String> {
    let padding = (4 - token.len() % 4) % 4;
    let mut padded = String::with_capacity(token.len() + padding);
    padded.push_str(token);
    padded.extend(std::iter::repeat_n('=', padding));

    let bytes = URL_SAFE
        .decode(padded.as_bytes())
        .map_err(|e| MailError::Decode(format!("invalid transport token: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| MailError::Decode(format!("transport token is not UTF-8: {}", e)))
}

/// Encode a header value as an RFC 2047 encoded-word when it is not ASCII
pub fn encode_header_word(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(value.as_bytes()))
    }
}

/// Standard-alphabet base64 of raw bytes
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a base64 payload from the remote service
///
/// Payloads use the URL-safe alphabet but padding can vary, so several
/// decoders are tried in turn.
pub fn decode_base64_payload(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let decoders: [&base64::engine::GeneralPurpose; 4] =
        [&URL_SAFE_NO_PAD, &URL_SAFE, &STANDARD, &STANDARD_NO_PAD];

    decoders
        .iter()
        .find_map(|decoder| decoder.decode(cleaned.as_bytes()).ok())
        .ok_or_else(|| MailError::Decode("payload is not valid base64".to_string()))
}

/// Split base64 text into CRLF-joined lines of at most `width` characters
///
/// A width of zero falls back to [`DEFAULT_LINE_WIDTH`].
pub fn chunk_base64(data: &str, width: usize) -> String {
    let width = if width == 0 { DEFAULT_LINE_WIDTH } else { width };
    data.as_bytes()
        .chunks(width)
        // base64 text is ASCII, so byte chunks are valid UTF-8
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join(CRLF)
}

/// Format an instant as an RFC 5322 date-time
pub fn format_date(instant: DateTime<Utc>) -> String {
    instant.to_rfc2822()
}

/// Generate a multipart boundary: timestamp plus 128 random bits
///
/// The boundary is not checked against part content; a part containing the
/// exact boundary string would corrupt the message.
pub fn generate_boundary() -> String {
    format!(
        "----=_Part_{}_{}",
        Utc::now().timestamp_millis(),
        random_hex()
    )
}

/// Generate a Message-ID of the form `<timestamp.random@domain>`
pub fn generate_message_id(domain: &str) -> String {
    format!(
        "<{}.{}@{}>",
        Utc::now().timestamp_millis(),
        random_hex(),
        domain
    )
}

fn random_hex() -> String {
    let random_bytes: [u8; 16] = rand::rng().random();
    hex::encode(random_bytes)
}
