//! Best-effort address extraction from header values
//!
//! This is a heuristic, not a full RFC 5322 address parser.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::EmailAddress;

static ANGLE_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([^<>]+)>").expect("valid angle-address regex"));

static BARE_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[^\s<>"',;:()]+@[^\s<>"',;:()]+"#).expect("valid bare-address regex")
});

/// Extract the address part of a header value
///
/// Prefers the token inside angle brackets, then a bare `local@domain`,
/// then falls back to the trimmed value.
pub fn extract_email_address(value: &str) -> String {
    if let Some(captures) = ANGLE_ADDRESS.captures(value) {
        return captures[1].trim().to_string();
    }
    if let Some(found) = BARE_ADDRESS.find(value) {
        return found.as_str().to_string();
    }
    value.trim().to_string()
}

/// Parse one address with its optional display name
pub fn parse_address(value: &str) -> EmailAddress {
    let value = value.trim();
    let email = extract_email_address(value);
    let name = value
        .find('<')
        .map(|at| value[..at].trim().trim_matches('"').trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    EmailAddress { name, email }
}

/// Parse a comma-separated address list
///
/// Commas inside quoted display names or angle brackets do not split.
pub fn parse_address_list(value: &str) -> Vec<EmailAddress> {
    split_address_list(value)
        .into_iter()
        .map(parse_address)
        .filter(|addr| !addr.email.is_empty())
        .collect()
}

fn split_address_list(value: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut in_quotes = false;
    let mut angle_depth = 0usize;
    let mut start = 0;

    for (index, c) in value.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '<' if !in_quotes => angle_depth += 1,
            '>' if !in_quotes => angle_depth = angle_depth.saturating_sub(1),
            ',' if !in_quotes && angle_depth == 0 => {
                segments.push(&value[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    segments.push(&value[start..]);

    segments
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
