//! MIME part tree and header storage

use serde::{Deserialize, Serialize};

use super::TransientAttachmentRef;

/// Ordered header list with case-insensitive lookup
///
/// Setting an existing name replaces its value in place, so output order
/// always follows first insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing any existing value for the same name
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Append a header without replacing earlier values of the same name
    ///
    /// Used when mirroring remote header lists, which may repeat names.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value for the name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove every value for the name, returning the first one
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let position = self
            .entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))?;
        let (_, value) = self.entries.remove(position);
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        Some(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as `Name: value` lines (without line terminators)
    pub fn to_lines(&self) -> Vec<String> {
        self.iter().map(|(n, v)| format!("{}: {}", n, v)).collect()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for HeaderSet {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}

/// Body of a MIME part as exposed by the remote service
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartBody {
    /// Declared size in bytes
    pub size: Option<u64>,
    /// Inline base64url payload, when the server returned one
    pub data: Option<String>,
    /// Handle for downloading the payload separately (valid for this fetch only)
    pub attachment_ref: Option<TransientAttachmentRef>,
}

/// One node of a message's MIME part tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagePart {
    /// Server-declared part id (e.g. "1.0"), if any
    pub part_id: Option<String>,
    pub mime_type: String,
    /// Explicit filename declared by the server
    pub filename: Option<String>,
    pub headers: HeaderSet,
    pub body: PartBody,
    pub children: Vec<MessagePart>,
}

impl MessagePart {
    pub fn new(mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            ..Self::default()
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn with_part_id(mut self, part_id: impl Into<String>) -> Self {
        self.part_id = Some(part_id.into());
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.body.data = Some(data.into());
        self
    }

    pub fn with_attachment_ref(mut self, reference: TransientAttachmentRef, size: u64) -> Self {
        self.body.attachment_ref = Some(reference);
        self.body.size = Some(size);
        self
    }

    pub fn with_children(mut self, children: Vec<MessagePart>) -> Self {
        self.children = children;
        self
    }
}
