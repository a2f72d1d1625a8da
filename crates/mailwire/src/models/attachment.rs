//! Attachment addressing types

use serde::{Deserialize, Serialize};

/// Client-computed attachment identifier derived from tree position
///
/// Stable across repeated inspections of one fetched part tree. Whether it
/// survives an independent refetch depends on the server keeping its own
/// part numbering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StableAttachmentId(pub String);

impl StableAttachmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StableAttachmentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for StableAttachmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-issued download handle, bound to the fetch that produced it
///
/// Deliberately not serializable: it must never outlive its fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientAttachmentRef(String);

impl TransientAttachmentRef {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Metadata for one attachment found in a part tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachmentDescriptor {
    pub stable_id: StableAttachmentId,
    pub filename: String,
    pub mime_type: String,
    /// Size declared by the server, when known
    pub size_bytes: Option<u64>,
    #[serde(skip)]
    pub transient_ref: TransientAttachmentRef,
}

/// Decoded attachment bytes with their metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedAttachment {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
}
