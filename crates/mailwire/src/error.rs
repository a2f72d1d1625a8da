//! Error taxonomy for mail construction, threading and remote calls

use thiserror::Error;

/// Error returned by the remote layer when credentials were rejected
///
/// Remote implementations return this inside an `anyhow::Error`; call sites
/// wrapping remote failures surface it as [`MailError::AuthExpired`].
#[derive(Debug, Error)]
#[error("Access token expired or revoked")]
pub struct AuthExpiredError;

/// Errors produced by this crate
#[derive(Debug, Error)]
pub enum MailError {
    /// Threading headers failed validation before send
    #[error("Invalid message headers: {0}")]
    Validation(String),

    /// The stable attachment id does not exist in a fresh fetch of the message
    #[error("Attachment {stable_id} not found in message {message_id}")]
    NotFound {
        message_id: String,
        stable_id: String,
    },

    /// Attachment exceeds the configured size ceiling
    #[error("Attachment size {size} exceeds limit of {limit} bytes")]
    SizeExceeded { size: u64, limit: u64 },

    /// A call to the remote mailbox service failed
    #[error("Remote operation '{operation}' failed: {source}")]
    Remote {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// Credentials are no longer valid; the session must re-authenticate
    #[error("Authorization expired during '{operation}'")]
    AuthExpired { operation: &'static str },

    /// An operation could not produce a result from the data it was given
    #[error("Operation failed: {0}")]
    OperationFailed(String),

    /// A base64 or UTF-8 payload could not be decoded
    #[error("Failed to decode payload: {0}")]
    Decode(String),
}

impl MailError {
    /// Wrap a remote failure, tagging it with the attempted operation
    pub fn remote(operation: &'static str, source: anyhow::Error) -> Self {
        if source.downcast_ref::<AuthExpiredError>().is_some() {
            return Self::AuthExpired { operation };
        }
        Self::Remote { operation, source }
    }

    /// Whether the session layer should force re-authentication
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired { .. })
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, MailError>;
