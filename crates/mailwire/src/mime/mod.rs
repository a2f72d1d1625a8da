//! MIME encoding and message construction
//!
//! This module provides:
//! - Encoding primitives (transport tokens, RFC 2047 words, chunking, ids)
//! - A single-part message builder
//! - A multipart message builder

pub mod codec;
mod message;
mod multipart;

pub use message::MessageBuilder;
pub use multipart::{
    BodyPart, MultipartKind, MultipartMessageBuilder, TransferEncoding, sanitize_filename,
};
