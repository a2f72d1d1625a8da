//! Mailwire - email protocol construction and threading
//!
//! This crate provides the layer between a mail client and a remote mailbox
//! service:
//! - MIME encoding primitives and single-part / multipart message builders
//! - Reply and forward threading headers (Message-ID, In-Reply-To, References)
//! - Stable attachment addressing over transient server handles
//! - Whole-thread assembly (ordering, participants, aggregate flags)
//! - A Gmail REST client and an in-memory mailbox behind one trait
//!
//! Everything is synchronous; the remote calls block on the caller's thread.

pub mod actions;
pub mod attachments;
pub mod compose;
pub mod config;
pub mod error;
pub mod gmail;
pub mod logging;
pub mod mailbox;
pub mod mime;
pub mod models;
pub mod thread;
pub mod threading;

pub use actions::{LabelAction, MailActions};
pub use attachments::AttachmentIndexer;
pub use compose::{ComposeFields, ComposedMessage, OutgoingAttachment, ReplyDraft};
pub use crate::config::MailConfig;
pub use error::{AuthExpiredError, MailError, Result};
pub use gmail::{AccessTokenProvider, GmailClient, StaticToken};
pub use logging::{ComponentLogger, LogCrateSink, LogSink, MemorySink};
pub use mailbox::{InMemoryMailbox, MailboxService};
pub use mime::{MessageBuilder, MultipartKind, MultipartMessageBuilder};
pub use models::{
    AttachmentDescriptor, DownloadedAttachment, EmailAddress, MessageId, MessagePart,
    RemoteMessage, StableAttachmentId, ThreadId, ThreadSummary,
};
pub use thread::{LabelAggregate, ThreadAssembler};
pub use threading::ThreadingContext;
