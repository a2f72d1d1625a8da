//! Domain models for mail entities

mod attachment;
mod message;
mod part;
mod thread;

pub use attachment::{
    AttachmentDescriptor, DownloadedAttachment, StableAttachmentId, TransientAttachmentRef,
};
pub use message::{
    EmailAddress, MessageId, RawThread, RemoteMessage, UNREAD_LABEL, format_address_list,
};
pub use part::{HeaderSet, MessagePart, PartBody};
pub use thread::{
    MessageSummary, Participant, ThreadId, ThreadStub, ThreadStubPage, ThreadSummary,
};
