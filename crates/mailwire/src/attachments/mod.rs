//! Attachment indexing and download

mod indexer;
mod walk;

pub use indexer::{
    AttachmentIndexer, extension_for_mime, has_attachment, index_attachments, resolve_filename,
};
pub use walk::walk_parts;
