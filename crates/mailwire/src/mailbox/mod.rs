//! Remote mailbox abstraction
//!
//! This module defines the boundary to the remote mailbox service. The
//! trait-based design allows swapping between the Gmail HTTP client and the
//! in-memory implementation used in tests.

mod memory;
mod traits;

pub use memory::{InMemoryMailbox, SentRecord};
pub use traits::{MailboxService, MessageListEntry, MessageListPage, SentMessage};
