//! Email actions module
//!
//! High-level operations for calling application code: compose and send,
//! attachment access, thread views and label changes.

mod handler;

pub use handler::{LabelAction, MailActions, labels};
