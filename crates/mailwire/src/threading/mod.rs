//! Threading context resolution
//!
//! Pure functions for reading threading headers off fetched messages and
//! deriving the headers of a reply.

mod address;
mod resolver;

pub use address::{extract_email_address, parse_address, parse_address_list};
pub use resolver::{
    ThreadingContext, build_references, clean_subject, extract, forward_subject,
    reference_tokens, reply_subject, thread_depth, validate, validate_headers,
};
