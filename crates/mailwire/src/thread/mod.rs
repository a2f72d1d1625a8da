//! Whole-thread assembly and listing

mod assembler;

pub use assembler::{LabelAggregate, ThreadAssembler, assemble, summarize_message};
