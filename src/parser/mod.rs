//! Parser module - handles parsing POD documentation files

mod directive;
mod document;
mod error;
pub mod inline;
mod options;
mod refs;

pub use document::{parse_document, Block, Document};
pub use error::ParseError;
pub use refs::{extract_refs, Reference};
