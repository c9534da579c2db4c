//! Model document handling.

pub mod document;

pub use document::{parse_expanded, parse_model, DocumentError, ModelMetadata};
