//! Foundation types for the resolver.
//!
//! - [`FqName`] - package/version/name triples and their text form
//! - [`DocumentId`] - handles into the coordinator's document arena
//! - [`LineCol`], [`LineIndex`], [`TextRange`] - source positions
//!
//! This module has NO dependencies on other crate modules.

mod document_id;
mod fq_name;
mod span;

pub use document_id::DocumentId;
pub use fq_name::{FqName, FqNameError, TYPES_NAME, VERSION_MARKER};
pub use span::{LineCol, LineIndex, TextRange, TextSize};

pub use text_size;
