//! Resolution of qualified names to parsed documents.
//!
//! - [`Document`], [`DocumentParser`] - the seams to the parsing front end
//! - [`Coordinator`] - the cache that parses each file once and validates it
//! - [`Diagnostic`] - reporting of failed resolutions

mod coordinator;
pub mod diagnostics;
mod document;

pub use coordinator::{Coordinator, ResolveFailure, ResolveState, TypeRef};
pub use diagnostics::{Diagnostic, DiagnosticCollector, RelatedInfo, Severity};
pub use document::{Document, DocumentParser, HalParser};
