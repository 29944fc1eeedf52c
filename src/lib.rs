//! # hidl-base
//!
//! Package resolution core for the HAL interface definition language.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! hir      → Coordinator: cached resolution, validation, type lookup
//!   ↓
//! project  → Package roots, path derivation, file access
//!   ↓
//! syntax   → Lexer + parser for .hal sources
//!   ↓
//! base     → Primitives (FqName, DocumentId, positions)
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use hidl::{Coordinator, FqName, HalParser, PackageRoots};
//!
//! let roots = PackageRoots::from_args(["android.hardware:hardware/interfaces"])?;
//! let mut coordinator = Coordinator::new(roots, HalParser::new());
//!
//! let name: FqName = "android.hardware.nfc@1.0::INfc".parse()?;
//! if let Some(id) = coordinator.resolve(&name)? {
//!     println!("resolved {}", coordinator.document_path(id).display());
//! }
//! let diagnostics = coordinator.diagnostics();
//! for diagnostic in &diagnostics {
//!     eprintln!("{diagnostic}");
//! }
//! if diagnostics.has_errors() {
//!     eprintln!("{} error(s)", diagnostics.error_count());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Foundation types: FqName, DocumentId, source positions
pub mod base;

/// Resolution: the coordinator and its collaborator traits
pub mod hir;

/// Package roots and on-disk layout
pub mod project;

/// The .hal source format
pub mod syntax;

pub use base::{DocumentId, FqName, FqNameError, LineCol};
pub use hir::{Coordinator, Diagnostic, Document, DocumentParser, HalParser, ResolveState};
pub use project::{ConfigError, PackageRoot, PackageRoots};
pub use syntax::ParseError;
