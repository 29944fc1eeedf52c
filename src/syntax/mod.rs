//! The `.hal` source format: tokens, declaration tree and parser.
//!
//! This is the reference document format consumed by the coordinator
//! through [`crate::hir::DocumentParser`]. Other front ends may plug in
//! their own.

pub mod ast;
pub mod lexer;
pub mod parser;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::base::LineCol;

pub use ast::{HalFile, Scope, TypeDecl, TypeKind};
pub use parser::parse_source;

/// Why a source file could not be turned into a document.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{}: file does not exist or is not readable", .path.display())]
    Missing { path: PathBuf },
    #[error("{}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}:{}: {}", .path.display(), .at, .message)]
    Syntax {
        path: PathBuf,
        at: LineCol,
        message: String,
    },
}

impl ParseError {
    pub fn path(&self) -> &Path {
        match self {
            ParseError::Missing { path }
            | ParseError::Io { path, .. }
            | ParseError::Syntax { path, .. } => path,
        }
    }

    /// Source position, for syntax errors.
    pub fn position(&self) -> Option<LineCol> {
        match self {
            ParseError::Syntax { at, .. } => Some(*at),
            _ => None,
        }
    }
}
