//! The document and parser seams the coordinator is generic over.

use std::path::Path;

use crate::base::FqName;
use crate::project::io;
use crate::syntax::{HalFile, ParseError, TypeDecl, parse_source};

/// A parsed source file, as seen by resolution.
pub trait Document {
    /// What [`Document::lookup_type`] hands out.
    type Type;

    /// The package and version the file declares (local name empty).
    fn package(&self) -> &FqName;

    /// Name of the declared interface, or `None` for a types file.
    fn interface_name(&self) -> Option<&str>;

    /// Imports as written; package and version may be missing.
    fn imports(&self) -> &[FqName];

    /// Look up a dotted type path (`IFoo.Bar`) from the file's top level.
    fn lookup_type(&self, path: &str) -> Option<&Self::Type>;
}

/// Turns a source path into a [`Document`].
pub trait DocumentParser {
    type Document: Document;

    fn parse(&mut self, path: &Path) -> Result<Self::Document, ParseError>;
}

impl Document for HalFile {
    type Type = TypeDecl;

    fn package(&self) -> &FqName {
        &self.package
    }

    fn interface_name(&self) -> Option<&str> {
        self.interface().map(|decl| decl.name.as_str())
    }

    fn imports(&self) -> &[FqName] {
        &self.imports
    }

    fn lookup_type(&self, path: &str) -> Option<&TypeDecl> {
        self.root.lookup_path(path)
    }
}

/// Parses `.hal` files from disk.
#[derive(Debug, Default)]
pub struct HalParser {
    parse_count: usize,
}

impl HalParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files this parser has been asked to parse.
    pub fn parse_count(&self) -> usize {
        self.parse_count
    }
}

impl DocumentParser for HalParser {
    type Document = HalFile;

    fn parse(&mut self, path: &Path) -> Result<HalFile, ParseError> {
        self.parse_count += 1;

        if !io::is_readable(path) {
            return Err(ParseError::Missing {
                path: path.to_path_buf(),
            });
        }
        let text = io::read_source(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse_source(&text, path)
    }
}
