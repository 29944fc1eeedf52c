//! Diagnostics — reporting resolution failures.
//!
//! The coordinator records why each file identity failed; this module turns
//! those records into located, coded messages for a front end to print.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::base::{FqName, LineCol};

use super::coordinator::ResolveFailure;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// A diagnostic message with location.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// The file the message is about; `None` for configuration problems.
    pub path: Option<PathBuf>,
    /// Position inside the file, when known.
    pub position: Option<LineCol>,
    pub severity: Severity,
    /// Stable code from [`codes`].
    pub code: Option<Arc<str>>,
    pub message: Arc<str>,
    pub related: Vec<RelatedInfo>,
}

/// Extra context attached to a diagnostic.
#[derive(Clone, Debug)]
pub struct RelatedInfo {
    pub path: Option<PathBuf>,
    pub message: Arc<str>,
}

impl Diagnostic {
    pub fn error(path: Option<PathBuf>, message: impl Into<Arc<str>>) -> Self {
        Self {
            path,
            position: None,
            severity: Severity::Error,
            code: None,
            message: message.into(),
            related: Vec::new(),
        }
    }

    pub fn warning(path: Option<PathBuf>, message: impl Into<Arc<str>>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(path, message)
        }
    }

    pub fn with_position(mut self, position: Option<LineCol>) -> Self {
        self.position = position;
        self
    }

    pub fn with_code(mut self, code: impl Into<Arc<str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_related(mut self, info: RelatedInfo) -> Self {
        self.related.push(info);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.severity.as_str())?;
        if let Some(code) = &self.code {
            write!(f, "[{code}]")?;
        }
        f.write_str(": ")?;
        if let Some(path) = &self.path {
            write!(f, "{}", path.display())?;
            if let Some(position) = self.position {
                write!(f, ":{position}")?;
            }
            f.write_str(": ")?;
        }
        f.write_str(&self.message)?;
        for info in &self.related {
            write!(f, "\n  note: {}", info.message)?;
        }
        Ok(())
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Standard diagnostic codes for resolution failures.
pub mod codes {
    /// Source file does not exist.
    pub const MISSING_FILE: &str = "E0001";
    /// Source file could not be read or parsed.
    pub const PARSE_ERROR: &str = "E0002";
    /// Declared package or version differs from the requested one.
    pub const PACKAGE_MISMATCH: &str = "E0003";
    /// Interface/types shape differs from the requested name.
    pub const DECLARATION_MISMATCH: &str = "E0004";
    /// An import could not be resolved.
    pub const UNRESOLVED_IMPORT: &str = "E0005";
    /// An import reached a file still being resolved.
    pub const CIRCULAR_IMPORT: &str = "E0006";
    /// Package roots do not cover the request.
    pub const CONFIGURATION: &str = "E0007";
}

fn code_for(failure: &ResolveFailure) -> &'static str {
    match failure {
        ResolveFailure::Missing { .. } => codes::MISSING_FILE,
        ResolveFailure::Parse(_) => codes::PARSE_ERROR,
        ResolveFailure::PackageMismatch { .. } => codes::PACKAGE_MISMATCH,
        ResolveFailure::UnexpectedInterface { .. }
        | ResolveFailure::InterfaceMismatch { .. }
        | ResolveFailure::ExpectedInterface { .. } => codes::DECLARATION_MISMATCH,
        ResolveFailure::Import { .. } => codes::UNRESOLVED_IMPORT,
        ResolveFailure::CircularImport { .. } => codes::CIRCULAR_IMPORT,
        ResolveFailure::Config(_) => codes::CONFIGURATION,
    }
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Accumulates diagnostics across a run.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn diagnostics_for_path(&self, path: &Path) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.path.as_deref() == Some(path))
            .collect()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning).count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

impl IntoIterator for DiagnosticCollector {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

impl<'a> IntoIterator for &'a DiagnosticCollector {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}

/// Build one diagnostic per failure.
///
/// A missing file is only a warning: the caller decides whether an absent
/// name matters (a package need not have a types file). `import_cause`
/// supplies the recorded failure of an imported name, attached as a note.
pub(crate) fn failure_diagnostics<'a>(
    failures: impl Iterator<Item = (&'a FqName, &'a ResolveFailure)>,
    import_cause: impl Fn(&FqName) -> Option<String>,
) -> Vec<Diagnostic> {
    failures
        .map(|(name, failure)| {
            let path = failure.path().map(Path::to_path_buf);
            let message = format!("cannot resolve '{name}': {failure}");
            let base = match failure {
                ResolveFailure::Missing { .. } => Diagnostic::warning(path, message),
                _ => Diagnostic::error(path, message),
            };
            let position = match failure {
                ResolveFailure::Parse(err) => err.position(),
                _ => None,
            };
            let mut diag = base.with_position(position).with_code(code_for(failure));

            if let ResolveFailure::Import { import, .. } | ResolveFailure::CircularImport { import, .. } =
                failure
            {
                if let Some(cause) = import_cause(import) {
                    diag = diag.with_related(RelatedInfo {
                        path: None,
                        message: Arc::from(format!("'{import}': {cause}")),
                    });
                }
            }
            diag
        })
        .collect()
}
