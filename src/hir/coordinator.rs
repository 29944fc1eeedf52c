//! Cached, at-most-once resolution of qualified names to documents.
//!
//! The [`Coordinator`] owns every document it parses. Each file identity
//! (package, version, top-level name) moves through
//!
//! ```text
//! Unseen -> Resolving -> Resolved(DocumentId)
//!                     \-> Failed(ResolveFailure)
//! ```
//!
//! and is handed to the parser at most once. `Resolving` is entered before
//! any recursive work, so an import cycle that reaches back to a key still
//! being resolved observes it and reports "not found" for that edge instead
//! of recursing.

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use smol_str::SmolStr;
use thiserror::Error;
use tracing::{debug, error, trace, warn};

use crate::base::{DocumentId, FqName};
use crate::project::{ConfigError, PackageRoots, package_file_stems};
use crate::syntax::ParseError;

use super::diagnostics::{self, DiagnosticCollector};
use super::document::{Document, DocumentParser};

/// Why a file identity could not be resolved.
///
/// Failures are recoverable: they surface as a `None` result and are kept
/// for diagnostics.
#[derive(Debug, Error)]
pub enum ResolveFailure {
    #[error("file at '{}' does not exist", .path.display())]
    Missing { path: PathBuf },
    #[error(transparent)]
    Parse(ParseError),
    #[error(
        "file at '{}' does not match expected package and/or version (expected '{expected}', found '{found}')",
        .path.display()
    )]
    PackageMismatch {
        path: PathBuf,
        expected: FqName,
        found: FqName,
    },
    #[error(
        "file at '{}' declares an interface '{interface}' instead of the expected types common to the package",
        .path.display()
    )]
    UnexpectedInterface { path: PathBuf, interface: SmolStr },
    #[error(
        "file at '{}' does not declare interface type '{expected}' (found '{found}')",
        .path.display()
    )]
    InterfaceMismatch {
        path: PathBuf,
        expected: SmolStr,
        found: SmolStr,
    },
    #[error(
        "file at '{}' declares types rather than the expected interface type '{expected}'",
        .path.display()
    )]
    ExpectedInterface { path: PathBuf, expected: SmolStr },
    #[error("file at '{}' imports '{import}', which could not be resolved", .path.display())]
    Import { path: PathBuf, import: FqName },
    #[error("file at '{}' imports '{import}', which is part of a circular import", .path.display())]
    CircularImport { path: PathBuf, import: FqName },
    #[error(transparent)]
    Config(ConfigError),
}

impl ResolveFailure {
    /// The file the failure is about, if one was located.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ResolveFailure::Missing { path }
            | ResolveFailure::PackageMismatch { path, .. }
            | ResolveFailure::UnexpectedInterface { path, .. }
            | ResolveFailure::InterfaceMismatch { path, .. }
            | ResolveFailure::ExpectedInterface { path, .. }
            | ResolveFailure::Import { path, .. }
            | ResolveFailure::CircularImport { path, .. } => Some(path),
            ResolveFailure::Parse(err) => Some(err.path()),
            ResolveFailure::Config(_) => None,
        }
    }
}

/// Observable state of one file identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolveState {
    Unseen,
    /// Resolution started and has not finished. Transient: every key is
    /// resolved or failed by the time `resolve` returns.
    Resolving,
    Resolved(DocumentId),
    Failed,
}

/// A type found by [`Coordinator::lookup_type`].
#[derive(Debug)]
pub struct TypeRef<'a, T> {
    /// The name that was looked up.
    pub name: FqName,
    /// Document declaring the type.
    pub document: DocumentId,
    pub ty: &'a T,
}

enum Slot {
    Resolving,
    Resolved(DocumentId),
    Failed(ResolveFailure),
}

/// Why a lookup did not produce a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Unresolved {
    /// The key is still being resolved further up the stack.
    Pending,
    Failed,
}

type Outcome = Result<DocumentId, Unresolved>;

enum LoadError {
    Config(ConfigError),
    Failed(ResolveFailure),
}

impl From<ConfigError> for LoadError {
    fn from(err: ConfigError) -> Self {
        LoadError::Config(err)
    }
}

impl From<ResolveFailure> for LoadError {
    fn from(failure: ResolveFailure) -> Self {
        LoadError::Failed(failure)
    }
}

struct Entry<D> {
    name: FqName,
    path: PathBuf,
    document: D,
}

/// Resolves qualified names to documents, parsing each file at most once.
pub struct Coordinator<P: DocumentParser> {
    roots: PackageRoots,
    parser: P,
    /// Keyed by file identity, in order of first request.
    cache: IndexMap<FqName, Slot>,
    documents: Vec<Entry<P::Document>>,
}

impl<P: DocumentParser> Coordinator<P> {
    pub fn new(roots: PackageRoots, parser: P) -> Self {
        Self {
            roots,
            parser,
            cache: IndexMap::new(),
            documents: Vec::new(),
        }
    }

    pub fn roots(&self) -> &PackageRoots {
        &self.roots
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    /// Resolve `name` to the document declaring its top-level type.
    ///
    /// `Ok(None)` means not found: missing or invalid file, failed import,
    /// or a cyclic request for a name that is still being resolved.
    /// Configuration errors abort and are returned as `Err`.
    pub fn resolve(&mut self, name: &FqName) -> Result<Option<DocumentId>, ConfigError> {
        if !name.is_fully_qualified() {
            return Err(ConfigError::NotFullyQualified(name.clone()));
        }
        Ok(self.resolve_key(name.file_identity())?.ok())
    }

    fn resolve_key(&mut self, key: FqName) -> Result<Outcome, ConfigError> {
        if let Some(slot) = self.cache.get(&key) {
            trace!(name = %key, "cache hit");
            return match slot {
                Slot::Resolved(id) => Ok(Ok(*id)),
                // Configuration errors stay fatal on every request.
                Slot::Failed(ResolveFailure::Config(err)) => Err(err.clone()),
                Slot::Failed(_) => Ok(Err(Unresolved::Failed)),
                Slot::Resolving => {
                    warn!(name = %key, "circular import, treating as not found");
                    Ok(Err(Unresolved::Pending))
                }
            };
        }

        self.cache.insert(key.clone(), Slot::Resolving);

        match self.load(&key) {
            Ok((path, document)) => {
                let id = DocumentId::from_index(self.documents.len());
                debug!(name = %key, path = %path.display(), %id, "resolved");
                self.documents.push(Entry {
                    name: key.clone(),
                    path,
                    document,
                });
                self.cache.insert(key, Slot::Resolved(id));
                Ok(Ok(id))
            }
            Err(LoadError::Failed(failure)) => {
                self.cache.insert(key, Slot::Failed(failure));
                Ok(Err(Unresolved::Failed))
            }
            Err(LoadError::Config(err)) => {
                self.cache.insert(key, Slot::Failed(ResolveFailure::Config(err.clone())));
                Err(err)
            }
        }
    }

    fn load(&mut self, key: &FqName) -> Result<(PathBuf, P::Document), LoadError> {
        if !key.is_types() {
            // Interface files implicitly import their package's types file,
            // which need not exist.
            let _types = self.resolve_key(key.types_for_package())?;
        }

        let path = self.roots.file_path(key)?;
        debug!(name = %key, path = %path.display(), "parsing");

        let document = self.parser.parse(&path).map_err(|err| match err {
            ParseError::Missing { path } => {
                debug!(name = %key, path = %path.display(), "no such file");
                ResolveFailure::Missing { path }
            }
            other => {
                error!("{other}");
                ResolveFailure::Parse(other)
            }
        })?;

        validate(key, &path, &document)?;
        self.resolve_imports(key, &path, &document)?;

        Ok((path, document))
    }

    fn resolve_imports(
        &mut self,
        key: &FqName,
        path: &Path,
        document: &P::Document,
    ) -> Result<(), LoadError> {
        for import in document.imports() {
            let import = import.apply_defaults(key.package(), key.version());
            let outcome = if import.is_package_only() {
                self.import_package(&import)?
            } else {
                self.import_type(&import)?
            };

            let failure = match outcome {
                Ok(()) => continue,
                Err(Unresolved::Pending) => ResolveFailure::CircularImport {
                    path: path.to_path_buf(),
                    import,
                },
                Err(Unresolved::Failed) => ResolveFailure::Import {
                    path: path.to_path_buf(),
                    import,
                },
            };
            error!("{failure}");
            return Err(failure.into());
        }
        Ok(())
    }

    /// An interface (or one of its nested types), else the package's types.
    fn import_type(&mut self, import: &FqName) -> Result<Result<(), Unresolved>, ConfigError> {
        let first = match self.resolve_key(import.file_identity())? {
            Ok(_) => return Ok(Ok(())),
            Err(reason) => reason,
        };
        let second = match self.resolve_key(import.types_for_package())? {
            Ok(_) => return Ok(Ok(())),
            Err(reason) => reason,
        };
        if first == Unresolved::Pending || second == Unresolved::Pending {
            Ok(Err(Unresolved::Pending))
        } else {
            Ok(Err(Unresolved::Failed))
        }
    }

    /// Every file of a package.
    fn import_package(&mut self, import: &FqName) -> Result<Result<(), Unresolved>, ConfigError> {
        let members = self.package_interfaces(import)?;
        if members.is_empty() {
            warn!(package = %import, "imported package has no source files");
            return Ok(Err(Unresolved::Failed));
        }
        for member in members {
            if let Err(reason) = self.resolve_key(member)? {
                return Ok(Err(reason));
            }
        }
        Ok(Ok(()))
    }

    /// Names of all source files (interfaces and `types`) in `package`'s
    /// directory, sorted by file name. An unreadable directory yields none.
    pub fn package_interfaces(&self, package: &FqName) -> Result<Vec<FqName>, ConfigError> {
        let dir = self.roots.package_path(package, false)?;
        match package_file_stems(Path::new(&dir)) {
            Ok(stems) => Ok(stems.into_iter().map(|stem| package.with_name(stem)).collect()),
            Err(err) => {
                warn!(package = %package, dir = %dir, "cannot list package directory: {err}");
                Ok(Vec::new())
            }
        }
    }

    /// Find an already-resolved type. Never parses.
    ///
    /// The first segment of the local name is tried as an interface file,
    /// then the package's types file.
    pub fn lookup_type(
        &self,
        name: &FqName,
    ) -> Result<Option<TypeRef<'_, <P::Document as Document>::Type>>, ConfigError> {
        if !name.is_fully_qualified() {
            return Err(ConfigError::NotFullyQualified(name.clone()));
        }

        for key in [name.file_identity(), name.types_for_package()] {
            let Some(Slot::Resolved(id)) = self.cache.get(&key) else {
                continue;
            };
            if let Some(ty) = self.document(*id).lookup_type(name.name()) {
                trace!(name = %name, document = %id, "type found");
                return Ok(Some(TypeRef {
                    name: name.clone(),
                    document: *id,
                    ty,
                }));
            }
        }

        trace!(name = %name, "type not found");
        Ok(None)
    }

    /// Visit every resolved document in cache order, stopping at the first
    /// error.
    pub fn for_each_document<E>(
        &self,
        mut visit: impl FnMut(&FqName, &P::Document) -> Result<(), E>,
    ) -> Result<(), E> {
        for (name, slot) in &self.cache {
            if let Slot::Resolved(id) = slot {
                visit(name, self.document(*id))?;
            }
        }
        Ok(())
    }

    /// Resolved documents in the order they were installed.
    pub fn documents(&self) -> impl Iterator<Item = (DocumentId, &P::Document)> {
        self.documents
            .iter()
            .enumerate()
            .map(|(index, entry)| (DocumentId::from_index(index), &entry.document))
    }

    /// # Panics
    ///
    /// If `id` was not handed out by this coordinator.
    pub fn document(&self, id: DocumentId) -> &P::Document {
        &self.entry(id).document
    }

    /// File identity a document was resolved under.
    ///
    /// # Panics
    ///
    /// If `id` was not handed out by this coordinator.
    pub fn document_name(&self, id: DocumentId) -> &FqName {
        &self.entry(id).name
    }

    /// # Panics
    ///
    /// If `id` was not handed out by this coordinator.
    pub fn document_path(&self, id: DocumentId) -> &Path {
        &self.entry(id).path
    }

    /// The document behind `id`, or `None` for an id from elsewhere.
    pub fn try_document(&self, id: DocumentId) -> Option<&P::Document> {
        self.documents.get(id.index()).map(|entry| &entry.document)
    }

    fn entry(&self, id: DocumentId) -> &Entry<P::Document> {
        match self.documents.get(id.index()) {
            Some(entry) => entry,
            None => panic!("{id} was not issued by this coordinator"),
        }
    }

    /// The resolved document for `name`'s file identity, without resolving.
    pub fn get(&self, name: &FqName) -> Option<&P::Document> {
        match self.state(name) {
            ResolveState::Resolved(id) => Some(self.document(id)),
            _ => None,
        }
    }

    pub fn state(&self, name: &FqName) -> ResolveState {
        match self.cache.get(&name.file_identity()) {
            None => ResolveState::Unseen,
            Some(Slot::Resolving) => ResolveState::Resolving,
            Some(Slot::Resolved(id)) => ResolveState::Resolved(*id),
            Some(Slot::Failed(_)) => ResolveState::Failed,
        }
    }

    pub fn failure(&self, name: &FqName) -> Option<&ResolveFailure> {
        match self.cache.get(&name.file_identity()) {
            Some(Slot::Failed(failure)) => Some(failure),
            _ => None,
        }
    }

    /// Failed file identities in cache order.
    pub fn failures(&self) -> impl Iterator<Item = (&FqName, &ResolveFailure)> {
        self.cache.iter().filter_map(|(name, slot)| match slot {
            Slot::Failed(failure) => Some((name, failure)),
            _ => None,
        })
    }

    /// Number of file identities ever requested.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// One diagnostic per failed file identity, in cache order.
    pub fn diagnostics(&self) -> DiagnosticCollector {
        let mut collector = DiagnosticCollector::new();
        collector.extend(diagnostics::failure_diagnostics(self.failures(), |import| {
            self.failure(import).map(ToString::to_string)
        }));
        collector
    }
}

fn validate<D: Document>(key: &FqName, path: &Path, document: &D) -> Result<(), ResolveFailure> {
    let declared = document.package();
    let failure = if declared.package() != key.package() || declared.version() != key.version() {
        Some(ResolveFailure::PackageMismatch {
            path: path.to_path_buf(),
            expected: key.package_and_version(),
            found: declared.package_and_version(),
        })
    } else {
        match document.interface_name() {
            Some(interface) if key.is_types() => Some(ResolveFailure::UnexpectedInterface {
                path: path.to_path_buf(),
                interface: interface.into(),
            }),
            Some(interface) if interface != key.name() => Some(ResolveFailure::InterfaceMismatch {
                path: path.to_path_buf(),
                expected: key.name().into(),
                found: interface.into(),
            }),
            Some(_) => None,
            None if !key.is_types() => Some(ResolveFailure::ExpectedInterface {
                path: path.to_path_buf(),
                expected: key.name().into(),
            }),
            None => None,
        }
    };

    match failure {
        Some(failure) => {
            error!("{failure}");
            Err(failure)
        }
        None => Ok(()),
    }
}

impl<P: DocumentParser> fmt::Debug for Coordinator<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("roots", &self.roots)
            .field("requested", &self.cache.len())
            .field("documents", &self.documents.len())
            .finish()
    }
}
