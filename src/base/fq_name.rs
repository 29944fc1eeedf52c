//! Fully-qualified names: `package@major.minor::Name`.

use std::fmt;
use std::str::FromStr;

use smol_str::SmolStr;
use thiserror::Error;

/// Marker that starts every version string.
pub const VERSION_MARKER: char = '@';

/// Local name of the per-package shared types file.
pub const TYPES_NAME: &str = "types";

/// Errors produced when parsing the text form of a qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FqNameError {
    #[error("empty qualified name")]
    Empty,
    #[error("invalid identifier '{segment}' in '{text}'")]
    InvalidIdentifier { text: String, segment: String },
    #[error("invalid version '{version}' in '{text}' (expected @<major>.<minor>)")]
    InvalidVersion { text: String, version: String },
    #[error("missing local name after '::' in '{0}'")]
    MissingName(String),
}

/// A qualified name: package, version and local (possibly dotted) name.
///
/// Any of the three parts may be empty; a name is only usable as a
/// resolution request once [`FqName::is_fully_qualified`] holds.
///
/// Equality, hashing and ordering compare the `(package, version, name)`
/// triple, so the type doubles as a cache key.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FqName {
    package: SmolStr,
    version: SmolStr,
    name: SmolStr,
}

impl FqName {
    /// Build a name from its parts without validation.
    pub fn new(
        package: impl Into<SmolStr>,
        version: impl Into<SmolStr>,
        name: impl Into<SmolStr>,
    ) -> Self {
        Self {
            package: package.into(),
            version: version.into(),
            name: name.into(),
        }
    }

    /// Parse the text form. See the [`FromStr`] impl for accepted shapes.
    pub fn parse(text: &str) -> Result<Self, FqNameError> {
        text.parse()
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// The version including its leading `@`.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True iff package, version and name are all non-empty.
    pub fn is_fully_qualified(&self) -> bool {
        !self.package.is_empty() && !self.version.is_empty() && !self.name.is_empty()
    }

    /// True for `pkg@1.0` with no local name.
    pub fn is_package_only(&self) -> bool {
        !self.package.is_empty() && !self.version.is_empty() && self.name.is_empty()
    }

    /// The first dot-segment of the local name (`IFoo` for `IFoo.Bar`).
    pub fn top_level_name(&self) -> &str {
        self.name.split('.').next().unwrap_or_default()
    }

    /// Whether the local name is the shared types file.
    pub fn is_types(&self) -> bool {
        self.name == TYPES_NAME
    }

    /// Same package and version with a different local name.
    pub fn with_name(&self, name: impl Into<SmolStr>) -> Self {
        Self {
            package: self.package.clone(),
            version: self.version.clone(),
            name: name.into(),
        }
    }

    /// The identity of the source file that declares this name.
    ///
    /// Nested names share the file of their top-level declaration.
    pub fn file_identity(&self) -> Self {
        if self.name.contains('.') {
            self.with_name(self.top_level_name())
        } else {
            self.clone()
        }
    }

    /// The `types` file of this name's package.
    pub fn types_for_package(&self) -> Self {
        self.with_name(TYPES_NAME)
    }

    /// This name with the local part dropped.
    pub fn package_and_version(&self) -> Self {
        self.with_name("")
    }

    /// Fill in an empty package and/or version, as for a relative import.
    pub fn apply_defaults(&self, package: &str, version: &str) -> Self {
        let mut out = self.clone();
        if out.package.is_empty() {
            out.package = SmolStr::new(package);
        }
        if out.version.is_empty() {
            out.version = SmolStr::new(version);
        }
        out
    }

    /// Major and minor version numbers, if the version is well formed.
    pub fn version_components(&self) -> Option<(u32, u32)> {
        let rest = self.version.strip_prefix(VERSION_MARKER)?;
        let (major, minor) = rest.split_once('.')?;
        Some((major.parse().ok()?, minor.parse().ok()?))
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first == '_' || unicode_ident::is_xid_start(first) => {
            chars.all(unicode_ident::is_xid_continue)
        }
        _ => false,
    }
}

fn check_dotted(text: &str, dotted: &str) -> Result<(), FqNameError> {
    for segment in dotted.split('.') {
        if !is_identifier(segment) {
            return Err(FqNameError::InvalidIdentifier {
                text: text.to_string(),
                segment: segment.to_string(),
            });
        }
    }
    Ok(())
}

fn check_version(text: &str, version: &str) -> Result<(), FqNameError> {
    let valid = version
        .strip_prefix(VERSION_MARKER)
        .and_then(|rest| rest.split_once('.'))
        .is_some_and(|(major, minor)| {
            !major.is_empty()
                && !minor.is_empty()
                && major.bytes().all(|b| b.is_ascii_digit())
                && minor.bytes().all(|b| b.is_ascii_digit())
        });
    if valid {
        Ok(())
    } else {
        Err(FqNameError::InvalidVersion {
            text: text.to_string(),
            version: version.to_string(),
        })
    }
}

impl FromStr for FqName {
    type Err = FqNameError;

    /// Accepts `pkg@1.0::Name`, `pkg@1.0`, `@1.0::Name` and a bare
    /// (possibly dotted) `Name`. Without an `@` the whole text is a local
    /// name.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        if text.is_empty() {
            return Err(FqNameError::Empty);
        }

        let Some(at) = text.find(VERSION_MARKER) else {
            check_dotted(text, text)?;
            return Ok(Self::new("", "", text));
        };

        let package = &text[..at];
        let (version, name) = match text[at..].split_once("::") {
            Some((version, name)) => {
                if name.is_empty() {
                    return Err(FqNameError::MissingName(text.to_string()));
                }
                (version, name)
            }
            None => (&text[at..], ""),
        };

        if !package.is_empty() {
            check_dotted(text, package)?;
        }
        check_version(text, version)?;
        if !name.is_empty() {
            check_dotted(text, name)?;
        }

        Ok(Self::new(package, version, name))
    }
}

impl fmt::Display for FqName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.package, self.version)?;
        if !self.name.is_empty() {
            if !self.package.is_empty() || !self.version.is_empty() {
                f.write_str("::")?;
            }
            f.write_str(&self.name)?;
        }
        Ok(())
    }
}

impl fmt::Debug for FqName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FqName({self})")
    }
}
