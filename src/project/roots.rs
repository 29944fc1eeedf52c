//! Package roots: mapping logical package prefixes to directories.

use std::path::PathBuf;
use std::str::FromStr;

use smol_str::SmolStr;
use thiserror::Error;

use crate::base::{FqName, VERSION_MARKER};

/// Configuration and precondition violations.
///
/// These mean the tool was set up inconsistently with what it is being
/// asked to resolve, so they abort resolution instead of degrading to a
/// "not found" result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("'{0}' is not fully qualified")]
    NotFullyQualified(FqName),
    #[error("no package root configured for package '{package}'")]
    NoPackageRoot { package: String },
    #[error("version '{version}' of '{name}' must be '@' followed by a version number")]
    InvalidVersion { name: FqName, version: String },
    #[error("package '{package}' names the package root '{prefix}' itself")]
    PackageIsRoot { package: String, prefix: String },
    #[error("malformed package root '{0}' (expected <prefix>:<path>)")]
    MalformedRoot(String),
}

/// One `prefix -> directory` entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageRoot {
    prefix: SmolStr,
    path: String,
}

impl PackageRoot {
    /// A trailing `.` on the prefix is ignored.
    pub fn new(prefix: &str, path: impl Into<String>) -> Result<Self, ConfigError> {
        let path = path.into();
        let prefix = prefix.trim_end_matches('.');
        if prefix.is_empty() || path.is_empty() {
            return Err(ConfigError::MalformedRoot(format!("{prefix}:{path}")));
        }
        Ok(Self {
            prefix: SmolStr::new(prefix),
            path,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The prefix must cover whole dot-separated segments of `package`.
    pub fn matches(&self, package: &str) -> bool {
        package
            .strip_prefix(self.prefix.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
    }

    /// `package` with the prefix and its separator removed.
    fn suffix_of<'p>(&self, package: &'p str) -> Option<&'p str> {
        package
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix('.')
            .filter(|rest| !rest.is_empty())
    }

    fn path_with_separator(&self) -> String {
        if self.path.ends_with('/') {
            self.path.clone()
        } else {
            format!("{}/", self.path)
        }
    }
}

impl FromStr for PackageRoot {
    type Err = ConfigError;

    /// Parses `prefix:path`, as given on a command line.
    fn from_str(arg: &str) -> Result<Self, Self::Err> {
        let (prefix, path) = arg
            .split_once(':')
            .ok_or_else(|| ConfigError::MalformedRoot(arg.to_string()))?;
        Self::new(prefix, path).map_err(|_| ConfigError::MalformedRoot(arg.to_string()))
    }
}

/// Ordered table of package roots.
///
/// Lookups scan entries in configuration order and the first matching
/// entry wins, even if a later entry would match more specifically.
#[derive(Clone, Debug, Default)]
pub struct PackageRoots {
    entries: Vec<PackageRoot>,
}

impl PackageRoots {
    pub fn new<P, R>(pairs: impl IntoIterator<Item = (P, R)>) -> Result<Self, ConfigError>
    where
        P: AsRef<str>,
        R: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .map(|(prefix, path)| PackageRoot::new(prefix.as_ref(), path))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// Build from `prefix:path` strings.
    pub fn from_args<S: AsRef<str>>(args: impl IntoIterator<Item = S>) -> Result<Self, ConfigError> {
        let entries = args
            .into_iter()
            .map(|arg| arg.as_ref().parse())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    pub fn push(&mut self, root: PackageRoot) {
        self.entries.push(root);
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackageRoot> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry backing `name`'s package. Package and version must be set.
    pub fn find_root(&self, name: &FqName) -> Result<&PackageRoot, ConfigError> {
        if name.package().is_empty() || name.version().is_empty() {
            return Err(ConfigError::NotFullyQualified(name.clone()));
        }

        let package = name.package();
        let mut candidates = self.entries.iter().filter(|root| root.matches(package));
        let root = candidates.next().ok_or_else(|| ConfigError::NoPackageRoot {
            package: package.to_string(),
        })?;

        let shadowed: Vec<&str> = candidates.map(PackageRoot::prefix).collect();
        if !shadowed.is_empty() {
            tracing::debug!(
                package,
                chosen = root.prefix(),
                ?shadowed,
                "multiple package roots match; using the first configured"
            );
        }

        Ok(root)
    }

    /// The prefix of the entry backing `name`.
    pub fn package_root(&self, name: &FqName) -> Result<&str, ConfigError> {
        self.find_root(name).map(PackageRoot::prefix)
    }

    /// Directory holding `name`'s package, with a trailing `/`.
    ///
    /// For the root `android.hardware -> hardware/interfaces`, package
    /// `android.hardware.nfc` and version `@1.0` this is
    /// `hardware/interfaces/nfc/1.0/`, or `nfc/1.0/` when `relative`.
    pub fn package_path(&self, name: &FqName, relative: bool) -> Result<String, ConfigError> {
        let root = self.find_root(name)?;

        let version = name
            .version()
            .strip_prefix(VERSION_MARKER)
            .filter(|rest| !rest.is_empty())
            .ok_or_else(|| ConfigError::InvalidVersion {
                name: name.clone(),
                version: name.version().to_string(),
            })?;

        let suffix = root
            .suffix_of(name.package())
            .ok_or_else(|| ConfigError::PackageIsRoot {
                package: name.package().to_string(),
                prefix: root.prefix().to_string(),
            })?;

        let mut path = if relative {
            String::new()
        } else {
            root.path_with_separator()
        };
        for segment in suffix.split('.') {
            path.push_str(segment);
            path.push('/');
        }
        path.push_str(version);
        path.push('/');
        Ok(path)
    }

    /// Source file declaring `name`'s top-level type.
    pub fn file_path(&self, name: &FqName) -> Result<PathBuf, ConfigError> {
        let mut path = self.package_path(name, false)?;
        path.push_str(name.top_level_name());
        path.push_str(".hal");
        Ok(PathBuf::from(path))
    }
}
