//! On-disk layout: package roots, path derivation and file access.

pub mod io;
mod package_files;
mod roots;

pub use package_files::{SOURCE_EXTENSION, package_file_stems};
pub use roots::{ConfigError, PackageRoot, PackageRoots};
