//! Enumerating the source files of one package directory.

use std::path::Path;

use walkdir::WalkDir;

/// Extension of HAL source files.
pub const SOURCE_EXTENSION: &str = "hal";

/// File stems of the `.hal` files directly inside `dir`, sorted.
///
/// Subdirectories (other versions, nested packages) are not descended.
pub fn package_file_stems(dir: &Path) -> Result<Vec<String>, walkdir::Error> {
    let mut stems = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                stems.push(stem.to_string());
            }
        }
    }
    Ok(stems)
}
