//! Small filesystem helpers used by the file-backed parser.

use std::fs::File;
use std::io;
use std::path::Path;

/// Whether `path` is a regular file that can be opened for reading.
pub fn is_readable(path: &Path) -> bool {
    path.is_file() && File::open(path).is_ok()
}

/// Read a whole source file as UTF-8 text.
pub fn read_source(path: &Path) -> io::Result<String> {
    std::fs::read_to_string(path)
}
