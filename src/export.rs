//! Browser-download analog for DOCX export.

use std::path::{Path, PathBuf};

/// Filename the original product downloads exports under.
pub const EXPORT_FILENAME: &str = "resume-tailored.docx";

/// Write exported document bytes next to where the user launched from.
/// Only called with bytes from a successful export; error responses never
/// reach the filesystem.
pub fn write_docx(bytes: &[u8], dir: &Path) -> std::io::Result<PathBuf> {
    let path = dir.join(EXPORT_FILENAME);
    std::fs::write(&path, bytes)?;
    Ok(path)
}
