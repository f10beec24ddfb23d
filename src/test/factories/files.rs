//! Factory methods for files on disk.
//!
//! The reader checks that a library exists before asking its metadata source, so tests
//! running on synthetic modules still need a file at the module path.

use std::path::PathBuf;

use tempfile::TempDir;

/// Bytes written to placeholder libraries, a DOS signature without a PE image behind it
pub const PLACEHOLDER_IMAGE: &[u8] = b"MZ";

/// Creates a placeholder library named `name` in `dir` and returns its absolute path.
pub fn create_library_file(dir: &TempDir, name: &str) -> PathBuf {
    let path = std::path::absolute(dir.path().join(name)).unwrap();
    std::fs::write(&path, PLACEHOLDER_IMAGE).unwrap();
    path
}

/// Creates a system directory holding an empty `mscoree.dll`.
pub fn create_shim_directory() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("mscoree.dll"), PLACEHOLDER_IMAGE).unwrap();
    dir
}
