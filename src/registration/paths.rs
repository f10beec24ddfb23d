//! File name convention of component libraries.
//!
//! A managed component `X` ships as `X.dll`. Components targeting .NET Core are activated
//! through a native host next to it, `X.comhost.dll`. Either file may be handed to the reader,
//! both map to the same base path `X`.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use crate::{Error::UnsupportedFileName, Result};

const LIBRARY_EXTENSION: &str = "dll";
const COMHOST_SEGMENT: &str = "comhost";

/// Strips the library extension, and the `comhost` marker if present, from `path`.
///
/// The directory part is kept as given.
///
/// # Errors
/// Returns [`crate::Error::UnsupportedFileName`] if the file name has no extension, or an
/// extension other than `.dll`. Runtime configuration files (`.json`) are rejected as well.
///
/// ```rust
/// use comscope::registration::paths::base_path;
/// use std::path::Path;
///
/// assert_eq!(base_path(Path::new("/opt/Widgets.comhost.dll"))?, Path::new("/opt/Widgets"));
/// assert_eq!(base_path(Path::new("Widgets.Core.DLL"))?, Path::new("Widgets.Core"));
/// assert!(base_path(Path::new("Widgets.runtimeconfig.json")).is_err());
/// # Ok::<(), comscope::Error>(())
/// ```
pub fn base_path(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| UnsupportedFileName(path.display().to_string()))?;

    let segments: Vec<&str> = file_name.split('.').collect();
    let Some((extension, stem)) = segments.split_last() else {
        return Err(UnsupportedFileName(file_name.to_string()));
    };

    if stem.is_empty() || !extension.eq_ignore_ascii_case(LIBRARY_EXTENSION) {
        return Err(UnsupportedFileName(file_name.to_string()));
    }

    let stem = match stem.split_last() {
        Some((last, rest)) if segments.len() >= 3 && last.eq_ignore_ascii_case(COMHOST_SEGMENT) => {
            rest
        }
        _ => stem,
    };

    let base_name = stem.join(".");
    if base_name.is_empty() {
        return Err(UnsupportedFileName(file_name.to_string()));
    }

    Ok(path.with_file_name(base_name))
}

/// Path of the managed library for `path`.
///
/// # Errors
/// See [`base_path`].
pub fn library_path(path: &Path) -> Result<PathBuf> {
    Ok(with_suffix(base_path(path)?, ".dll"))
}

/// Path of the .NET Core COM host for `path`.
///
/// # Errors
/// See [`base_path`].
pub fn comhost_path(path: &Path) -> Result<PathBuf> {
    Ok(with_suffix(base_path(path)?, ".comhost.dll"))
}

fn with_suffix(base: PathBuf, suffix: &str) -> PathBuf {
    let mut path = OsString::from(base);
    path.push(suffix);
    PathBuf::from(path)
}
