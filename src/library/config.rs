//! Configuration of the library reader
//!
//! The reader needs to know where the classic runtime shim lives, and which values to
//! assume for classes that do not declare a ProgID, server type or threading model.

use std::path::PathBuf;

use crate::registration::{ServerType, ThreadingModel};

/// Name of the .NET Framework hosting shim
pub const FRAMEWORK_SHIM_NAME: &str = "mscoree.dll";

/// System directory used by [`ReaderConfig::windows`] when `SystemRoot` is not set
pub const DEFAULT_SYSTEM_DIRECTORY: &str = r"C:\Windows\System32";

/// Configuration of a [`crate::LibraryReader`]
///
/// The default configuration knows no system directory, so modules targeting the .NET
/// Framework fail with [`crate::Error::HostingShimNotFound`] as soon as they contain a
/// registrable class. All fallbacks default to the unset values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Directory holding the hosting shim, `None` if unknown
    pub system_directory: Option<PathBuf>,

    /// File name of the .NET Framework hosting shim (default: `mscoree.dll`)
    pub framework_shim_name: String,

    /// ProgID used when a class does not declare one (default: empty)
    pub fallback_prog_id: String,

    /// Server type used when a class does not declare one (default: `Undefined`)
    pub fallback_server_type: ServerType,

    /// Threading model used when a class does not declare one (default: `Undefined`)
    pub fallback_threading_model: ThreadingModel,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            system_directory: None,
            framework_shim_name: FRAMEWORK_SHIM_NAME.to_string(),
            fallback_prog_id: String::new(),
            fallback_server_type: ServerType::Undefined,
            fallback_threading_model: ThreadingModel::Undefined,
        }
    }
}

impl ReaderConfig {
    /// Creates a configuration for the Windows host this process runs on
    ///
    /// The system directory is `%SystemRoot%\System32`, or `C:\Windows\System32` if the
    /// variable is not set.
    #[must_use]
    pub fn windows() -> Self {
        let system_directory = std::env::var_os("SystemRoot").map_or_else(
            || PathBuf::from(DEFAULT_SYSTEM_DIRECTORY),
            |root| PathBuf::from(root).join("System32"),
        );

        Self::with_system_directory(system_directory)
    }

    /// Creates a default configuration that looks for the shim in `directory`
    #[must_use]
    pub fn with_system_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            system_directory: Some(directory.into()),
            ..Self::default()
        }
    }

    /// Sets the system directory
    #[must_use]
    pub fn system_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.system_directory = Some(directory.into());
        self
    }

    /// Sets the file name of the hosting shim
    #[must_use]
    pub fn framework_shim_name(mut self, name: impl Into<String>) -> Self {
        self.framework_shim_name = name.into();
        self
    }

    /// Sets the fallback ProgID
    #[must_use]
    pub fn fallback_prog_id(mut self, prog_id: impl Into<String>) -> Self {
        self.fallback_prog_id = prog_id.into();
        self
    }

    /// Sets the fallback server type
    #[must_use]
    pub fn fallback_server_type(mut self, server_type: ServerType) -> Self {
        self.fallback_server_type = server_type;
        self
    }

    /// Sets the fallback threading model
    #[must_use]
    pub fn fallback_threading_model(mut self, threading_model: ThreadingModel) -> Self {
        self.fallback_threading_model = threading_model;
        self
    }

    /// Path the hosting shim is expected at, `None` without a system directory
    #[must_use]
    pub fn shim_path(&self) -> Option<PathBuf> {
        self.system_directory
            .as_deref()
            .map(|directory| directory.join(&self.framework_shim_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn default_has_no_shim() {
        let config = ReaderConfig::default();

        assert!(config.shim_path().is_none());
        assert_eq!(config.framework_shim_name, "mscoree.dll");
        assert!(config.fallback_prog_id.is_empty());
        assert_eq!(config.fallback_server_type, ServerType::Undefined);
        assert_eq!(config.fallback_threading_model, ThreadingModel::Undefined);
    }

    #[test]
    fn shim_path_joins_directory() {
        let config =
            ReaderConfig::with_system_directory("/opt/system").framework_shim_name("shim.dll");

        assert_eq!(config.shim_path().unwrap(), Path::new("/opt/system/shim.dll"));
    }

    #[test]
    fn setters_chain() {
        let config = ReaderConfig::default()
            .system_directory("/sys")
            .fallback_prog_id("Widgets.Default")
            .fallback_server_type(ServerType::InprocServer32)
            .fallback_threading_model(ThreadingModel::Both);

        assert_eq!(config.system_directory.as_deref(), Some(Path::new("/sys")));
        assert_eq!(config.fallback_prog_id, "Widgets.Default");
        assert_eq!(config.fallback_server_type, ServerType::InprocServer32);
        assert_eq!(config.fallback_threading_model, ThreadingModel::Both);
    }

    #[test]
    fn windows_ends_in_system32() {
        let config = ReaderConfig::windows();
        let directory = config.system_directory.unwrap();

        assert!(directory.to_string_lossy().ends_with("System32"));
    }
}
