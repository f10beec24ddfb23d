//! Reading component libraries.
//!
//! A component library is a managed `.dll` whose public classes are registered as COM
//! classes. [`LibraryReader`] inspects one library per call and returns a
//! [`LibraryMetadata`] with one [`crate::registration::RegistrationDescriptor`] per
//! registrable class.
//!
//! # Key Components
//!
//! - [`LibraryReader`] / [`LibraryReaderBuilder`] - The read pipeline and its setup
//! - [`ReaderConfig`] - Shim location and fallback registration values
//! - [`TargetRuntime`] / [`FrameworkName`] - Classification of the targeted runtime
//! - [`LibraryMetadata`] - The result of a read

pub mod config;
mod metadata;
mod reader;
pub mod runtime;

pub use config::ReaderConfig;
pub use metadata::{AssemblyMetadata, LibraryMetadata};
pub use reader::{LibraryReader, LibraryReaderBuilder};
pub use runtime::{FrameworkName, FrameworkVersion, TargetRuntime};
