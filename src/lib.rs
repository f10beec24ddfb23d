// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # comscope
//!
//! Derives COM class registration data from the metadata of managed .NET libraries, without
//! loading or executing them. Built in pure Rust, `comscope` decodes the ECMA-335 custom
//! attributes that declare a class' CLSID, ProgID, server type and threading model, applies
//! the activation and visibility rules of COM interop, and produces one registration
//! descriptor per class, ready to be written to a registration store.
//!
//! ## Features
//!
//! - **📦 Attribute decoding** - Full ECMA-335 custom attribute blob support, including enums,
//!   arrays, boxed values and named arguments
//! - **🔍 Extensible attribute set** - A registry of supported attribute types, seeded with
//!   the registration attributes and open for more
//! - **⚡ Parallel reads** - Inspect many libraries at once with [`LibraryReader::read_many`]
//! - **🔧 Cross-platform** - Inspects Windows libraries on any Rust-supported platform
//! - **🧩 Pluggable metadata access** - Bring your own metadata-table reader through
//!   [`metadata::access::ModuleMetadata`]
//!
//! ## Quick Start
//!
//! ### Using the Prelude
//!
//! ```rust,no_run
//! use comscope::prelude::*;
//!
//! let reader = LibraryReader::builder(CilSource)
//!     .config(ReaderConfig::windows())
//!     .build();
//!
//! let metadata = reader.read("Widgets.comhost.dll")?;
//! for descriptor in &metadata.descriptors {
//!     println!("{descriptor}");
//! }
//! # Ok::<(), comscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `comscope` is organized into several key modules:
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`file`] - PE image classification and low-level binary IO
//! - [`metadata`] - Custom attributes, type definitions and assembly identities
//! - [`registration`] - Eligibility, visibility and registration descriptors
//! - [`library`] - The read pipeline tying everything together
//! - [`Error`] and [`Result`] - Comprehensive error handling
//!
//! ### Read Pipeline
//!
//! For one library, [`LibraryReader::read`]:
//!
//! 1. maps `X.comhost.dll` to `X.dll` and classifies the image
//! 2. decodes the assembly attributes and determines the target runtime
//! 3. filters the type definitions by the COM activation requirements
//! 4. decodes the attributes of each remaining type
//! 5. synthesizes a descriptor for every visible type with a `GuidAttribute`
//!
//! Reading the metadata tables themselves is the job of a [`metadata::access::MetadataSource`].
//! [`metadata::cil::CilSource`] reads them from managed PE images through `dotscope`, while
//! [`SyntheticSource`] serves modules built in memory, which is what most of the test suite
//! uses.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`] with detailed [`Error`] information. Types that are
//! not registrable are never errors, they are skipped and logged through the `log` facade.
//!
//! ### Testing
//!
//! ```bash
//! cargo test
//! cargo bench
//! ```

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// This module provides a curated selection of the most frequently used types
/// from across the comscope library, allowing for convenient glob imports.
///
/// # Example
///
/// ```rust,no_run
/// use comscope::prelude::*;
///
/// let reader = LibraryReader::new(SyntheticSource::new());
/// let metadata = reader.read("Widgets.dll")?;
/// println!("{} component(s)", metadata.descriptors.len());
/// # Ok::<(), comscope::Error>(())
/// ```
pub mod prelude;

/// PE image classification and low-level binary IO
///
/// # Key Types
///
/// - [`file::File`] - A parsed PE image, memory-mapped or in memory
/// - [`file::ImageKind`] - Managed, native or unknown
/// - [`file::parser::Parser`] - Bounds-checked cursor over attribute blobs
pub mod file;

/// Custom attributes, type definitions and assembly identities based on ECMA-335
///
/// # Key Components
///
/// - [`metadata::customattributes`] - Decoding and encoding of custom attribute blobs
/// - [`metadata::access`] - The views of a module the reader needs
/// - [`metadata::cil`] - Metadata tables of managed PE images
/// - [`metadata::synthetic`] - In-memory modules
/// - [`metadata::typedef`] - Type and method definitions with their flags
/// - [`metadata::identity`] - Assembly identities and strong names
/// - [`metadata::token`] - Metadata tokens for cross-references
pub mod metadata;

/// COM registration rules and descriptors
///
/// See [`registration::is_com_eligible`], [`registration::DescriptorSynthesizer`] and
/// [`registration::RegistrationDescriptor`].
pub mod registration;

/// The library read pipeline
///
/// See [`library::LibraryReader`] and [`library::ReaderConfig`].
pub mod library;

/// `comscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
/// This is used consistently throughout the crate for all fallible operations.
///
/// # Examples
///
/// ```rust,no_run
/// use comscope::{LibraryMetadata, LibraryReader, Result, SyntheticSource};
///
/// fn inspect(path: &str) -> Result<LibraryMetadata> {
///     LibraryReader::new(SyntheticSource::new()).read(path)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `comscope` Error type
///
/// The main error type for all operations in this crate. Provides detailed error information
/// for caller input, malformed metadata and missing environment pieces.
///
/// # Examples
///
/// ```rust,no_run
/// use comscope::{Error, LibraryReader, SyntheticSource};
///
/// match LibraryReader::new(SyntheticSource::new()).read("Widgets.dll") {
///     Ok(metadata) => println!("Read {} component(s)", metadata.descriptors.len()),
///     Err(Error::HostingShimNotFound { shim_path, .. }) => {
///         println!("Install the .NET Framework first: {}", shim_path.display())
///     }
///     Err(Error::Malformed { message, .. }) => println!("Malformed: {}", message),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
pub use error::Error;

/// Main entry point for reading component libraries.
///
/// See [`library::LibraryReader`] for the read pipeline.
///
/// # Example
///
/// ```rust,no_run
/// use comscope::{LibraryReader, ReaderConfig, SyntheticSource};
///
/// let reader = LibraryReader::builder(SyntheticSource::new())
///     .config(ReaderConfig::with_system_directory(r"C:\Windows\System32"))
///     .build();
/// let metadata = reader.read("Widgets.dll")?;
/// println!("{metadata}");
/// # Ok::<(), comscope::Error>(())
/// ```
pub use library::{LibraryMetadata, LibraryReader, LibraryReaderBuilder, ReaderConfig};

/// Metadata read from managed PE images.
pub use metadata::cil::{CilModule, CilSource};

/// In-memory metadata, for callers without a metadata-table reader and for tests.
pub use metadata::synthetic::{SyntheticModule, SyntheticModuleBuilder, SyntheticSource};

/// Registration descriptors produced by the reader.
pub use registration::RegistrationDescriptor;

/// Provides access to low-level file and memory parsing utilities.
///
/// The [`Parser`] type is used for decoding custom attribute blobs, [`File`] for classifying
/// PE images.
///
/// # Example
///
/// ```rust
/// use comscope::Parser;
///
/// let blob = [0x01, 0x00, 0x03, b'a', b'b', b'c'];
/// let mut parser = Parser::new(&blob);
/// assert_eq!(parser.read_le::<u16>()?, 0x0001);
/// assert_eq!(parser.read_compressed_string_utf8()?, "abc");
/// # Ok::<(), comscope::Error>(())
/// ```
pub use file::{parser::Parser, File, ImageKind};
