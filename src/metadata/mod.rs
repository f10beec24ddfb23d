//! Metadata representation for .NET assemblies.
//!
//! This module contains the parts of the ECMA-335 metadata model that COM registration
//! depends on: custom attributes, type and method definitions, and assembly identities.
//! Reading the metadata tables is delegated to a [`MetadataSource`], which hands out
//! [`ModuleMetadata`] views. [`cil::CilSource`] reads them from managed PE images.
//!
//! # Key Components
//!
//! - [`customattributes`] - Custom attribute blob decoding and encoding
//! - [`access`] - The [`ModuleMetadata`] and [`MetadataSource`] traits
//! - [`cil`] - Both traits over the metadata tables of a managed PE image
//! - [`synthetic`] - In-memory implementations of both traits
//! - [`typedef`] - Type and method definitions with their attribute flags
//! - [`identity`] - Assembly identity, versions and strong names
//! - [`token`] - Metadata table row references used throughout .NET
//!
//! # Examples
//!
//! ```rust
//! use comscope::metadata::{
//!     synthetic::{SyntheticModuleBuilder, SyntheticType},
//!     ModuleMetadata,
//! };
//!
//! let module = SyntheticModuleBuilder::new("Widgets")
//!     .add_type(SyntheticType::class("Widgets", "Spinner"))
//!     .build()?;
//!
//! println!("Assembly: {}", module.identity()?);
//! for definition in module.type_definitions()? {
//!     println!("{} {}", definition.token, definition.full_name());
//! }
//! # Ok::<(), comscope::Error>(())
//! ```

/// Views of a module needed by the read pipeline
pub mod access;
/// Module metadata read from managed PE images
pub mod cil;
/// Implementation of custom attribute parsing and representation
pub mod customattributes;
/// Implementation of assembly identities and strong names
pub mod identity;
/// In-memory module metadata
pub mod synthetic;
/// Commonly used metadata token type
pub mod token;
/// Type and method definitions
pub mod typedef;

pub use access::{MetadataSource, ModuleMetadata};
