//! # comscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the comscope library. Import this module to get quick access to the essential
//! types for reading component libraries.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all comscope operations
pub use crate::Error;

/// The result type used throughout comscope
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The read pipeline and its configuration
pub use crate::library::{
    AssemblyMetadata, FrameworkName, LibraryMetadata, LibraryReader, LibraryReaderBuilder,
    ReaderConfig, TargetRuntime,
};

/// Low-level file parsing utilities
pub use crate::{File, ImageKind, Parser};

// ================================================================================================
// Metadata Access
// ================================================================================================

/// Traits implemented by metadata-table readers
pub use crate::metadata::{MetadataSource, ModuleMetadata};

/// Metadata read from managed PE images
pub use crate::metadata::cil::{CilModule, CilSource};

/// In-memory modules
pub use crate::metadata::synthetic::{
    SyntheticModule, SyntheticModuleBuilder, SyntheticSource, SyntheticType,
};

/// Metadata token type for referencing table entries
pub use crate::metadata::token::Token;

/// Type and method definitions
pub use crate::metadata::typedef::{MethodDefinition, TypeDefinition, TypeName};

/// Assembly identities
pub use crate::metadata::identity::{AssemblyIdentity, AssemblyVersion, StrongName};

// ================================================================================================
// Custom Attributes
// ================================================================================================

/// Attribute registry, decoding and encoding
pub use crate::metadata::customattributes::{
    AttributeCollection, AttributeDecoder, AttributeDescriptor, AttributeEncoder,
    AttributeRecord, AttributeRegistry, AttributeValue, DecodedAttribute, EnumDescriptor,
    EnumValue, KnownAttribute, MemberKind, NamedValue, TypeResolver, ValueShape,
};

// ================================================================================================
// Registration
// ================================================================================================

/// Registration descriptors and their building blocks
pub use crate::registration::{
    is_com_eligible, Clsid, NativeClass, NetCoreClass, NetFrameworkClass,
    RegistrationDescriptor, ServerType, ThreadingModel, TypeInformation,
};
