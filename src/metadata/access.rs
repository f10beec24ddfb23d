//! Access to the metadata of a managed module.
//!
//! Reading the ECMA-335 metadata tables is left to the caller. The reader only needs the
//! handful of views defined by [`ModuleMetadata`], obtained through a [`MetadataSource`].
//! [`crate::metadata::synthetic`] provides in-memory implementations of both.

use std::path::Path;

use crate::{
    file::{classify_image, ImageKind},
    metadata::{
        customattributes::AttributeRecord,
        identity::AssemblyIdentity,
        token::Token,
        typedef::{TypeDefinition, TypeName},
    },
    Result,
};

/// Views over the metadata tables of one managed module.
pub trait ModuleMetadata {
    /// Identity from the `Assembly` table.
    ///
    /// # Errors
    /// Returns an error if the module has no valid assembly row.
    fn identity(&self) -> Result<AssemblyIdentity>;

    /// Metadata version string from the metadata root, e.g. `v4.0.30319`.
    ///
    /// # Errors
    /// Returns an error if the metadata root can not be read.
    fn runtime_version(&self) -> Result<String>;

    /// `CustomAttribute` rows owned by the assembly.
    ///
    /// # Errors
    /// Returns an error if the table can not be read.
    fn assembly_attributes(&self) -> Result<Vec<AttributeRecord>>;

    /// Rows of the `TypeDef` table in definition order, with their methods and attributes.
    ///
    /// # Errors
    /// Returns an error if the tables can not be read.
    fn type_definitions(&self) -> Result<Vec<TypeDefinition>>;

    /// Declaring type of an attribute constructor, given as `MethodDef` or `MemberRef`.
    ///
    /// # Errors
    /// Returns an error if the token does not resolve to a method.
    fn constructor_type(&self, constructor: Token) -> Result<TypeName>;
}

/// Opens module metadata by path.
pub trait MetadataSource: Send + Sync {
    /// Classifies the image at `path`.
    ///
    /// The default parses the PE headers and checks for a CLR runtime header.
    ///
    /// # Errors
    /// Returns an error if the file can not be read or is not a PE image.
    fn classify(&self, path: &Path) -> Result<ImageKind> {
        classify_image(path)
    }

    /// Opens the metadata of the managed image at `path`.
    ///
    /// # Errors
    /// Returns an error if the metadata can not be read.
    fn open(&self, path: &Path) -> Result<Box<dyn ModuleMetadata + '_>>;
}
