//! Type and method definitions as seen by the registration pipeline.
//!
//! These are transient, owned views over the TypeDef and MethodDef tables (ECMA-335 II.22.37
//! and II.22.26). They carry exactly what the eligibility rules and the attribute decoder need
//! and are produced by a [`crate::metadata::ModuleMetadata`] implementation.

use std::fmt;

use bitflags::bitflags;

use crate::metadata::{customattributes::AttributeRecord, token::Token};

/// Name of the instance constructor of every type
pub const CONSTRUCTOR_NAME: &str = ".ctor";

/// Name of the pseudo-type holding module-level members
pub const MODULE_TYPE_NAME: &str = "<Module>";

/// Type attribute constants, as stored in the TypeDef `Flags` column.
#[allow(non_snake_case)]
pub mod TypeAttributes {
    /// Mask for extracting type visibility information.
    pub const VISIBILITY_MASK: u32 = 0x0000_0007;
    /// Type has no public scope (internal to assembly).
    pub const NOT_PUBLIC: u32 = 0x0000_0000;
    /// Type has public scope (visible outside assembly).
    pub const PUBLIC: u32 = 0x0000_0001;
    /// Nested type with public visibility.
    pub const NESTED_PUBLIC: u32 = 0x0000_0002;
    /// Nested type with private visibility.
    pub const NESTED_PRIVATE: u32 = 0x0000_0003;
    /// Type is an interface.
    pub const INTERFACE: u32 = 0x0000_0020;
    /// Type is abstract and cannot be instantiated.
    pub const ABSTRACT: u32 = 0x0000_0080;
    /// Type cannot be derived from.
    pub const SEALED: u32 = 0x0000_0100;
    /// Type was imported from a COM type library.
    pub const IMPORT: u32 = 0x0000_1000;
    /// Type is serializable.
    pub const SERIALIZABLE: u32 = 0x0000_2000;
}

const METHOD_ACCESS_MASK: u32 = 0x0007;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Method access flags
    pub struct MethodAccessFlags: u32 {
        /// Member not referenceable
        const COMPILER_CONTROLLED = 0x0000;
        /// Accessible only by the parent type
        const PRIVATE = 0x0001;
        /// Accessible by sub-types only in this Assembly
        const FAM_AND_ASSEM = 0x0002;
        /// Accessibly by anyone in the Assembly
        const ASSEM = 0x0003;
        /// Accessible only by type and sub-types
        const FAMILY = 0x0004;
        /// Accessibly by sub-types anywhere, plus anyone in assembly
        const FAM_OR_ASSEM = 0x0005;
        /// Accessibly by anyone who has visibility to this scope
        const PUBLIC = 0x0006;
    }
}

impl MethodAccessFlags {
    /// Extract access flags from raw method attributes
    #[must_use]
    pub fn from_method_flags(flags: u32) -> Self {
        let access = flags & METHOD_ACCESS_MASK;
        Self::from_bits_truncate(access)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Method modifiers and properties
    pub struct MethodModifiers: u32 {
        /// Defined on type, else per instance
        const STATIC = 0x0010;
        /// Method cannot be overridden
        const FINAL = 0x0020;
        /// Method is virtual
        const VIRTUAL = 0x0040;
        /// Method is abstract
        const ABSTRACT = 0x0400;
        /// Method is special
        const SPECIAL_NAME = 0x0800;
        /// Runtime should check name encoding
        const RTSPECIAL_NAME = 0x1000;
    }
}

impl MethodModifiers {
    /// Extract method modifiers from raw method attributes
    #[must_use]
    pub fn from_method_flags(flags: u32) -> Self {
        Self::from_bits_truncate(flags & !METHOD_ACCESS_MASK)
    }
}

/// Namespace and name of a type, as resolved from a TypeDef or TypeRef row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TypeName {
    /// Namespace, empty for the global namespace
    pub namespace: String,
    /// Simple type name
    pub name: String,
}

impl TypeName {
    /// Create a type name from its namespace and simple name.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Split a fully-qualified name at its last `.`.
    #[must_use]
    pub fn from_full_name(full_name: &str) -> Self {
        match full_name.rsplit_once('.') {
            Some((namespace, name)) => Self::new(namespace, name),
            None => Self::new("", full_name),
        }
    }

    /// Returns `namespace.name`, or just `name` for the global namespace.
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.namespace.is_empty() {
            write!(f, "{}.", self.namespace)?;
        }
        f.write_str(&self.name)
    }
}

/// A row of the MethodDef table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDefinition {
    /// MethodDef token
    pub token: Token,
    /// Method name
    pub name: String,
    /// Raw `MethodAttributes`
    pub flags: u32,
    /// Number of declared parameters, excluding the return value
    pub param_count: u32,
}

impl MethodDefinition {
    /// Create a method definition.
    #[must_use]
    pub fn new(token: Token, name: impl Into<String>, flags: u32, param_count: u32) -> Self {
        Self {
            token,
            name: name.into(),
            flags,
            param_count,
        }
    }

    /// A public, parameterless instance constructor as emitted by C# for `public Foo() {}`.
    #[must_use]
    pub fn default_constructor(token: Token) -> Self {
        Self::new(
            token,
            CONSTRUCTOR_NAME,
            MethodAccessFlags::PUBLIC.bits()
                | MethodModifiers::SPECIAL_NAME.bits()
                | MethodModifiers::RTSPECIAL_NAME.bits(),
            0,
        )
    }

    /// Access flags of this method
    #[must_use]
    pub fn access(&self) -> MethodAccessFlags {
        MethodAccessFlags::from_method_flags(self.flags)
    }

    /// Modifiers of this method
    #[must_use]
    pub fn modifiers(&self) -> MethodModifiers {
        MethodModifiers::from_method_flags(self.flags)
    }

    /// Returns `true` if this is an instance or static constructor.
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }
}

/// A row of the TypeDef table together with its methods and custom attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    /// TypeDef token
    pub token: Token,
    /// Namespace, empty for the global namespace
    pub namespace: String,
    /// Simple type name
    pub name: String,
    /// Raw `TypeAttributes`
    pub flags: u32,
    /// Number of generic parameters declared by this type
    pub generic_param_count: u32,
    /// Methods declared by this type
    pub methods: Vec<MethodDefinition>,
    /// Custom attributes owned by this type
    pub custom_attributes: Vec<AttributeRecord>,
}

impl TypeDefinition {
    /// Create a type definition without methods or attributes.
    pub fn new(
        token: Token,
        namespace: impl Into<String>,
        name: impl Into<String>,
        flags: u32,
    ) -> Self {
        Self {
            token,
            namespace: namespace.into(),
            name: name.into(),
            flags,
            generic_param_count: 0,
            methods: Vec::new(),
            custom_attributes: Vec::new(),
        }
    }

    /// Returns the namespace-qualified name of this type.
    #[must_use]
    pub fn type_name(&self) -> TypeName {
        TypeName::new(self.namespace.clone(), self.name.clone())
    }

    /// Returns `namespace.name`.
    #[must_use]
    pub fn full_name(&self) -> String {
        self.type_name().full_name()
    }

    /// Returns the masked visibility, one of the `TypeAttributes` visibility constants.
    #[must_use]
    pub fn visibility(&self) -> u32 {
        self.flags & TypeAttributes::VISIBILITY_MASK
    }

    /// Returns `true` if the type is abstract.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.flags & TypeAttributes::ABSTRACT != 0
    }

    /// Returns `true` for the `<Module>` pseudo-type of the global namespace.
    #[must_use]
    pub fn is_module_type(&self) -> bool {
        self.namespace.is_empty() && self.name == MODULE_TYPE_NAME
    }

    /// Iterates the constructors declared by this type.
    pub fn constructors(&self) -> impl Iterator<Item = &MethodDefinition> {
        self.methods.iter().filter(|method| method.is_constructor())
    }
}
