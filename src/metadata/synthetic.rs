//! In-memory module metadata.
//!
//! [`SyntheticModule`] implements [`ModuleMetadata`] over tables built by hand, with
//! attribute blobs produced by the [`crate::metadata::customattributes::AttributeEncoder`].
//! [`SyntheticSource`] serves such modules by path, so the whole reader pipeline can run
//! without a metadata-table reader.
//!
//! Tokens follow the physical layout: `<Module>` is always TypeDef row 1, attribute
//! constructors are `MemberRef` rows, one per attribute type.
//!
//! # Examples
//!
//! ```rust
//! use comscope::metadata::synthetic::{SyntheticModuleBuilder, SyntheticType};
//! use comscope::metadata::access::ModuleMetadata;
//!
//! let module = SyntheticModuleBuilder::new("Widgets")
//!     .target_framework(".NETCoreApp,Version=v3.1")
//!     .add_type(
//!         SyntheticType::class("Widgets", "Spinner")
//!             .guid("5b6f0a2e-2d7c-4f7e-9a59-3c8e1a0b6d11")
//!             .com_visible(true),
//!     )
//!     .build()?;
//!
//! let types = module.type_definitions()?;
//! assert_eq!(types.len(), 2);
//! assert_eq!(types[1].full_name(), "Widgets.Spinner");
//! # Ok::<(), comscope::Error>(())
//! ```

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    file::ImageKind,
    metadata::{
        access::{MetadataSource, ModuleMetadata},
        customattributes::{
            encode_custom_attribute, encoder::infer_shape, known::names, AttributeDescriptor,
            AttributeRecord, AttributeRegistry, AttributeValue, EnumValue, NamedValue,
            TypeResolver,
        },
        identity::{AssemblyIdentity, AssemblyVersion},
        token::{TableId, Token},
        typedef::{
            MethodAccessFlags, MethodDefinition, TypeAttributes, TypeDefinition, TypeName,
            CONSTRUCTOR_NAME, MODULE_TYPE_NAME,
        },
    },
    registration::{ServerType, ThreadingModel},
    Error::NotImplementedForImageKind,
    Result,
};

/// Runtime metadata version written by the .NET Framework 4 and later compilers
pub const DEFAULT_RUNTIME_VERSION: &str = "v4.0.30319";

/// Value of an attribute before encoding.
#[derive(Debug, Clone)]
enum PendingValue {
    Values {
        fixed: Vec<AttributeValue>,
        named: Vec<NamedValue>,
    },
    Raw(Vec<u8>),
}

#[derive(Debug, Clone)]
struct PendingAttribute {
    type_name: String,
    value: PendingValue,
}

impl PendingAttribute {
    fn values(type_name: &str, fixed: Vec<AttributeValue>, named: Vec<NamedValue>) -> Self {
        Self {
            type_name: type_name.to_string(),
            value: PendingValue::Values { fixed, named },
        }
    }

    fn raw(type_name: &str, blob: Vec<u8>) -> Self {
        Self {
            type_name: type_name.to_string(),
            value: PendingValue::Raw(blob),
        }
    }
}

fn enum_argument(type_name: &str, value: i64, constant: &str) -> AttributeValue {
    AttributeValue::Enum(EnumValue {
        type_name: type_name.to_string(),
        value,
        constant: Some(constant.to_string()),
    })
}

#[derive(Debug, Clone)]
struct PendingMethod {
    name: String,
    flags: u32,
    param_count: u32,
}

/// A type definition under construction.
#[derive(Debug, Clone)]
pub struct SyntheticType {
    namespace: String,
    name: String,
    flags: u32,
    generic_param_count: u32,
    methods: Vec<PendingMethod>,
    attributes: Vec<PendingAttribute>,
}

impl SyntheticType {
    /// A public, non-generic class with a public parameterless constructor.
    pub fn class(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::bare(namespace, name, TypeAttributes::PUBLIC).constructor(
            MethodAccessFlags::PUBLIC.bits(),
            0,
        )
    }

    /// A type with the given `TypeAttributes` and no methods.
    pub fn bare(namespace: impl Into<String>, name: impl Into<String>, flags: u32) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            flags,
            generic_param_count: 0,
            methods: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Replaces the `TypeAttributes`.
    #[must_use]
    pub fn flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the number of generic parameters.
    #[must_use]
    pub fn generic_params(mut self, count: u32) -> Self {
        self.generic_param_count = count;
        self
    }

    /// Removes all methods.
    #[must_use]
    pub fn without_methods(mut self) -> Self {
        self.methods.clear();
        self
    }

    /// Adds a `.ctor` with the given `MethodAttributes` and parameter count.
    #[must_use]
    pub fn constructor(self, flags: u32, param_count: u32) -> Self {
        self.method(CONSTRUCTOR_NAME, flags, param_count)
    }

    /// Adds a method.
    #[must_use]
    pub fn method(mut self, name: impl Into<String>, flags: u32, param_count: u32) -> Self {
        self.methods.push(PendingMethod {
            name: name.into(),
            flags,
            param_count,
        });
        self
    }

    /// Applies an attribute with constructor arguments.
    #[must_use]
    pub fn attribute(self, type_name: &str, fixed: Vec<AttributeValue>) -> Self {
        self.attribute_with(type_name, fixed, Vec::new())
    }

    /// Applies an attribute with constructor and named arguments.
    #[must_use]
    pub fn attribute_with(
        mut self,
        type_name: &str,
        fixed: Vec<AttributeValue>,
        named: Vec<NamedValue>,
    ) -> Self {
        self.attributes
            .push(PendingAttribute::values(type_name, fixed, named));
        self
    }

    /// Applies an attribute with a prebuilt blob.
    #[must_use]
    pub fn attribute_raw(mut self, type_name: &str, blob: Vec<u8>) -> Self {
        self.attributes.push(PendingAttribute::raw(type_name, blob));
        self
    }

    /// Applies `GuidAttribute`.
    #[must_use]
    pub fn guid(self, guid: &str) -> Self {
        self.attribute(names::GUID, vec![AttributeValue::String(guid.to_string())])
    }

    /// Applies `ComVisibleAttribute`.
    #[must_use]
    pub fn com_visible(self, visible: bool) -> Self {
        self.attribute(names::COM_VISIBLE, vec![AttributeValue::Bool(visible)])
    }

    /// Applies `ProgIdAttribute`.
    #[must_use]
    pub fn prog_id(self, prog_id: &str) -> Self {
        self.attribute(
            names::PROG_ID,
            vec![AttributeValue::String(prog_id.to_string())],
        )
    }

    /// Applies `ComponentServerTypeAttribute`.
    #[must_use]
    pub fn server_type(self, server_type: ServerType) -> Self {
        self.attribute(
            names::COMPONENT_SERVER_TYPE,
            vec![enum_argument(
                names::SERVER_TYPE_ENUM,
                server_type.value(),
                <&'static str>::from(server_type),
            )],
        )
    }

    /// Applies `ComponentThreadingModelAttribute`.
    #[must_use]
    pub fn threading_model(self, threading_model: ThreadingModel) -> Self {
        self.attribute(
            names::COMPONENT_THREADING_MODEL,
            vec![enum_argument(
                names::THREADING_MODEL_ENUM,
                threading_model.value(),
                <&'static str>::from(threading_model),
            )],
        )
    }
}

/// Builds a [`SyntheticModule`].
#[derive(Debug, Clone)]
pub struct SyntheticModuleBuilder {
    identity: AssemblyIdentity,
    runtime_version: String,
    registry: AttributeRegistry,
    resolver: TypeResolver,
    assembly_attributes: Vec<PendingAttribute>,
    types: Vec<SyntheticType>,
}

impl SyntheticModuleBuilder {
    /// Starts a module for an assembly named `name`, version 1.0.0.0, without strong name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            identity: AssemblyIdentity::new(name, AssemblyVersion::new(1, 0, 0, 0)),
            runtime_version: DEFAULT_RUNTIME_VERSION.to_string(),
            registry: AttributeRegistry::new(),
            resolver: TypeResolver::new(),
            assembly_attributes: Vec::new(),
            types: Vec::new(),
        }
    }

    /// Replaces the assembly identity.
    #[must_use]
    pub fn identity(mut self, identity: AssemblyIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Replaces the runtime metadata version.
    #[must_use]
    pub fn runtime_version(mut self, version: impl Into<String>) -> Self {
        self.runtime_version = version.into();
        self
    }

    /// Replaces the registry that supplies attribute shapes for encoding.
    #[must_use]
    pub fn registry(mut self, registry: AttributeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replaces the resolver used to encode enum values.
    #[must_use]
    pub fn resolver(mut self, resolver: TypeResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Applies an assembly attribute with constructor arguments.
    #[must_use]
    pub fn assembly_attribute(self, type_name: &str, fixed: Vec<AttributeValue>) -> Self {
        self.assembly_attribute_with(type_name, fixed, Vec::new())
    }

    /// Applies an assembly attribute with constructor and named arguments.
    #[must_use]
    pub fn assembly_attribute_with(
        mut self,
        type_name: &str,
        fixed: Vec<AttributeValue>,
        named: Vec<NamedValue>,
    ) -> Self {
        self.assembly_attributes
            .push(PendingAttribute::values(type_name, fixed, named));
        self
    }

    /// Applies an assembly attribute with a prebuilt blob.
    #[must_use]
    pub fn assembly_attribute_raw(mut self, type_name: &str, blob: Vec<u8>) -> Self {
        self.assembly_attributes
            .push(PendingAttribute::raw(type_name, blob));
        self
    }

    /// Applies the assembly `ComVisibleAttribute`.
    #[must_use]
    pub fn com_visible(self, visible: bool) -> Self {
        self.assembly_attribute(names::COM_VISIBLE, vec![AttributeValue::Bool(visible)])
    }

    /// Applies `TargetFrameworkAttribute` without display name.
    #[must_use]
    pub fn target_framework(self, framework_name: &str) -> Self {
        self.assembly_attribute(
            names::TARGET_FRAMEWORK,
            vec![AttributeValue::String(framework_name.to_string())],
        )
    }

    /// Appends a type definition.
    #[must_use]
    pub fn add_type(mut self, definition: SyntheticType) -> Self {
        self.types.push(definition);
        self
    }

    /// Assigns tokens and encodes all attributes.
    ///
    /// # Errors
    /// Returns [`crate::Error::ValueShapeMismatch`] or [`crate::Error::UnknownEnumType`] if an
    /// attribute can not be encoded.
    pub fn build(self) -> Result<SyntheticModule> {
        let mut tables = TableBuilder::default();

        let mut assembly_attributes = Vec::with_capacity(self.assembly_attributes.len());
        for pending in &self.assembly_attributes {
            let blob = self.encode(pending)?;
            assembly_attributes.push(tables.attribute(Token::ASSEMBLY, &pending.type_name, blob)?);
        }

        let mut types = Vec::with_capacity(self.types.len() + 1);
        types.push(TypeDefinition::new(
            Token::from_parts(TableId::TYPE_DEF, 1),
            "",
            MODULE_TYPE_NAME,
            TypeAttributes::NOT_PUBLIC,
        ));

        for (row, synthetic) in (2u32..).zip(&self.types) {
            let token = Token::from_parts(TableId::TYPE_DEF, row);
            let mut definition = TypeDefinition::new(
                token,
                synthetic.namespace.clone(),
                synthetic.name.clone(),
                synthetic.flags,
            );
            definition.generic_param_count = synthetic.generic_param_count;

            for method in &synthetic.methods {
                definition.methods.push(MethodDefinition::new(
                    tables.method_token(),
                    method.name.clone(),
                    method.flags,
                    method.param_count,
                ));
            }

            for pending in &synthetic.attributes {
                let blob = self.encode(pending)?;
                definition
                    .custom_attributes
                    .push(tables.attribute(token, &pending.type_name, blob)?);
            }

            types.push(definition);
        }

        Ok(SyntheticModule {
            identity: self.identity,
            runtime_version: self.runtime_version,
            assembly_attributes,
            types,
            constructors: tables.constructors,
        })
    }

    fn encode(&self, pending: &PendingAttribute) -> Result<Vec<u8>> {
        let (fixed, named) = match &pending.value {
            PendingValue::Raw(blob) => return Ok(blob.clone()),
            PendingValue::Values { fixed, named } => (fixed, named),
        };

        match self.registry.get(&pending.type_name) {
            Some(descriptor) => encode_custom_attribute(descriptor, fixed, named, &self.resolver),
            None => {
                // Unregistered attribute types take their parameter shapes from the values
                let mut descriptor = AttributeDescriptor::new(pending.type_name.clone());
                for value in fixed {
                    descriptor = descriptor.param(infer_shape(&self.resolver, value)?);
                }
                encode_custom_attribute(&descriptor, fixed, named, &self.resolver)
            }
        }
    }
}

/// Row counters while building a module.
#[derive(Default)]
struct TableBuilder {
    constructors: Vec<TypeName>,
    attribute_rows: u32,
    method_rows: u32,
}

impl TableBuilder {
    fn method_token(&mut self) -> Token {
        self.method_rows += 1;
        Token::from_parts(TableId::METHOD_DEF, self.method_rows)
    }

    fn constructor_token(&mut self, type_name: &str) -> Result<Token> {
        let type_name = TypeName::from_full_name(type_name);
        let index = match self.constructors.iter().position(|name| *name == type_name) {
            Some(index) => index,
            None => {
                self.constructors.push(type_name);
                self.constructors.len() - 1
            }
        };

        row_token(TableId::MEMBER_REF, index)
    }

    fn attribute(
        &mut self,
        owner: Token,
        type_name: &str,
        blob: Vec<u8>,
    ) -> Result<AttributeRecord> {
        self.attribute_rows += 1;
        Ok(AttributeRecord::new(
            Token::from_parts(TableId::CUSTOM_ATTRIBUTE, self.attribute_rows),
            owner,
            self.constructor_token(type_name)?,
            blob,
        ))
    }
}

/// Token for the 0-based `index` of a table, rejecting rows a token can not address.
fn row_token(table: u8, index: usize) -> Result<Token> {
    // Row numbers are 1-based
    let row = index
        .checked_add(1)
        .and_then(|row| u32::try_from(row).ok())
        .filter(|row| *row <= 0x00FF_FFFF)
        .ok_or_else(|| malformed_error!("Table 0x{:02x} has too many rows", table))?;

    Ok(Token::from_parts(table, row))
}

/// Module metadata held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticModule {
    identity: AssemblyIdentity,
    runtime_version: String,
    assembly_attributes: Vec<AttributeRecord>,
    types: Vec<TypeDefinition>,
    constructors: Vec<TypeName>,
}

impl ModuleMetadata for SyntheticModule {
    fn identity(&self) -> Result<AssemblyIdentity> {
        Ok(self.identity.clone())
    }

    fn runtime_version(&self) -> Result<String> {
        Ok(self.runtime_version.clone())
    }

    fn assembly_attributes(&self) -> Result<Vec<AttributeRecord>> {
        Ok(self.assembly_attributes.clone())
    }

    fn type_definitions(&self) -> Result<Vec<TypeDefinition>> {
        Ok(self.types.clone())
    }

    fn constructor_type(&self, constructor: Token) -> Result<TypeName> {
        if constructor.table() != TableId::MEMBER_REF {
            return Err(malformed_error!(
                "Attribute constructor {} is not a MemberRef",
                constructor
            ));
        }

        usize::try_from(constructor.row())
            .ok()
            .and_then(|row| row.checked_sub(1))
            .and_then(|index| self.constructors.get(index))
            .cloned()
            .ok_or_else(|| malformed_error!("Unknown attribute constructor {}", constructor))
    }
}

/// A [`MetadataSource`] serving synthetic modules by path.
///
/// Classification still looks at the path only: registered modules are managed, paths
/// marked with [`SyntheticSource::with_native`] are native and everything else is
/// unsupported.
#[derive(Debug, Clone, Default)]
pub struct SyntheticSource {
    modules: HashMap<PathBuf, Arc<SyntheticModule>>,
    native: Vec<PathBuf>,
}

impl SyntheticSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `module` for `path`.
    #[must_use]
    pub fn with_module(mut self, path: impl Into<PathBuf>, module: SyntheticModule) -> Self {
        self.modules.insert(path.into(), Arc::new(module));
        self
    }

    /// Classifies `path` as a native image.
    #[must_use]
    pub fn with_native(mut self, path: impl Into<PathBuf>) -> Self {
        self.native.push(path.into());
        self
    }
}

impl MetadataSource for SyntheticSource {
    fn classify(&self, path: &Path) -> Result<ImageKind> {
        if self.modules.contains_key(path) {
            Ok(ImageKind::Managed)
        } else if self.native.iter().any(|native| native == path) {
            Ok(ImageKind::Native)
        } else {
            Err(NotImplementedForImageKind {
                path: path.to_path_buf(),
            })
        }
    }

    fn open(&self, path: &Path) -> Result<Box<dyn ModuleMetadata + '_>> {
        match self.modules.get(path) {
            Some(module) => Ok(Box::new(Arc::clone(module))),
            None => Err(NotImplementedForImageKind {
                path: path.to_path_buf(),
            }),
        }
    }
}

impl<T: ModuleMetadata + ?Sized> ModuleMetadata for Arc<T> {
    fn identity(&self) -> Result<AssemblyIdentity> {
        (**self).identity()
    }

    fn runtime_version(&self) -> Result<String> {
        (**self).runtime_version()
    }

    fn assembly_attributes(&self) -> Result<Vec<AttributeRecord>> {
        (**self).assembly_attributes()
    }

    fn type_definitions(&self) -> Result<Vec<TypeDefinition>> {
        (**self).type_definitions()
    }

    fn constructor_type(&self, constructor: Token) -> Result<TypeName> {
        (**self).constructor_type(constructor)
    }
}
