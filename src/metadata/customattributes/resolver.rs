//! Resolution of primitive type codes and type references into value shapes.
//!
//! Attribute constructors refer to enum parameters by name only. Decoding them requires the
//! underlying integer type, which lives in whichever assembly declares the enum. The resolver
//! keeps a closed table of enums whose layout is known up front: the two component model
//! enums, plus whatever the caller registers.

use std::collections::HashMap;

use crate::{
    metadata::customattributes::{
        known::names,
        shape::{PrimitiveTypeCode, ValueShape, SYSTEM_TYPE},
        value::EnumValue,
    },
    registration::{ServerType, ThreadingModel},
    Error::{UnknownEnumType, UnsupportedPrimitive, ValueShapeMismatch},
    Result,
};

/// Layout and constants of an enum type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    /// Full name of the enum type
    pub name: String,
    /// Underlying integer shape
    pub underlying: ValueShape,
    /// Declared constants, as `(name, value)` pairs in declaration order
    pub constants: Vec<(String, i64)>,
}

impl EnumDescriptor {
    /// Creates an enum descriptor without constants.
    ///
    /// # Errors
    /// Returns [`crate::Error::ValueShapeMismatch`] if `underlying` is not an integer shape.
    pub fn new(name: impl Into<String>, underlying: ValueShape) -> Result<Self> {
        let name = name.into();
        if !underlying.is_integer() {
            return Err(ValueShapeMismatch(format!(
                "enum {name} can not be based on {underlying}"
            )));
        }

        Ok(Self {
            name,
            underlying,
            constants: Vec::new(),
        })
    }

    /// Adds a constant.
    #[must_use]
    pub fn with_constant(mut self, name: impl Into<String>, value: i64) -> Self {
        self.constants.push((name.into(), value));
        self
    }

    /// Returns the name of the first constant with this value.
    #[must_use]
    pub fn constant_name(&self, value: i64) -> Option<&str> {
        self.constants
            .iter()
            .find(|(_, constant)| *constant == value)
            .map(|(name, _)| name.as_str())
    }

    /// Returns the value of the constant with this name.
    #[must_use]
    pub fn constant_value(&self, name: &str) -> Option<i64> {
        self.constants
            .iter()
            .find(|(constant, _)| constant == name)
            .map(|(_, value)| *value)
    }

    fn from_constants(
        name: &str,
        constants: impl Iterator<Item = (&'static str, i64)>,
    ) -> Self {
        Self {
            name: name.to_string(),
            underlying: ValueShape::Int32,
            constants: constants
                .map(|(constant, value)| (constant.to_string(), value))
                .collect(),
        }
    }
}

/// Converts primitive type codes and type references into [`ValueShape`]s.
#[derive(Debug, Clone)]
pub struct TypeResolver {
    enums: HashMap<String, EnumDescriptor>,
}

impl TypeResolver {
    /// Creates a resolver that knows the component model enums.
    #[must_use]
    pub fn new() -> Self {
        let mut resolver = Self::empty();
        resolver.register_enum(EnumDescriptor::from_constants(
            names::SERVER_TYPE_ENUM,
            ServerType::constants(),
        ));
        resolver.register_enum(EnumDescriptor::from_constants(
            names::THREADING_MODEL_ENUM,
            ThreadingModel::constants(),
        ));
        resolver
    }

    /// Creates a resolver without any enums.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            enums: HashMap::new(),
        }
    }

    /// Adds an enum, replacing and returning any previous descriptor of the same name.
    pub fn register_enum(&mut self, descriptor: EnumDescriptor) -> Option<EnumDescriptor> {
        self.enums.insert(descriptor.name.clone(), descriptor)
    }

    /// Looks up a known enum by its full name.
    #[must_use]
    pub fn enum_descriptor(&self, name: &str) -> Option<&EnumDescriptor> {
        self.enums.get(name)
    }

    /// Maps a primitive type code to its shape.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnsupportedPrimitive`] for `Void`, which can not be the type of
    /// an argument.
    pub fn resolve_primitive(&self, code: PrimitiveTypeCode) -> Result<ValueShape> {
        Ok(match code {
            PrimitiveTypeCode::Void => return Err(UnsupportedPrimitive),
            PrimitiveTypeCode::Boolean => ValueShape::Bool,
            PrimitiveTypeCode::Char => ValueShape::Char,
            PrimitiveTypeCode::I1 => ValueShape::SByte,
            PrimitiveTypeCode::U1 => ValueShape::Byte,
            PrimitiveTypeCode::I2 => ValueShape::Int16,
            PrimitiveTypeCode::U2 => ValueShape::UInt16,
            PrimitiveTypeCode::I4 => ValueShape::Int32,
            PrimitiveTypeCode::U4 => ValueShape::UInt32,
            PrimitiveTypeCode::I8 => ValueShape::Int64,
            PrimitiveTypeCode::U8 => ValueShape::UInt64,
            PrimitiveTypeCode::R4 => ValueShape::Single,
            PrimitiveTypeCode::R8 => ValueShape::Double,
            PrimitiveTypeCode::String => ValueShape::String,
            PrimitiveTypeCode::TypedReference => ValueShape::TypedReference,
            PrimitiveTypeCode::I => ValueShape::IntPtr,
            PrimitiveTypeCode::U => ValueShape::UIntPtr,
            PrimitiveTypeCode::Object => ValueShape::Object,
        })
    }

    /// Maps a type reference to its shape.
    ///
    /// `System.String`, `System.Object` and `System.Type` are always known. Other references
    /// resolve only if they name a registered enum, `None` otherwise.
    #[must_use]
    pub fn resolve_reference(&self, namespace: &str, name: &str) -> Option<ValueShape> {
        let full_name = if namespace.is_empty() {
            name.to_string()
        } else {
            format!("{namespace}.{name}")
        };

        self.resolve_full_name(&full_name)
    }

    /// Resolves every `Named` part of a shape.
    ///
    /// Returns `None` if any part refers to an unknown type.
    #[must_use]
    pub fn resolve_shape(&self, shape: &ValueShape) -> Option<ValueShape> {
        match shape {
            ValueShape::Named(full_name) => self.resolve_full_name(full_name),
            ValueShape::Array(element) => self.resolve_shape(element).map(ValueShape::array),
            other => Some(other.clone()),
        }
    }

    /// Returns the underlying shape of an enum, given as `Named` or `Enum`.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnknownEnumType`] if the enum is not registered or the shape
    /// does not refer to an enum at all.
    pub fn enum_underlying_shape(&self, shape: &ValueShape) -> Result<ValueShape> {
        match shape {
            ValueShape::Named(name) | ValueShape::Enum { name, .. } => self
                .enums
                .get(name)
                .map(|descriptor| descriptor.underlying.clone())
                .ok_or_else(|| UnknownEnumType(name.clone())),
            other => Err(UnknownEnumType(other.to_string())),
        }
    }

    /// Builds the decoded form of a raw enum value, looking up its constant.
    #[must_use]
    pub fn enum_value(&self, name: &str, value: i64) -> EnumValue {
        let constant = self
            .enums
            .get(name)
            .and_then(|descriptor| descriptor.constant_name(value))
            .map(str::to_string);

        EnumValue {
            type_name: name.to_string(),
            value,
            constant,
        }
    }

    fn resolve_full_name(&self, full_name: &str) -> Option<ValueShape> {
        match full_name {
            "System.String" => Some(ValueShape::String),
            "System.Object" => Some(ValueShape::Object),
            SYSTEM_TYPE => Some(ValueShape::named(SYSTEM_TYPE)),
            _ => self.enums.get(full_name).map(|descriptor| {
                ValueShape::enumeration(descriptor.name.clone(), descriptor.underlying.clone())
            }),
        }
    }
}

impl Default for TypeResolver {
    fn default() -> Self {
        Self::new()
    }
}
