//! Value shapes of custom attribute arguments and the ECMA-335 type codes they map to.

use std::fmt;

use strum::{Display, EnumIter};

use crate::{Error::TypeNotPrimitive, Result};

/// Fully-qualified name of `System.Type`, whose arguments are serialized as type name strings
pub const SYSTEM_TYPE: &str = "System.Type";

/// ECMA-335 `ELEMENT_TYPE` constants (II.23.1.16) that can describe attribute arguments
#[allow(non_snake_case, missing_docs)]
pub mod ELEMENT_TYPE {
    pub const VOID: u8 = 0x01;
    pub const BOOLEAN: u8 = 0x02;
    pub const CHAR: u8 = 0x03;
    pub const I1: u8 = 0x04;
    pub const U1: u8 = 0x05;
    pub const I2: u8 = 0x06;
    pub const U2: u8 = 0x07;
    pub const I4: u8 = 0x08;
    pub const U4: u8 = 0x09;
    pub const I8: u8 = 0x0A;
    pub const U8: u8 = 0x0B;
    pub const R4: u8 = 0x0C;
    pub const R8: u8 = 0x0D;
    pub const STRING: u8 = 0x0E;
    pub const TYPEDBYREF: u8 = 0x16;
    pub const I: u8 = 0x18;
    pub const U: u8 = 0x19;
    pub const OBJECT: u8 = 0x1C;
    pub const SZARRAY: u8 = 0x1D;
}

/// .NET `CorSerializationType` constants as defined in corhdr.h
#[allow(non_snake_case, missing_docs)]
pub mod SERIALIZATION_TYPE {
    pub const BOOLEAN: u8 = 0x02;
    pub const CHAR: u8 = 0x03;
    pub const I1: u8 = 0x04;
    pub const U1: u8 = 0x05;
    pub const I2: u8 = 0x06;
    pub const U2: u8 = 0x07;
    pub const I4: u8 = 0x08;
    pub const U4: u8 = 0x09;
    pub const I8: u8 = 0x0A;
    pub const U8: u8 = 0x0B;
    pub const R4: u8 = 0x0C;
    pub const R8: u8 = 0x0D;
    pub const STRING: u8 = 0x0E;
    pub const SZARRAY: u8 = 0x1D;
    pub const TYPE: u8 = 0x50;
    pub const TAGGED_OBJECT: u8 = 0x51;
    pub const FIELD: u8 = 0x53;
    pub const PROPERTY: u8 = 0x54;
    pub const ENUM: u8 = 0x55;
}

/// The primitive type codes a constructor parameter can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[allow(missing_docs)]
pub enum PrimitiveTypeCode {
    Void,
    Boolean,
    Char,
    I1,
    U1,
    I2,
    U2,
    I4,
    U4,
    I8,
    U8,
    R4,
    R8,
    String,
    TypedReference,
    I,
    U,
    Object,
}

impl PrimitiveTypeCode {
    /// Maps an `ELEMENT_TYPE` byte to its primitive code.
    ///
    /// ## Arguments
    /// * 'element_type' - The raw signature byte
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotPrimitive`] for class, value type, array and other
    /// non-primitive element types.
    pub fn from_element_type(element_type: u8) -> Result<Self> {
        Ok(match element_type {
            ELEMENT_TYPE::VOID => PrimitiveTypeCode::Void,
            ELEMENT_TYPE::BOOLEAN => PrimitiveTypeCode::Boolean,
            ELEMENT_TYPE::CHAR => PrimitiveTypeCode::Char,
            ELEMENT_TYPE::I1 => PrimitiveTypeCode::I1,
            ELEMENT_TYPE::U1 => PrimitiveTypeCode::U1,
            ELEMENT_TYPE::I2 => PrimitiveTypeCode::I2,
            ELEMENT_TYPE::U2 => PrimitiveTypeCode::U2,
            ELEMENT_TYPE::I4 => PrimitiveTypeCode::I4,
            ELEMENT_TYPE::U4 => PrimitiveTypeCode::U4,
            ELEMENT_TYPE::I8 => PrimitiveTypeCode::I8,
            ELEMENT_TYPE::U8 => PrimitiveTypeCode::U8,
            ELEMENT_TYPE::R4 => PrimitiveTypeCode::R4,
            ELEMENT_TYPE::R8 => PrimitiveTypeCode::R8,
            ELEMENT_TYPE::STRING => PrimitiveTypeCode::String,
            ELEMENT_TYPE::TYPEDBYREF => PrimitiveTypeCode::TypedReference,
            ELEMENT_TYPE::I => PrimitiveTypeCode::I,
            ELEMENT_TYPE::U => PrimitiveTypeCode::U,
            ELEMENT_TYPE::OBJECT => PrimitiveTypeCode::Object,
            other => return Err(TypeNotPrimitive(other)),
        })
    }

    /// Returns the `ELEMENT_TYPE` byte of this code.
    #[must_use]
    pub fn element_type(self) -> u8 {
        match self {
            PrimitiveTypeCode::Void => ELEMENT_TYPE::VOID,
            PrimitiveTypeCode::Boolean => ELEMENT_TYPE::BOOLEAN,
            PrimitiveTypeCode::Char => ELEMENT_TYPE::CHAR,
            PrimitiveTypeCode::I1 => ELEMENT_TYPE::I1,
            PrimitiveTypeCode::U1 => ELEMENT_TYPE::U1,
            PrimitiveTypeCode::I2 => ELEMENT_TYPE::I2,
            PrimitiveTypeCode::U2 => ELEMENT_TYPE::U2,
            PrimitiveTypeCode::I4 => ELEMENT_TYPE::I4,
            PrimitiveTypeCode::U4 => ELEMENT_TYPE::U4,
            PrimitiveTypeCode::I8 => ELEMENT_TYPE::I8,
            PrimitiveTypeCode::U8 => ELEMENT_TYPE::U8,
            PrimitiveTypeCode::R4 => ELEMENT_TYPE::R4,
            PrimitiveTypeCode::R8 => ELEMENT_TYPE::R8,
            PrimitiveTypeCode::String => ELEMENT_TYPE::STRING,
            PrimitiveTypeCode::TypedReference => ELEMENT_TYPE::TYPEDBYREF,
            PrimitiveTypeCode::I => ELEMENT_TYPE::I,
            PrimitiveTypeCode::U => ELEMENT_TYPE::U,
            PrimitiveTypeCode::Object => ELEMENT_TYPE::OBJECT,
        }
    }
}

/// The shape of a custom attribute argument.
///
/// `Named` is a reference that has not been resolved yet. The resolver turns references to
/// known enums into `Enum`, the decoder refuses to decode anything still `Named` other than
/// [`SYSTEM_TYPE`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ValueShape {
    Bool,
    Byte,
    Char,
    Double,
    Int16,
    Int32,
    Int64,
    IntPtr,
    Object,
    SByte,
    Single,
    String,
    TypedReference,
    UInt16,
    UInt32,
    UInt64,
    UIntPtr,
    Void,
    /// An enum with its full name and its underlying integer shape
    Enum {
        name: String,
        underlying: Box<ValueShape>,
    },
    /// A single-dimensional, zero-based array
    Array(Box<ValueShape>),
    /// An unresolved reference to a type by its full name
    Named(String),
}

impl ValueShape {
    /// Shape of an enum with the given full name and underlying shape
    pub fn enumeration(name: impl Into<String>, underlying: ValueShape) -> Self {
        ValueShape::Enum {
            name: name.into(),
            underlying: Box::new(underlying),
        }
    }

    /// Shape of a single-dimensional array of `element`
    #[must_use]
    pub fn array(element: ValueShape) -> Self {
        ValueShape::Array(Box::new(element))
    }

    /// Shape of a reference to a type that still has to be resolved
    pub fn named(full_name: impl Into<String>) -> Self {
        ValueShape::Named(full_name.into())
    }

    /// Returns `true` for the integer shapes an enum can be based on.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ValueShape::Byte
                | ValueShape::SByte
                | ValueShape::Int16
                | ValueShape::UInt16
                | ValueShape::Int32
                | ValueShape::UInt32
                | ValueShape::Int64
                | ValueShape::UInt64
        )
    }

    /// Returns `true` if no part of this shape is an unresolved reference.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        match self {
            ValueShape::Named(name) => name == SYSTEM_TYPE,
            ValueShape::Array(element) => element.is_resolved(),
            _ => true,
        }
    }

    /// The `CorSerializationType` tag of scalar shapes, as used for named arguments and
    /// boxed values.
    ///
    /// Returns `None` for arrays, enums and references, which need more than one byte, and for
    /// shapes that cannot appear in an attribute blob at all.
    #[must_use]
    pub fn serialization_tag(&self) -> Option<u8> {
        Some(match self {
            ValueShape::Bool => SERIALIZATION_TYPE::BOOLEAN,
            ValueShape::Char => SERIALIZATION_TYPE::CHAR,
            ValueShape::SByte => SERIALIZATION_TYPE::I1,
            ValueShape::Byte => SERIALIZATION_TYPE::U1,
            ValueShape::Int16 => SERIALIZATION_TYPE::I2,
            ValueShape::UInt16 => SERIALIZATION_TYPE::U2,
            ValueShape::Int32 => SERIALIZATION_TYPE::I4,
            ValueShape::UInt32 => SERIALIZATION_TYPE::U4,
            ValueShape::Int64 => SERIALIZATION_TYPE::I8,
            ValueShape::UInt64 => SERIALIZATION_TYPE::U8,
            ValueShape::Single => SERIALIZATION_TYPE::R4,
            ValueShape::Double => SERIALIZATION_TYPE::R8,
            ValueShape::String => SERIALIZATION_TYPE::STRING,
            ValueShape::Object => SERIALIZATION_TYPE::TAGGED_OBJECT,
            ValueShape::Named(name) if name == SYSTEM_TYPE => SERIALIZATION_TYPE::TYPE,
            _ => return None,
        })
    }

    /// Maps a scalar `CorSerializationType` tag back to its shape.
    #[must_use]
    pub fn from_serialization_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            SERIALIZATION_TYPE::BOOLEAN => ValueShape::Bool,
            SERIALIZATION_TYPE::CHAR => ValueShape::Char,
            SERIALIZATION_TYPE::I1 => ValueShape::SByte,
            SERIALIZATION_TYPE::U1 => ValueShape::Byte,
            SERIALIZATION_TYPE::I2 => ValueShape::Int16,
            SERIALIZATION_TYPE::U2 => ValueShape::UInt16,
            SERIALIZATION_TYPE::I4 => ValueShape::Int32,
            SERIALIZATION_TYPE::U4 => ValueShape::UInt32,
            SERIALIZATION_TYPE::I8 => ValueShape::Int64,
            SERIALIZATION_TYPE::U8 => ValueShape::UInt64,
            SERIALIZATION_TYPE::R4 => ValueShape::Single,
            SERIALIZATION_TYPE::R8 => ValueShape::Double,
            SERIALIZATION_TYPE::STRING => ValueShape::String,
            SERIALIZATION_TYPE::TYPE => ValueShape::Named(SYSTEM_TYPE.to_string()),
            SERIALIZATION_TYPE::TAGGED_OBJECT => ValueShape::Object,
            _ => return None,
        })
    }
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueShape::Bool => f.write_str("bool"),
            ValueShape::Byte => f.write_str("uint8"),
            ValueShape::Char => f.write_str("char"),
            ValueShape::Double => f.write_str("float64"),
            ValueShape::Int16 => f.write_str("int16"),
            ValueShape::Int32 => f.write_str("int32"),
            ValueShape::Int64 => f.write_str("int64"),
            ValueShape::IntPtr => f.write_str("native int"),
            ValueShape::Object => f.write_str("object"),
            ValueShape::SByte => f.write_str("int8"),
            ValueShape::Single => f.write_str("float32"),
            ValueShape::String => f.write_str("string"),
            ValueShape::TypedReference => f.write_str("typedref"),
            ValueShape::UInt16 => f.write_str("uint16"),
            ValueShape::UInt32 => f.write_str("uint32"),
            ValueShape::UInt64 => f.write_str("uint64"),
            ValueShape::UIntPtr => f.write_str("native uint"),
            ValueShape::Void => f.write_str("void"),
            ValueShape::Enum { name, underlying } => write!(f, "enum {name} : {underlying}"),
            ValueShape::Array(element) => write!(f, "{element}[]"),
            ValueShape::Named(name) => f.write_str(name),
        }
    }
}
