//! Decoded custom attribute values.

use std::fmt;

use crate::{metadata::customattributes::known::KnownAttribute, Error, Result};

/// A decoded enum value.
///
/// Enum sets are open, so a value without a matching constant is still a valid value. It just
/// has no `constant`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    /// Full name of the enum type
    pub type_name: String,
    /// Underlying integer value, widened to `i64`
    pub value: i64,
    /// Name of the matching constant, `None` for unnamed values
    pub constant: Option<String>,
}

impl EnumValue {
    /// Returns `true` if the value matches a declared constant.
    #[must_use]
    pub fn is_named(&self) -> bool {
        self.constant.is_some()
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.constant {
            Some(constant) => write!(f, "{}.{}", self.type_name, constant),
            None => write!(f, "({}){}", self.type_name, self.value),
        }
    }
}

/// A single decoded argument value
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Boolean value
    Bool(bool),
    /// Character value (16-bit Unicode)
    Char(char),
    /// Signed 8-bit integer
    I1(i8),
    /// Unsigned 8-bit integer
    U1(u8),
    /// Signed 16-bit integer
    I2(i16),
    /// Unsigned 16-bit integer
    U2(u16),
    /// Signed 32-bit integer
    I4(i32),
    /// Unsigned 32-bit integer
    U4(u32),
    /// Signed 64-bit integer
    I8(i64),
    /// Unsigned 64-bit integer
    U8(u64),
    /// 32-bit floating point
    R4(f32),
    /// 64-bit floating point
    R8(f64),
    /// Native signed integer, always stored as 64 bits
    I(i64),
    /// Native unsigned integer, always stored as 64 bits
    U(u64),
    /// UTF-8 string, empty for null strings
    String(String),
    /// Type reference, as a (possibly assembly-qualified) type name
    Type(String),
    /// Enum value
    Enum(EnumValue),
    /// Array of values, empty for null arrays
    Array(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Returns the boolean, if this is a `Bool`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the string, if this is a `String` or a `Type`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(value) | AttributeValue::Type(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the integer, if this is an `I4`.
    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            AttributeValue::I4(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the enum value, if this is an `Enum`.
    #[must_use]
    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            AttributeValue::Enum(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the elements, if this is an `Array`.
    #[must_use]
    pub fn as_array(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::Array(values) => Some(values),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Bool(value) => write!(f, "{value}"),
            AttributeValue::Char(value) => write!(f, "'{value}'"),
            AttributeValue::I1(value) => write!(f, "{value}"),
            AttributeValue::U1(value) => write!(f, "{value}"),
            AttributeValue::I2(value) => write!(f, "{value}"),
            AttributeValue::U2(value) => write!(f, "{value}"),
            AttributeValue::I4(value) => write!(f, "{value}"),
            AttributeValue::U4(value) => write!(f, "{value}"),
            AttributeValue::I8(value) | AttributeValue::I(value) => write!(f, "{value}"),
            AttributeValue::U8(value) | AttributeValue::U(value) => write!(f, "{value}"),
            AttributeValue::R4(value) => write!(f, "{value}"),
            AttributeValue::R8(value) => write!(f, "{value}"),
            AttributeValue::String(value) => write!(f, "\"{value}\""),
            AttributeValue::Type(value) => write!(f, "typeof({value})"),
            AttributeValue::Enum(value) => write!(f, "{value}"),
            AttributeValue::Array(values) => {
                f.write_str("[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Whether a named argument sets a field or a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Field, serialized with the `0x53` indicator
    Field,
    /// Property, serialized with the `0x54` indicator
    Property,
}

/// A decoded named argument
#[derive(Debug, Clone, PartialEq)]
pub struct NamedValue {
    /// Field or property
    pub kind: MemberKind,
    /// Member name
    pub name: String,
    /// Decoded value
    pub value: AttributeValue,
}

/// A fully decoded custom attribute instance.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAttribute {
    /// Full name of the attribute type
    pub type_name: String,
    /// Constructor arguments, in declaration order
    pub fixed: Vec<AttributeValue>,
    /// Named arguments, in blob order
    pub named: Vec<NamedValue>,
    /// Typed view produced by the descriptor hook
    pub known: Option<KnownAttribute>,
}

impl DecodedAttribute {
    /// Creates a decoded attribute without a typed view.
    pub fn new(
        type_name: impl Into<String>,
        fixed: Vec<AttributeValue>,
        named: Vec<NamedValue>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            fixed,
            named,
            known: None,
        }
    }

    /// Returns the value of the named argument `name`, if it was set.
    ///
    /// If a member was set more than once, the last assignment wins.
    #[must_use]
    pub fn named_value(&self, name: &str) -> Option<&AttributeValue> {
        self.named
            .iter()
            .rev()
            .find(|named| named.name == name)
            .map(|named| &named.value)
    }

    /// Returns the constructor argument at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedAttributeRecord`] if there is no such argument.
    pub fn fixed_arg(&self, index: usize) -> Result<&AttributeValue> {
        self.fixed.get(index).ok_or_else(|| {
            self.malformed(format!("missing constructor argument {index}"))
        })
    }

    /// Returns the string constructor argument at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedAttributeRecord`] if the argument is missing or not a
    /// string.
    pub fn fixed_str(&self, index: usize) -> Result<&str> {
        let value = self.fixed_arg(index)?;
        value
            .as_str()
            .ok_or_else(|| self.malformed(format!("argument {index} is not a string: {value}")))
    }

    /// Returns the boolean constructor argument at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedAttributeRecord`] if the argument is missing or not a
    /// boolean.
    pub fn fixed_bool(&self, index: usize) -> Result<bool> {
        let value = self.fixed_arg(index)?;
        value
            .as_bool()
            .ok_or_else(|| self.malformed(format!("argument {index} is not a boolean: {value}")))
    }

    /// Returns the enum constructor argument at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedAttributeRecord`] if the argument is missing or not an
    /// enum value.
    pub fn fixed_enum(&self, index: usize) -> Result<&EnumValue> {
        let value = self.fixed_arg(index)?;
        value
            .as_enum()
            .ok_or_else(|| self.malformed(format!("argument {index} is not an enum: {value}")))
    }

    pub(crate) fn malformed(&self, message: String) -> Error {
        Error::MalformedAttributeRecord {
            attribute: self.type_name.clone(),
            message,
        }
    }
}

impl fmt::Display for DecodedAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}(", self.type_name)?;

        let mut first = true;
        for value in &self.fixed {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{value}")?;
        }
        for named in &self.named {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{} = {}", named.name, named.value)?;
        }

        f.write_str(")]")
    }
}
