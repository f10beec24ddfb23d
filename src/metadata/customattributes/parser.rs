//! Custom attribute blob parsing according to ECMA-335 II.23.3.
//!
//! A blob is laid out as follows:
//!
//! ```text
//! +--------+-------------+----------+-----------------+
//! | 0x0001 | FixedArg... | NumNamed | NamedArg...     |
//! | u16    | untagged    | u16      | tagged, named   |
//! +--------+-------------+----------+-----------------+
//! ```
//!
//! Fixed arguments carry no type information, so they are decoded against the constructor
//! parameter shapes of the attribute's [`crate::metadata::customattributes::AttributeDescriptor`].
//! Named arguments start with a field/property indicator and a `CorSerializationType` tag,
//! enum-typed ones additionally name their enum type.
//!
//! # Examples
//!
//! ```rust
//! use comscope::metadata::customattributes::{
//!     parse_custom_attribute_blob, AttributeDescriptor, AttributeValue, TypeResolver, ValueShape,
//! };
//!
//! let descriptor = AttributeDescriptor::new("System.Runtime.InteropServices.ComVisibleAttribute")
//!     .param(ValueShape::Bool);
//! let blob = [0x01, 0x00, 0x01, 0x00, 0x00];
//!
//! let decoded = parse_custom_attribute_blob(&blob, &descriptor, &descriptor.params, &TypeResolver::new())?;
//! assert_eq!(decoded.fixed, [AttributeValue::Bool(true)]);
//! # Ok::<(), comscope::Error>(())
//! ```

use crate::{
    file::parser::Parser,
    metadata::customattributes::{
        registry::AttributeDescriptor,
        resolver::TypeResolver,
        shape::{ValueShape, SERIALIZATION_TYPE, SYSTEM_TYPE},
        value::{AttributeValue, DecodedAttribute, MemberKind, NamedValue},
    },
    Error::{self, MalformedAttributeRecord, UnknownEnumType},
    Result,
};

/// Maximum nesting of boxed values and array element types
const MAX_NESTING_DEPTH: usize = 64;

/// Custom attribute blob prolog
const PROLOG: u16 = 0x0001;

/// Decodes a custom attribute blob.
///
/// `params` are the constructor parameter shapes with every reference already resolved, see
/// [`crate::metadata::customattributes::TypeResolver::resolve_shape`].
///
/// # Errors
/// Returns [`crate::Error::UnknownEnumType`] if a named argument refers to an enum the
/// resolver does not know. Every other failure is reported as
/// [`crate::Error::MalformedAttributeRecord`] carrying the attribute name.
pub fn parse_custom_attribute_blob(
    data: &[u8],
    descriptor: &AttributeDescriptor,
    params: &[ValueShape],
    resolver: &TypeResolver,
) -> Result<DecodedAttribute> {
    let mut parser = CustomAttributeParser::new(data, resolver);

    parser
        .parse_custom_attribute(descriptor, params)
        .map_err(|error| match error {
            UnknownEnumType(_) | MalformedAttributeRecord { .. } => error,
            other => MalformedAttributeRecord {
                attribute: descriptor.name.clone(),
                message: other.to_string(),
            },
        })
}

/// Stateful decoder over a single custom attribute blob.
pub struct CustomAttributeParser<'a> {
    /// Binary data parser for reading attribute blob
    parser: Parser<'a>,
    /// Enum lookup for enum-typed values
    resolver: &'a TypeResolver,
}

impl<'a> CustomAttributeParser<'a> {
    /// Creates a new custom attribute parser for the provided blob data.
    ///
    /// # Arguments
    /// * `data` - Raw bytes of the custom attribute blob to parse
    /// * `resolver` - Resolver used for enum types and constants
    #[must_use]
    pub fn new(data: &'a [u8], resolver: &'a TypeResolver) -> Self {
        Self {
            parser: Parser::new(data),
            resolver,
        }
    }

    /// Parse a complete custom attribute blob.
    ///
    /// The returned attribute has no typed view yet, running the descriptor hook is up to
    /// the caller.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] or [`crate::Error::OutOfBounds`] for an invalid
    /// prolog, truncated data, unsupported tags, member kind or shape mismatches and trailing
    /// bytes, and [`crate::Error::UnknownEnumType`] for named arguments of unknown enum types.
    pub fn parse_custom_attribute(
        &mut self,
        descriptor: &AttributeDescriptor,
        params: &[ValueShape],
    ) -> Result<DecodedAttribute> {
        let prolog = self.parser.read_le::<u16>()?;
        if prolog != PROLOG {
            return Err(malformed_error!(
                "Invalid custom attribute prolog - expected 0x0001, got 0x{:04X}",
                prolog
            ));
        }

        let mut fixed = Vec::with_capacity(params.len());
        for shape in params {
            fixed.push(self.parse_value(shape, 0)?);
        }

        let num_named = self.parser.read_le::<u16>()?;
        let mut named = Vec::with_capacity(usize::from(num_named).min(self.parser.remaining()));
        for _ in 0..num_named {
            named.push(self.parse_named_argument(descriptor)?);
        }

        if self.parser.has_more_data() {
            return Err(malformed_error!(
                "{} trailing bytes after named arguments",
                self.parser.remaining()
            ));
        }

        Ok(DecodedAttribute::new(descriptor.name.clone(), fixed, named))
    }

    /// Parse a named argument (field or property).
    ///
    /// # Format
    /// 1. Field/Property indicator: 0x53 (FIELD) or 0x54 (PROPERTY)
    /// 2. Type: `CorSerializationType` tag, followed by the element type for arrays or the
    ///    type name for enums
    /// 3. Name: Compressed length + UTF-8 string
    /// 4. Value: Type-specific binary data
    ///
    /// Members the descriptor declares must match its kind and shape. Members it does not
    /// declare are kept with the kind from the blob.
    fn parse_named_argument(&mut self, descriptor: &AttributeDescriptor) -> Result<NamedValue> {
        let indicator = self.parser.read_le::<u8>()?;
        let kind = match indicator {
            SERIALIZATION_TYPE::FIELD => MemberKind::Field,
            SERIALIZATION_TYPE::PROPERTY => MemberKind::Property,
            _ => {
                return Err(malformed_error!(
                    "Invalid field/property indicator: 0x{:02X}",
                    indicator
                ))
            }
        };

        let tag = self.parser.read_le::<u8>()?;
        let shape = self.parse_field_type(tag, 0)?;
        let name = self.parser.read_compressed_string_utf8()?;

        if let Some(member) = descriptor.member(&name) {
            if member.kind != kind {
                return Err(malformed_error!(
                    "Member '{}' is declared as {:?} but encoded as {:?}",
                    name,
                    member.kind,
                    kind
                ));
            }

            let declared = self
                .resolver
                .resolve_shape(&member.shape)
                .ok_or_else(|| UnknownEnumType(member.shape.to_string()))?;
            if declared != shape {
                return Err(malformed_error!(
                    "Member '{}' is declared as {} but encoded as {}",
                    name,
                    declared,
                    shape
                ));
            }
        }

        let value = self.parse_value(&shape, 0)?;

        Ok(NamedValue { kind, name, value })
    }

    /// Parse the type of a named argument or boxed value, starting with its tag.
    fn parse_field_type(&mut self, tag: u8, depth: usize) -> Result<ValueShape> {
        if depth > MAX_NESTING_DEPTH {
            return Err(malformed_error!(
                "Type nesting exceeds {} levels",
                MAX_NESTING_DEPTH
            ));
        }

        match tag {
            SERIALIZATION_TYPE::SZARRAY => {
                let element_tag = self.parser.read_le::<u8>()?;
                let element = self.parse_field_type(element_tag, depth + 1)?;
                Ok(ValueShape::array(element))
            }
            SERIALIZATION_TYPE::ENUM => {
                let qualified = self.parser.read_compressed_string_utf8()?;
                let name = qualified.split(',').next().unwrap_or_default().trim();
                if name.is_empty() {
                    return Err(malformed_error!("Enum type name is empty"));
                }

                match self.resolver.resolve_shape(&ValueShape::named(name)) {
                    Some(shape @ ValueShape::Enum { .. }) => Ok(shape),
                    _ => Err(UnknownEnumType(name.to_string())),
                }
            }
            _ => ValueShape::from_serialization_tag(tag).ok_or_else(|| {
                malformed_error!("Unsupported serialization type tag: 0x{:02X}", tag)
            }),
        }
    }

    /// Parse a single value of a known shape.
    fn parse_value(&mut self, shape: &ValueShape, depth: usize) -> Result<AttributeValue> {
        if depth > MAX_NESTING_DEPTH {
            return Err(malformed_error!(
                "Value nesting exceeds {} levels",
                MAX_NESTING_DEPTH
            ));
        }

        Ok(match shape {
            ValueShape::Bool => AttributeValue::Bool(self.parser.read_le::<u8>()? != 0),
            ValueShape::Char => {
                let val = self.parser.read_le::<u16>()?;
                AttributeValue::Char(char::from_u32(u32::from(val)).unwrap_or('\u{FFFD}'))
            }
            ValueShape::SByte => AttributeValue::I1(self.parser.read_le::<i8>()?),
            ValueShape::Byte => AttributeValue::U1(self.parser.read_le::<u8>()?),
            ValueShape::Int16 => AttributeValue::I2(self.parser.read_le::<i16>()?),
            ValueShape::UInt16 => AttributeValue::U2(self.parser.read_le::<u16>()?),
            ValueShape::Int32 => AttributeValue::I4(self.parser.read_le::<i32>()?),
            ValueShape::UInt32 => AttributeValue::U4(self.parser.read_le::<u32>()?),
            ValueShape::Int64 => AttributeValue::I8(self.parser.read_le::<i64>()?),
            ValueShape::UInt64 => AttributeValue::U8(self.parser.read_le::<u64>()?),
            ValueShape::Single => AttributeValue::R4(self.parser.read_le::<f32>()?),
            ValueShape::Double => AttributeValue::R8(self.parser.read_le::<f64>()?),
            ValueShape::IntPtr => AttributeValue::I(self.parser.read_le::<i64>()?),
            ValueShape::UIntPtr => AttributeValue::U(self.parser.read_le::<u64>()?),
            ValueShape::String => AttributeValue::String(self.parse_string()?),
            ValueShape::Named(name) if name == SYSTEM_TYPE => {
                AttributeValue::Type(self.parse_string()?)
            }
            ValueShape::Object => {
                // Boxed value: the type travels with it
                let tag = self.parser.read_le::<u8>()?;
                let inner = self.parse_field_type(tag, depth + 1)?;
                self.parse_value(&inner, depth + 1)?
            }
            ValueShape::Enum { name, underlying } => {
                let raw = self.parse_enum_underlying(name, underlying)?;
                AttributeValue::Enum(self.resolver.enum_value(name, raw))
            }
            ValueShape::Array(element) => {
                let length = self.parser.read_le::<i32>()?;
                if length == -1 || length == 0 {
                    return Ok(AttributeValue::Array(Vec::new()));
                }

                let Ok(length) = usize::try_from(length) else {
                    return Err(malformed_error!("Invalid array length: {}", length));
                };

                // Every element occupies at least one byte
                if length > self.parser.remaining() {
                    return Err(malformed_error!(
                        "Array length {} exceeds remaining {} bytes",
                        length,
                        self.parser.remaining()
                    ));
                }

                let mut elements = Vec::with_capacity(length);
                for _ in 0..length {
                    elements.push(self.parse_value(element, depth + 1)?);
                }
                AttributeValue::Array(elements)
            }
            ValueShape::Void | ValueShape::TypedReference | ValueShape::Named(_) => {
                return Err(malformed_error!(
                    "Type {} can not appear in a custom attribute",
                    shape
                ))
            }
        })
    }

    /// Read the underlying integer of an enum value, widened to `i64`.
    fn parse_enum_underlying(&mut self, name: &str, underlying: &ValueShape) -> Result<i64> {
        Ok(match underlying {
            ValueShape::Byte => i64::from(self.parser.read_le::<u8>()?),
            ValueShape::SByte => i64::from(self.parser.read_le::<i8>()?),
            ValueShape::Int16 => i64::from(self.parser.read_le::<i16>()?),
            ValueShape::UInt16 => i64::from(self.parser.read_le::<u16>()?),
            ValueShape::Int32 => i64::from(self.parser.read_le::<i32>()?),
            ValueShape::UInt32 => i64::from(self.parser.read_le::<u32>()?),
            ValueShape::Int64 => self.parser.read_le::<i64>()?,
            #[allow(clippy::cast_possible_wrap)]
            ValueShape::UInt64 => self.parser.read_le::<u64>()? as i64,
            _ => {
                return Err(malformed_error!(
                    "Enum {} has non-integer underlying type {}",
                    name,
                    underlying
                ))
            }
        })
    }

    /// Parse a `SerString`: a compressed length and UTF-8, or 0xFF for null.
    ///
    /// Null strings decode as the empty string.
    fn parse_string(&mut self) -> Result<String> {
        if self.parser.peek_byte()? == 0xFF {
            self.parser.read_le::<u8>()?;
            return Ok(String::new());
        }

        self.parser.read_compressed_string_utf8()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::customattributes::{known::names, resolver::EnumDescriptor};

    fn parse(
        blob: &[u8],
        descriptor: &AttributeDescriptor,
        resolver: &TypeResolver,
    ) -> Result<DecodedAttribute> {
        let params: Vec<ValueShape> = descriptor
            .params
            .iter()
            .map(|shape| resolver.resolve_shape(shape).unwrap())
            .collect();
        parse_custom_attribute_blob(blob, descriptor, &params, resolver)
    }

    fn descriptor(params: &[ValueShape]) -> AttributeDescriptor {
        params
            .iter()
            .cloned()
            .fold(AttributeDescriptor::new("Widgets.TestAttribute"), |d, shape| {
                d.param(shape)
            })
    }

    fn color_resolver() -> TypeResolver {
        let mut resolver = TypeResolver::new();
        resolver.register_enum(
            EnumDescriptor::new("Widgets.Color", ValueShape::Byte)
                .unwrap()
                .with_constant("Red", 1)
                .with_constant("Green", 2),
        );
        resolver
    }

    #[test]
    fn test_parse_empty_blob() {
        let resolver = TypeResolver::new();
        let result = parse(&[0x01, 0x00, 0x00, 0x00], &descriptor(&[]), &resolver).unwrap();

        assert_eq!(result.type_name, "Widgets.TestAttribute");
        assert!(result.fixed.is_empty());
        assert!(result.named.is_empty());
        assert!(result.known.is_none());
    }

    #[test]
    fn test_parse_invalid_prolog() {
        let resolver = TypeResolver::new();
        let result = parse(&[0x00, 0x01, 0x00, 0x00], &descriptor(&[]), &resolver);

        match result {
            Err(MalformedAttributeRecord { attribute, message }) => {
                assert_eq!(attribute, "Widgets.TestAttribute");
                assert!(message.contains("prolog"));
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_parse_missing_named_count() {
        let resolver = TypeResolver::new();
        let result = parse(&[0x01, 0x00], &descriptor(&[]), &resolver);

        assert!(matches!(result, Err(MalformedAttributeRecord { .. })));
    }

    #[test]
    fn test_parse_primitive_arguments() {
        let resolver = TypeResolver::new();
        let descriptor = descriptor(&[
            ValueShape::Bool,
            ValueShape::Char,
            ValueShape::SByte,
            ValueShape::UInt16,
            ValueShape::Int32,
            ValueShape::UInt64,
            ValueShape::Double,
        ]);

        let mut blob = vec![0x01, 0x00];
        blob.push(0x01); // true
        blob.extend_from_slice(&[0x41, 0x00]); // 'A'
        blob.push(0xFE); // -2
        blob.extend_from_slice(&[0x34, 0x12]); // 0x1234
        blob.extend_from_slice(&(-42_i32).to_le_bytes());
        blob.extend_from_slice(&u64::MAX.to_le_bytes());
        blob.extend_from_slice(&2.5_f64.to_le_bytes());
        blob.extend_from_slice(&[0x00, 0x00]);

        let result = parse(&blob, &descriptor, &resolver).unwrap();
        assert_eq!(
            result.fixed,
            [
                AttributeValue::Bool(true),
                AttributeValue::Char('A'),
                AttributeValue::I1(-2),
                AttributeValue::U2(0x1234),
                AttributeValue::I4(-42),
                AttributeValue::U8(u64::MAX),
                AttributeValue::R8(2.5),
            ]
        );
    }

    #[test]
    fn test_parse_strings() {
        let resolver = TypeResolver::new();
        let descriptor = descriptor(&[
            ValueShape::String,
            ValueShape::String,
            ValueShape::String,
            ValueShape::named(SYSTEM_TYPE),
        ]);

        let blob = [
            0x01, 0x00, // Prolog
            0x04, 0x54, 0x65, 0x73, 0x74, // "Test"
            0xFF, // null
            0x00, // ""
            0x0D, b'S', b'y', b's', b't', b'e', b'm', b'.', b'I', b'n', b't', b'3', b'2', b'!',
            0x00, 0x00, // NumNamed
        ];

        let result = parse(&blob, &descriptor, &resolver).unwrap();
        assert_eq!(
            result.fixed,
            [
                AttributeValue::String("Test".into()),
                AttributeValue::String(String::new()),
                AttributeValue::String(String::new()),
                AttributeValue::Type("System.Int32!".into()),
            ]
        );
    }

    #[test]
    fn test_parse_truncated_string() {
        let resolver = TypeResolver::new();
        let blob = [0x01, 0x00, 0x05, 0x48, 0x65];

        let result = parse(&blob, &descriptor(&[ValueShape::String]), &resolver);
        assert!(matches!(result, Err(MalformedAttributeRecord { .. })));
    }

    #[test]
    fn test_parse_boxed_object() {
        let resolver = TypeResolver::new();
        let blob = [
            0x01, 0x00, // Prolog
            0x08, 0x2A, 0x00, 0x00, 0x00, // I4 42
            0x1D, 0x02, 0x02, 0x00, 0x00, 0x00, 0x01, 0x00, // bool[] { true, false }
            0x00, 0x00, // NumNamed
        ];

        let result = parse(
            &blob,
            &descriptor(&[ValueShape::Object, ValueShape::Object]),
            &resolver,
        )
        .unwrap();
        assert_eq!(
            result.fixed,
            [
                AttributeValue::I4(42),
                AttributeValue::Array(vec![
                    AttributeValue::Bool(true),
                    AttributeValue::Bool(false)
                ]),
            ]
        );
    }

    #[test]
    fn test_parse_enum_arguments() {
        let resolver = color_resolver();
        let descriptor = descriptor(&[
            ValueShape::named("Widgets.Color"),
            ValueShape::named("Widgets.Color"),
        ]);

        let blob = [0x01, 0x00, 0x02, 0x07, 0x00, 0x00];
        let result = parse(&blob, &descriptor, &resolver).unwrap();

        let first = result.fixed[0].as_enum().unwrap();
        assert_eq!(first.constant.as_deref(), Some("Green"));
        assert_eq!(first.value, 2);

        let second = result.fixed[1].as_enum().unwrap();
        assert_eq!(second.constant, None);
        assert_eq!(second.value, 7);
        assert_eq!(second.type_name, "Widgets.Color");
    }

    #[test]
    fn test_parse_component_enum() {
        let resolver = TypeResolver::new();
        let descriptor = descriptor(&[ValueShape::named(names::THREADING_MODEL_ENUM)]);

        let blob = [0x01, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00];
        let result = parse(&blob, &descriptor, &resolver).unwrap();

        assert_eq!(
            result.fixed[0].as_enum().and_then(|v| v.constant.as_deref()),
            Some("Free")
        );
    }

    #[test]
    fn test_parse_arrays() {
        let resolver = TypeResolver::new();
        let descriptor = descriptor(&[
            ValueShape::array(ValueShape::Int16),
            ValueShape::array(ValueShape::String),
            ValueShape::array(ValueShape::Int32),
        ]);

        let blob = [
            0x01, 0x00, // Prolog
            0x02, 0x00, 0x00, 0x00, 0x01, 0x00, 0xFF, 0xFF, // short[] { 1, -1 }
            0xFF, 0xFF, 0xFF, 0xFF, // null string[]
            0x00, 0x00, 0x00, 0x00, // int[0]
            0x00, 0x00, // NumNamed
        ];

        let result = parse(&blob, &descriptor, &resolver).unwrap();
        assert_eq!(
            result.fixed,
            [
                AttributeValue::Array(vec![AttributeValue::I2(1), AttributeValue::I2(-1)]),
                AttributeValue::Array(vec![]),
                AttributeValue::Array(vec![]),
            ]
        );
    }

    #[test]
    fn test_parse_invalid_array_lengths() {
        let resolver = TypeResolver::new();
        let descriptor = descriptor(&[ValueShape::array(ValueShape::Byte)]);

        let negative = [0x01, 0x00, 0xFE, 0xFF, 0xFF, 0xFF, 0x00, 0x00];
        assert!(parse(&negative, &descriptor, &resolver).is_err());

        let too_long = [0x01, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00];
        assert!(parse(&too_long, &descriptor, &resolver).is_err());
    }

    #[test]
    fn test_parse_named_arguments() {
        let resolver = TypeResolver::new();

        let blob = [
            0x01, 0x00, // Prolog
            0x02, 0x00, // NumNamed = 2
            // First named argument (field)
            0x53, // Field indicator
            0x08, // I4 type
            0x05, // Name length
            0x56, 0x61, 0x6C, 0x75, 0x65, // "Value"
            0x2A, 0x00, 0x00, 0x00, // I4 value: 42
            // Second named argument (property)
            0x54, // Property indicator
            0x0E, // String type
            0x04, // Name length
            0x4E, 0x61, 0x6D, 0x65, // "Name"
            0x04, // String value length
            0x54, 0x65, 0x73, 0x74, // "Test"
        ];

        let result = parse(&blob, &descriptor(&[]), &resolver).unwrap();
        assert_eq!(
            result.named,
            [
                NamedValue {
                    kind: MemberKind::Field,
                    name: "Value".into(),
                    value: AttributeValue::I4(42)
                },
                NamedValue {
                    kind: MemberKind::Property,
                    name: "Name".into(),
                    value: AttributeValue::String("Test".into())
                },
            ]
        );
    }

    #[test]
    fn test_parse_declared_member_mismatch() {
        let resolver = TypeResolver::new();
        let declared = descriptor(&[]).property("Name", ValueShape::String);

        // Field instead of property
        let wrong_kind = [
            0x01, 0x00, 0x01, 0x00, 0x53, 0x0E, 0x04, 0x4E, 0x61, 0x6D, 0x65, 0x00,
        ];
        assert!(matches!(
            parse(&wrong_kind, &declared, &resolver),
            Err(MalformedAttributeRecord { .. })
        ));

        // I4 instead of string
        let wrong_shape = [
            0x01, 0x00, 0x01, 0x00, 0x54, 0x08, 0x04, 0x4E, 0x61, 0x6D, 0x65, 0x01, 0x00, 0x00,
            0x00,
        ];
        assert!(matches!(
            parse(&wrong_shape, &declared, &resolver),
            Err(MalformedAttributeRecord { .. })
        ));
    }

    #[test]
    fn test_parse_named_enum_argument() {
        let resolver = color_resolver();

        let mut blob = vec![0x01, 0x00, 0x01, 0x00, 0x54, 0x55];
        let type_name = b"Widgets.Color, Widgets, Version=1.0.0.0";
        blob.push(type_name.len() as u8);
        blob.extend_from_slice(type_name);
        blob.extend_from_slice(&[0x04, b'T', b'i', b'n', b't', 0x01]);

        let result = parse(&blob, &descriptor(&[]), &resolver).unwrap();
        let value = result.named_value("Tint").and_then(AttributeValue::as_enum).unwrap();

        assert_eq!(value.type_name, "Widgets.Color");
        assert_eq!(value.constant.as_deref(), Some("Red"));
    }

    #[test]
    fn test_parse_named_unknown_enum() {
        let resolver = TypeResolver::new();

        let mut blob = vec![0x01, 0x00, 0x01, 0x00, 0x54, 0x55];
        let type_name = b"Widgets.Shape";
        blob.push(type_name.len() as u8);
        blob.extend_from_slice(type_name);
        blob.extend_from_slice(&[0x01, b'S', 0x01, 0x00, 0x00, 0x00]);

        assert!(matches!(
            parse(&blob, &descriptor(&[]), &resolver),
            Err(UnknownEnumType(name)) if name == "Widgets.Shape"
        ));
    }

    #[test]
    fn test_parse_invalid_named_argument_tags() {
        let resolver = TypeResolver::new();

        let bad_indicator = [0x01, 0x00, 0x01, 0x00, 0x52, 0x08, 0x01, b'X', 0, 0, 0, 0];
        assert!(parse(&bad_indicator, &descriptor(&[]), &resolver).is_err());

        let bad_type = [0x01, 0x00, 0x01, 0x00, 0x53, 0x99, 0x01, b'X', 0, 0, 0, 0];
        assert!(parse(&bad_type, &descriptor(&[]), &resolver).is_err());
    }

    #[test]
    fn test_parse_trailing_bytes() {
        let resolver = TypeResolver::new();
        let blob = [0x01, 0x00, 0x01, 0x00, 0x00, 0xAA];

        let result = parse(&blob, &descriptor(&[ValueShape::Bool]), &resolver);
        match result {
            Err(MalformedAttributeRecord { message, .. }) => assert!(message.contains("trailing")),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_parse_unsupported_shape() {
        let resolver = TypeResolver::new();
        let blob = [0x01, 0x00, 0x00, 0x00];

        assert!(parse_custom_attribute_blob(
            &blob,
            &descriptor(&[]),
            &[ValueShape::TypedReference],
            &resolver
        )
        .is_err());
    }
}
