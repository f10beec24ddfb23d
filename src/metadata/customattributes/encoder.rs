//! Custom attribute blob encoding according to ECMA-335 II.23.3.
//!
//! The inverse of [`crate::metadata::customattributes::parse_custom_attribute_blob`]. Used to
//! build attribute blobs for synthetic modules and fixtures.
//!
//! - [`AttributeEncoder`] - streaming builder, one argument at a time
//! - [`encode_custom_attribute`] - encodes decoded values against an attribute descriptor
//!
//! Null strings and null arrays are not produced, an empty string or array is written with a
//! length of zero.

use crate::{
    file::io::write_compressed_uint,
    metadata::customattributes::{
        registry::AttributeDescriptor,
        resolver::TypeResolver,
        shape::{ValueShape, SERIALIZATION_TYPE, SYSTEM_TYPE},
        value::{AttributeValue, MemberKind, NamedValue},
    },
    Error::{UnknownEnumType, ValueShapeMismatch},
    Result,
};

/// Streaming builder for a custom attribute blob.
///
/// ```rust
/// use comscope::metadata::customattributes::{
///     AttributeEncoder, AttributeValue, MemberKind, TypeResolver, ValueShape,
/// };
///
/// let resolver = TypeResolver::new();
/// let blob = AttributeEncoder::new(&resolver)
///     .fixed(&ValueShape::Bool, &AttributeValue::Bool(true))?
///     .finish();
///
/// assert_eq!(blob, [0x01, 0x00, 0x01, 0x00, 0x00]);
/// # Ok::<(), comscope::Error>(())
/// ```
pub struct AttributeEncoder<'a> {
    resolver: &'a TypeResolver,
    fixed: Vec<u8>,
    named: Vec<u8>,
    num_named: u16,
}

impl<'a> AttributeEncoder<'a> {
    /// Starts a blob with the prolog.
    #[must_use]
    pub fn new(resolver: &'a TypeResolver) -> Self {
        Self {
            resolver,
            fixed: vec![0x01, 0x00],
            named: Vec::new(),
            num_named: 0,
        }
    }

    /// Appends a constructor argument.
    ///
    /// # Errors
    /// Returns [`crate::Error::ValueShapeMismatch`] if `value` does not fit `shape`.
    pub fn fixed(mut self, shape: &ValueShape, value: &AttributeValue) -> Result<Self> {
        write_value(self.resolver, &mut self.fixed, shape, value)?;
        Ok(self)
    }

    /// Appends a named argument.
    ///
    /// # Errors
    /// Returns [`crate::Error::ValueShapeMismatch`] if `value` does not fit `shape`, or if
    /// there are more than 65535 named arguments.
    pub fn named(
        mut self,
        kind: MemberKind,
        name: &str,
        shape: &ValueShape,
        value: &AttributeValue,
    ) -> Result<Self> {
        self.num_named = self
            .num_named
            .checked_add(1)
            .ok_or_else(|| ValueShapeMismatch("too many named arguments".to_string()))?;

        self.named.push(match kind {
            MemberKind::Field => SERIALIZATION_TYPE::FIELD,
            MemberKind::Property => SERIALIZATION_TYPE::PROPERTY,
        });
        write_field_type(&mut self.named, shape)?;
        write_string(&mut self.named, name)?;
        write_value(self.resolver, &mut self.named, shape, value)?;

        Ok(self)
    }

    /// Completes the blob.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        let mut blob = self.fixed;
        blob.extend_from_slice(&self.num_named.to_le_bytes());
        blob.extend_from_slice(&self.named);
        blob
    }
}

/// Encodes constructor arguments and named arguments against a descriptor.
///
/// Declared members are written with their declared shape, other members with the shape
/// inferred from their value.
///
/// # Errors
/// Returns [`crate::Error::ValueShapeMismatch`] if the argument count differs from the
/// descriptor or a value does not fit its shape, and [`crate::Error::UnknownEnumType`] if a
/// shape refers to an enum the resolver does not know.
pub fn encode_custom_attribute(
    descriptor: &AttributeDescriptor,
    fixed: &[AttributeValue],
    named: &[NamedValue],
    resolver: &TypeResolver,
) -> Result<Vec<u8>> {
    if fixed.len() != descriptor.params.len() {
        return Err(ValueShapeMismatch(format!(
            "{} takes {} arguments, got {}",
            descriptor.name,
            descriptor.params.len(),
            fixed.len()
        )));
    }

    let mut encoder = AttributeEncoder::new(resolver);
    for (shape, value) in descriptor.params.iter().zip(fixed) {
        let shape = resolver
            .resolve_shape(shape)
            .ok_or_else(|| UnknownEnumType(shape.to_string()))?;
        encoder = encoder.fixed(&shape, value)?;
    }

    for argument in named {
        let shape = match descriptor.member(&argument.name) {
            Some(member) => resolver
                .resolve_shape(&member.shape)
                .ok_or_else(|| UnknownEnumType(member.shape.to_string()))?,
            None => infer_shape(resolver, &argument.value)?,
        };
        encoder = encoder.named(argument.kind, &argument.name, &shape, &argument.value)?;
    }

    Ok(encoder.finish())
}

/// Derives the shape of a value for tagged positions.
///
/// Arrays take the shape of their first element, empty arrays become `object[]`.
pub(crate) fn infer_shape(resolver: &TypeResolver, value: &AttributeValue) -> Result<ValueShape> {
    Ok(match value {
        AttributeValue::Bool(_) => ValueShape::Bool,
        AttributeValue::Char(_) => ValueShape::Char,
        AttributeValue::I1(_) => ValueShape::SByte,
        AttributeValue::U1(_) => ValueShape::Byte,
        AttributeValue::I2(_) => ValueShape::Int16,
        AttributeValue::U2(_) => ValueShape::UInt16,
        AttributeValue::I4(_) => ValueShape::Int32,
        AttributeValue::U4(_) => ValueShape::UInt32,
        AttributeValue::I8(_) => ValueShape::Int64,
        AttributeValue::U8(_) => ValueShape::UInt64,
        AttributeValue::R4(_) => ValueShape::Single,
        AttributeValue::R8(_) => ValueShape::Double,
        AttributeValue::String(_) => ValueShape::String,
        AttributeValue::Type(_) => ValueShape::named(SYSTEM_TYPE),
        AttributeValue::Enum(value) => {
            let underlying = resolver
                .enum_descriptor(&value.type_name)
                .map(|descriptor| descriptor.underlying.clone())
                .ok_or_else(|| UnknownEnumType(value.type_name.clone()))?;
            ValueShape::enumeration(value.type_name.clone(), underlying)
        }
        AttributeValue::Array(elements) => match elements.first() {
            Some(first) => ValueShape::array(infer_shape(resolver, first)?),
            None => ValueShape::array(ValueShape::Object),
        },
        AttributeValue::I(_) | AttributeValue::U(_) => {
            return Err(ValueShapeMismatch(format!(
                "{value} has no serialization type"
            )))
        }
    })
}

/// Writes the `FieldOrPropType` of a named argument or boxed value.
fn write_field_type(out: &mut Vec<u8>, shape: &ValueShape) -> Result<()> {
    match shape {
        ValueShape::Array(element) => {
            out.push(SERIALIZATION_TYPE::SZARRAY);
            write_field_type(out, element)
        }
        ValueShape::Enum { name, .. } => {
            out.push(SERIALIZATION_TYPE::ENUM);
            write_string(out, name)
        }
        _ => {
            let tag = shape.serialization_tag().ok_or_else(|| {
                ValueShapeMismatch(format!("{shape} has no serialization type"))
            })?;
            out.push(tag);
            Ok(())
        }
    }
}

fn write_string(out: &mut Vec<u8>, value: &str) -> Result<()> {
    let length = u32::try_from(value.len())
        .map_err(|_| ValueShapeMismatch(format!("string of {} bytes", value.len())))?;
    write_compressed_uint(out, length)?;
    out.extend_from_slice(value.as_bytes());
    Ok(())
}

fn write_value(
    resolver: &TypeResolver,
    out: &mut Vec<u8>,
    shape: &ValueShape,
    value: &AttributeValue,
) -> Result<()> {
    match (shape, value) {
        (ValueShape::Bool, AttributeValue::Bool(v)) => out.push(u8::from(*v)),
        (ValueShape::Char, AttributeValue::Char(v)) => {
            let unit = u16::try_from(u32::from(*v)).map_err(|_| {
                ValueShapeMismatch(format!("char {v:?} is outside the basic plane"))
            })?;
            out.extend_from_slice(&unit.to_le_bytes());
        }
        (ValueShape::SByte, AttributeValue::I1(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (ValueShape::Byte, AttributeValue::U1(v)) => out.push(*v),
        (ValueShape::Int16, AttributeValue::I2(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (ValueShape::UInt16, AttributeValue::U2(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (ValueShape::Int32, AttributeValue::I4(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (ValueShape::UInt32, AttributeValue::U4(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (ValueShape::Int64, AttributeValue::I8(v)) | (ValueShape::IntPtr, AttributeValue::I(v)) => {
            out.extend_from_slice(&v.to_le_bytes());
        }
        (ValueShape::UInt64, AttributeValue::U8(v))
        | (ValueShape::UIntPtr, AttributeValue::U(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (ValueShape::Single, AttributeValue::R4(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (ValueShape::Double, AttributeValue::R8(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (ValueShape::String, AttributeValue::String(v)) => write_string(out, v)?,
        (ValueShape::Named(name), AttributeValue::Type(v)) if name == SYSTEM_TYPE => {
            write_string(out, v)?;
        }
        (ValueShape::Enum { name, underlying }, AttributeValue::Enum(v)) if *name == v.type_name => {
            write_enum_underlying(out, underlying, v.value)?;
        }
        (ValueShape::Array(element), AttributeValue::Array(elements)) => {
            let length = i32::try_from(elements.len())
                .map_err(|_| ValueShapeMismatch(format!("array of {} elements", elements.len())))?;
            out.extend_from_slice(&length.to_le_bytes());
            for item in elements {
                write_value(resolver, out, element, item)?;
            }
        }
        (ValueShape::Object, _) => {
            let inner = infer_shape(resolver, value)?;
            write_field_type(out, &inner)?;
            write_value(resolver, out, &inner, value)?;
        }
        _ => {
            return Err(ValueShapeMismatch(format!(
                "{value} does not fit {shape}"
            )))
        }
    }

    Ok(())
}

fn write_enum_underlying(out: &mut Vec<u8>, underlying: &ValueShape, value: i64) -> Result<()> {
    let out_of_range = |_| ValueShapeMismatch(format!("{value} does not fit {underlying}"));

    match underlying {
        ValueShape::Byte => out.push(u8::try_from(value).map_err(out_of_range)?),
        ValueShape::SByte => out.extend_from_slice(&i8::try_from(value).map_err(out_of_range)?.to_le_bytes()),
        ValueShape::Int16 => out.extend_from_slice(&i16::try_from(value).map_err(out_of_range)?.to_le_bytes()),
        ValueShape::UInt16 => out.extend_from_slice(&u16::try_from(value).map_err(out_of_range)?.to_le_bytes()),
        ValueShape::Int32 => out.extend_from_slice(&i32::try_from(value).map_err(out_of_range)?.to_le_bytes()),
        ValueShape::UInt32 => out.extend_from_slice(&u32::try_from(value).map_err(out_of_range)?.to_le_bytes()),
        ValueShape::Int64 | ValueShape::UInt64 => out.extend_from_slice(&value.to_le_bytes()),
        _ => {
            return Err(ValueShapeMismatch(format!(
                "enum can not be based on {underlying}"
            )))
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::customattributes::{
        known::names, parser::parse_custom_attribute_blob, resolver::EnumDescriptor,
        value::EnumValue,
    };

    #[test]
    fn encodes_target_framework() {
        let resolver = TypeResolver::new();
        let descriptor = crate::metadata::customattributes::AttributeRegistry::new()
            .get(names::TARGET_FRAMEWORK)
            .cloned()
            .unwrap();

        let blob = encode_custom_attribute(
            &descriptor,
            &[AttributeValue::String(".NETCoreApp,Version=v3.1".into())],
            &[NamedValue {
                kind: MemberKind::Property,
                name: "FrameworkDisplayName".into(),
                value: AttributeValue::String(String::new()),
            }],
            &resolver,
        )
        .unwrap();

        let mut expected = vec![0x01, 0x00, 0x18];
        expected.extend_from_slice(b".NETCoreApp,Version=v3.1");
        expected.extend_from_slice(&[0x01, 0x00, 0x54, 0x0E, 0x14]);
        expected.extend_from_slice(b"FrameworkDisplayName");
        expected.push(0x00);

        assert_eq!(blob, expected);
    }

    #[test]
    fn encoded_values_decode_back() {
        let mut resolver = TypeResolver::new();
        resolver.register_enum(
            EnumDescriptor::new("Widgets.Color", ValueShape::Int16)
                .unwrap()
                .with_constant("Blue", -3),
        );

        let descriptor = AttributeDescriptor::new("Widgets.PaletteAttribute")
            .param(ValueShape::named("Widgets.Color"))
            .param(ValueShape::Object)
            .param(ValueShape::array(ValueShape::named(SYSTEM_TYPE)))
            .field("Weight", ValueShape::Double);

        let fixed = vec![
            AttributeValue::Enum(resolver.enum_value("Widgets.Color", -3)),
            AttributeValue::Array(vec![AttributeValue::U4(7), AttributeValue::U4(9)]),
            AttributeValue::Array(vec![AttributeValue::Type("System.Int32".into())]),
        ];
        let named = vec![
            NamedValue {
                kind: MemberKind::Field,
                name: "Weight".into(),
                value: AttributeValue::R8(0.5),
            },
            NamedValue {
                kind: MemberKind::Property,
                name: "Shade".into(),
                value: AttributeValue::Enum(EnumValue {
                    type_name: "Widgets.Color".into(),
                    value: 11,
                    constant: None,
                }),
            },
        ];

        let blob = encode_custom_attribute(&descriptor, &fixed, &named, &resolver).unwrap();

        let params: Vec<_> = descriptor
            .params
            .iter()
            .map(|shape| resolver.resolve_shape(shape).unwrap())
            .collect();
        let decoded = parse_custom_attribute_blob(&blob, &descriptor, &params, &resolver).unwrap();

        assert_eq!(decoded.fixed, fixed);
        assert_eq!(decoded.named, named);
    }

    #[test]
    fn rejects_values_that_do_not_fit() {
        let resolver = TypeResolver::new();

        assert!(matches!(
            AttributeEncoder::new(&resolver).fixed(&ValueShape::Bool, &AttributeValue::I4(1)),
            Err(ValueShapeMismatch(_))
        ));
        assert!(AttributeEncoder::new(&resolver)
            .fixed(&ValueShape::Char, &AttributeValue::Char('\u{1F600}'))
            .is_err());
        assert!(AttributeEncoder::new(&resolver)
            .fixed(
                &ValueShape::enumeration("Widgets.Small", ValueShape::Byte),
                &AttributeValue::Enum(EnumValue {
                    type_name: "Widgets.Small".into(),
                    value: 300,
                    constant: None
                })
            )
            .is_err());
    }

    #[test]
    fn rejects_wrong_argument_count() {
        let resolver = TypeResolver::new();
        let descriptor = AttributeDescriptor::new(names::COM_VISIBLE).param(ValueShape::Bool);

        assert!(matches!(
            encode_custom_attribute(&descriptor, &[], &[], &resolver),
            Err(ValueShapeMismatch(_))
        ));
    }

    #[test]
    fn unknown_enum_in_object_position() {
        let resolver = TypeResolver::new();
        let value = AttributeValue::Enum(EnumValue {
            type_name: "Widgets.Shape".into(),
            value: 1,
            constant: None,
        });

        assert!(matches!(
            AttributeEncoder::new(&resolver).fixed(&ValueShape::Object, &value),
            Err(UnknownEnumType(name)) if name == "Widgets.Shape"
        ));
    }
}
