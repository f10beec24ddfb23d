//! Custom attribute decoding and encoding for .NET metadata.
//!
//! Custom attributes encode metadata annotations in a compact binary format that includes
//! constructor arguments and named field/property values. Registration data of COM classes
//! (CLSID, ProgID, visibility, server type and threading model) is declared this way.
//!
//! # Custom Attribute Format
//!
//! Custom attributes use a binary encoding with the following structure:
//! - **Prolog** - Standard 0x0001 marker indicating valid custom attribute blob
//! - **Fixed Arguments** - Constructor parameter values in declaration order
//! - **Named Arguments** - Field and property values with name/value pairs
//!
//! Fixed arguments carry no type information. Only attribute types described in an
//! [`AttributeRegistry`] are decoded, using the parameter shapes of their
//! [`AttributeDescriptor`], everything else is skipped.
//!
//! # Key Components
//!
//! - [`AttributeRegistry`] - Supported attribute types, seeded with the base set
//! - [`TypeResolver`] - Maps primitive codes and type references to [`ValueShape`]s
//! - [`parse_custom_attribute_blob`] - Decodes one blob against a descriptor
//! - [`AttributeDecoder`] - Decodes all records of one owner into an [`AttributeCollection`]
//! - [`AttributeEncoder`] - Writes blobs, the inverse of the parser
//!
//! # Examples
//!
//! ```rust
//! use comscope::metadata::customattributes::{
//!     known::names, AttributeDecoder, AttributeRegistry, TypeResolver,
//! };
//!
//! let registry = AttributeRegistry::new();
//! let resolver = TypeResolver::new();
//! let decoder = AttributeDecoder::new(&registry, &resolver);
//!
//! let descriptor = registry.get(names::GUID).unwrap();
//! let mut blob = vec![0x01, 0x00, 0x24];
//! blob.extend_from_slice(b"5b6f0a2e-2d7c-4f7e-9a59-3c8e1a0b6d11");
//! blob.extend_from_slice(&[0x00, 0x00]);
//!
//! let decoded = decoder.decode(descriptor, &blob)?.unwrap();
//! assert_eq!(decoded.fixed_str(0)?, "5b6f0a2e-2d7c-4f7e-9a59-3c8e1a0b6d11");
//! # Ok::<(), comscope::Error>(())
//! ```
//!
//! # References
//!
//! - ECMA-335 6th Edition, Partition II, Section 23.3 - Custom Attributes

pub mod encoder;
pub mod known;

mod collection;
mod decoder;
mod parser;
mod registry;
mod resolver;
mod shape;
mod value;

pub use collection::AttributeCollection;
pub use decoder::{AttributeDecoder, AttributeRecord};
pub use encoder::{encode_custom_attribute, AttributeEncoder};
pub use known::{AssemblyInfoKind, KnownAttribute};
pub use parser::{parse_custom_attribute_blob, CustomAttributeParser};
pub use registry::{AttributeDescriptor, AttributeHook, AttributeRegistry, MemberDescriptor};
pub use resolver::{EnumDescriptor, TypeResolver};
pub use shape::{PrimitiveTypeCode, ValueShape, ELEMENT_TYPE, SERIALIZATION_TYPE, SYSTEM_TYPE};
pub use value::{AttributeValue, DecodedAttribute, EnumValue, MemberKind, NamedValue};
