//! Decoding of all attribute records attached to one owner.

use log::debug;

use crate::{
    metadata::{
        access::ModuleMetadata,
        customattributes::{
            collection::AttributeCollection, parser::parse_custom_attribute_blob,
            registry::{AttributeDescriptor, AttributeRegistry},
            resolver::TypeResolver,
            value::DecodedAttribute,
        },
        token::Token,
    },
    Error::UnknownEnumType,
    Result,
};

/// A row of the `CustomAttribute` table, with its value blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRecord {
    /// Token of the attribute row itself
    pub token: Token,
    /// Token of the assembly or type the attribute is applied to
    pub owner: Token,
    /// `MethodDef` or `MemberRef` token of the attribute constructor
    pub constructor: Token,
    /// Raw attribute blob
    pub value: Vec<u8>,
}

impl AttributeRecord {
    /// Creates a record.
    #[must_use]
    pub fn new(token: Token, owner: Token, constructor: Token, value: Vec<u8>) -> Self {
        Self {
            token,
            owner,
            constructor,
            value,
        }
    }
}

/// Turns attribute records into an [`AttributeCollection`].
///
/// Records of attribute types the registry does not know, or whose arguments refer to types
/// the resolver does not know, are skipped.
pub struct AttributeDecoder<'a> {
    registry: &'a AttributeRegistry,
    resolver: &'a TypeResolver,
}

impl<'a> AttributeDecoder<'a> {
    /// Creates a decoder over a registry and resolver.
    #[must_use]
    pub fn new(registry: &'a AttributeRegistry, resolver: &'a TypeResolver) -> Self {
        Self { registry, resolver }
    }

    /// Decodes the records applied to `owner`, ignoring all others.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedAttributeRecord`] if a supported attribute has a
    /// malformed blob or its hook rejects it, and any error of
    /// [`ModuleMetadata::constructor_type`].
    pub fn decode_scope(
        &self,
        module: &dyn ModuleMetadata,
        owner: Token,
        records: &[AttributeRecord],
    ) -> Result<AttributeCollection> {
        let mut collection = AttributeCollection::new();

        for record in records.iter().filter(|record| record.owner == owner) {
            let attribute_type = module.constructor_type(record.constructor)?.full_name();
            let Some(descriptor) = self.registry.get(&attribute_type) else {
                debug!(
                    "Skipping unsupported attribute {} on {}",
                    attribute_type, owner
                );
                continue;
            };

            if let Some(attribute) = self.decode(descriptor, &record.value)? {
                collection.add(attribute);
            }
        }

        Ok(collection)
    }

    /// Decodes a single blob against a descriptor and attaches its typed view.
    ///
    /// Returns `Ok(None)` if the attribute refers to types the resolver does not know.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedAttributeRecord`] if the blob is malformed or the
    /// hook rejects it.
    pub fn decode(
        &self,
        descriptor: &AttributeDescriptor,
        blob: &[u8],
    ) -> Result<Option<DecodedAttribute>> {
        let mut params = Vec::with_capacity(descriptor.params.len());
        for shape in &descriptor.params {
            match self.resolver.resolve_shape(shape) {
                Some(resolved) => params.push(resolved),
                None => {
                    debug!(
                        "Skipping {}: parameter type {} is unknown",
                        descriptor.name, shape
                    );
                    return Ok(None);
                }
            }
        }

        let mut attribute =
            match parse_custom_attribute_blob(blob, descriptor, &params, self.resolver) {
                Ok(attribute) => attribute,
                Err(UnknownEnumType(name)) => {
                    debug!("Skipping {}: enum {} is unknown", descriptor.name, name);
                    return Ok(None);
                }
                Err(error) => return Err(error),
            };

        if let Some(hook) = descriptor.hook {
            attribute.known = Some(hook(&attribute)?);
        }

        Ok(Some(attribute))
    }
}
