//! The table of supported attribute kinds.
//!
//! Only attributes whose type is registered here are decoded, everything else is skipped.
//! The table is seeded with [`crate::metadata::customattributes::known::base_descriptors`]
//! and can be extended before it is handed to a reader.

use std::collections::HashMap;

use crate::{
    metadata::customattributes::{
        known::{base_descriptors, KnownAttribute},
        shape::ValueShape,
        value::{DecodedAttribute, MemberKind},
    },
    Error::DuplicateAttribute,
    Result,
};

/// Builds the typed view of a decoded attribute.
pub type AttributeHook = fn(&DecodedAttribute) -> Result<KnownAttribute>;

/// A settable field or property of an attribute type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDescriptor {
    /// Member name
    pub name: String,
    /// Field or property
    pub kind: MemberKind,
    /// Declared shape
    pub shape: ValueShape,
}

/// Description of a supported attribute type.
///
/// ```rust
/// use comscope::metadata::customattributes::{AttributeDescriptor, ValueShape};
///
/// let descriptor = AttributeDescriptor::new("Widgets.ColorAttribute")
///     .param(ValueShape::named("Widgets.Color"))
///     .field("Alpha", ValueShape::Byte);
///
/// assert_eq!(descriptor.params.len(), 1);
/// assert!(descriptor.member("Alpha").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct AttributeDescriptor {
    /// Fully-qualified attribute type name
    pub name: String,
    /// Constructor parameter shapes, in declaration order
    pub params: Vec<ValueShape>,
    /// Settable members
    pub members: Vec<MemberDescriptor>,
    /// Optional typed constructor
    pub hook: Option<AttributeHook>,
}

impl AttributeDescriptor {
    /// Creates a descriptor for a parameterless attribute without members.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            members: Vec::new(),
            hook: None,
        }
    }

    /// Appends a constructor parameter.
    #[must_use]
    pub fn param(mut self, shape: ValueShape) -> Self {
        self.params.push(shape);
        self
    }

    /// Declares a settable field.
    #[must_use]
    pub fn field(self, name: impl Into<String>, shape: ValueShape) -> Self {
        self.with_member(name, MemberKind::Field, shape)
    }

    /// Declares a settable property.
    #[must_use]
    pub fn property(self, name: impl Into<String>, shape: ValueShape) -> Self {
        self.with_member(name, MemberKind::Property, shape)
    }

    /// Sets the typed constructor.
    #[must_use]
    pub fn hook(mut self, hook: AttributeHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Looks up a declared member by name.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|member| member.name == name)
    }

    fn with_member(mut self, name: impl Into<String>, kind: MemberKind, shape: ValueShape) -> Self {
        self.members.push(MemberDescriptor {
            name: name.into(),
            kind,
            shape,
        });
        self
    }
}

/// Maps fully-qualified attribute type names to their descriptors.
#[derive(Debug, Clone)]
pub struct AttributeRegistry {
    descriptors: HashMap<String, AttributeDescriptor>,
}

impl AttributeRegistry {
    /// Creates a registry holding the base set.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for descriptor in base_descriptors() {
            registry
                .descriptors
                .insert(descriptor.name.clone(), descriptor);
        }
        registry
    }

    /// Creates a registry without any descriptors.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            descriptors: HashMap::new(),
        }
    }

    /// Adds a descriptor.
    ///
    /// # Errors
    /// Returns [`crate::Error::DuplicateAttribute`] if the name is already registered.
    pub fn register(&mut self, descriptor: AttributeDescriptor) -> Result<()> {
        if self.descriptors.contains_key(&descriptor.name) {
            return Err(DuplicateAttribute(descriptor.name));
        }

        self.descriptors.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Looks up the descriptor of an attribute type.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.descriptors.get(name)
    }

    /// Returns `true` if the attribute type is supported.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    /// Returns the number of supported attribute types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` if no attribute type is supported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Iterates the registered descriptors in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &AttributeDescriptor> {
        self.descriptors.values()
    }
}

impl Default for AttributeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::customattributes::known::names;

    #[test]
    fn base_set() {
        let registry = AttributeRegistry::new();

        assert_eq!(registry.len(), 17);
        assert!(registry.contains(names::COM_VISIBLE));
        assert!(registry.contains("System.Reflection.AssemblyTrademarkAttribute"));
        assert!(!registry.contains("System.ObsoleteAttribute"));

        let framework = registry.get(names::TARGET_FRAMEWORK).unwrap();
        assert_eq!(framework.params, [ValueShape::String]);
        assert_eq!(
            framework.member("FrameworkDisplayName").map(|m| m.kind),
            Some(MemberKind::Property)
        );
        assert!(framework.hook.is_some());
    }

    #[test]
    fn duplicate_registration() {
        let mut registry = AttributeRegistry::new();

        let result = registry.register(AttributeDescriptor::new(names::GUID));
        assert!(matches!(result, Err(DuplicateAttribute(name)) if name == names::GUID));

        registry
            .register(AttributeDescriptor::new("System.ObsoleteAttribute").param(ValueShape::String))
            .unwrap();
        assert_eq!(registry.len(), 18);
    }

    #[test]
    fn empty_registry() {
        let registry = AttributeRegistry::empty();

        assert!(registry.is_empty());
        assert!(registry.get(names::COM_VISIBLE).is_none());
    }
}
