//! Decoded attributes of one scope, grouped by attribute type.

use crate::{
    metadata::customattributes::{
        known::{self, names, KnownAttribute},
        value::DecodedAttribute,
    },
    registration::{ServerType, ThreadingModel},
    Error::MultipleInstances,
    Result,
};

/// Decoded attributes of an assembly or a type.
///
/// Groups keep the order in which their attribute type first appeared, instances keep
/// metadata order within their group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeCollection {
    groups: Vec<(String, Vec<DecodedAttribute>)>,
}

impl AttributeCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a decoded attribute to the group of its type.
    pub fn add(&mut self, attribute: DecodedAttribute) {
        match self
            .groups
            .iter_mut()
            .find(|(name, _)| *name == attribute.type_name)
        {
            Some((_, instances)) => instances.push(attribute),
            None => self
                .groups
                .push((attribute.type_name.clone(), vec![attribute])),
        }
    }

    /// Returns all instances of an attribute type, empty if there are none.
    #[must_use]
    pub fn get(&self, type_name: &str) -> &[DecodedAttribute] {
        self.groups
            .iter()
            .find(|(name, _)| name == type_name)
            .map_or(&[], |(_, instances)| instances.as_slice())
    }

    /// Returns the only instance of an attribute type.
    ///
    /// # Errors
    /// Returns [`crate::Error::MultipleInstances`] if the type was applied more than once.
    pub fn get_single(&self, type_name: &str) -> Result<Option<&DecodedAttribute>> {
        match self.get(type_name) {
            [] => Ok(None),
            [single] => Ok(Some(single)),
            _ => Err(MultipleInstances(type_name.to_string())),
        }
    }

    /// Returns `true` if at least one instance of the attribute type is present.
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        !self.get(type_name).is_empty()
    }

    /// Returns the number of decoded attribute instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.iter().map(|(_, instances)| instances.len()).sum()
    }

    /// Returns `true` if nothing was decoded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterates all instances, group by group.
    pub fn iter(&self) -> impl Iterator<Item = &DecodedAttribute> {
        self.groups.iter().flat_map(|(_, instances)| instances.iter())
    }

    /// Iterates the attribute type names in first-seen order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(name, _)| name.as_str())
    }

    /// `ComVisible` flag, `None` if the attribute is absent.
    ///
    /// # Errors
    /// Returns an error if the attribute was applied more than once or is malformed.
    pub fn com_visible(&self) -> Result<Option<bool>> {
        self.typed(names::COM_VISIBLE, known::com_visible, |known| match known {
            KnownAttribute::ComVisible(visible) => Some(*visible),
            _ => None,
        })
    }

    /// `Guid` string, unvalidated, `None` if the attribute is absent.
    ///
    /// # Errors
    /// Returns an error if the attribute was applied more than once or is malformed.
    pub fn guid(&self) -> Result<Option<String>> {
        self.typed(names::GUID, known::guid, |known| match known {
            KnownAttribute::Guid(guid) => Some(guid.clone()),
            _ => None,
        })
    }

    /// `ProgId` string, `None` if the attribute is absent.
    ///
    /// # Errors
    /// Returns an error if the attribute was applied more than once or is malformed.
    pub fn prog_id(&self) -> Result<Option<String>> {
        self.typed(names::PROG_ID, known::prog_id, |known| match known {
            KnownAttribute::ProgId(prog_id) => Some(prog_id.clone()),
            _ => None,
        })
    }

    /// Declared server type, `None` if the attribute is absent or its value has no name.
    ///
    /// An explicitly declared `Undefined` is returned as is.
    ///
    /// # Errors
    /// Returns an error if the attribute was applied more than once or is malformed.
    pub fn server_type(&self) -> Result<Option<ServerType>> {
        let declared = self.typed(
            names::COMPONENT_SERVER_TYPE,
            known::component_server_type,
            |known| match known {
                KnownAttribute::ComponentServerType(server_type) => Some(*server_type),
                _ => None,
            },
        )?;

        Ok(declared.flatten())
    }

    /// Declared threading model, `None` if the attribute is absent or its value has no name.
    ///
    /// An explicitly declared `Undefined` is returned as is.
    ///
    /// # Errors
    /// Returns an error if the attribute was applied more than once or is malformed.
    pub fn threading_model(&self) -> Result<Option<ThreadingModel>> {
        let declared = self.typed(
            names::COMPONENT_THREADING_MODEL,
            known::component_threading_model,
            |known| match known {
                KnownAttribute::ComponentThreadingModel(model) => Some(*model),
                _ => None,
            },
        )?;

        Ok(declared.flatten())
    }

    /// Target framework name and display name, `None` if the attribute is absent.
    ///
    /// # Errors
    /// Returns an error if the attribute was applied more than once or is malformed.
    pub fn target_framework(&self) -> Result<Option<(String, Option<String>)>> {
        self.typed(names::TARGET_FRAMEWORK, known::target_framework, |known| {
            match known {
                KnownAttribute::TargetFramework {
                    framework_name,
                    display_name,
                } => Some((framework_name.clone(), display_name.clone())),
                _ => None,
            }
        })
    }

    /// Projects the typed view of a single-instance attribute.
    ///
    /// Uses the view stored by the decoder, or builds it with `hook` if there is none.
    fn typed<T>(
        &self,
        type_name: &str,
        hook: fn(&DecodedAttribute) -> Result<KnownAttribute>,
        project: impl Fn(&KnownAttribute) -> Option<T>,
    ) -> Result<Option<T>> {
        let Some(attribute) = self.get_single(type_name)? else {
            return Ok(None);
        };

        let built;
        let known = match &attribute.known {
            Some(known) => known,
            None => {
                built = hook(attribute)?;
                &built
            }
        };

        project(known)
            .map(Some)
            .ok_or_else(|| attribute.malformed(format!("unexpected typed view {known:?}")))
    }
}

impl<'a> IntoIterator for &'a AttributeCollection {
    type Item = &'a DecodedAttribute;
    type IntoIter = Box<dyn Iterator<Item = &'a DecodedAttribute> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
