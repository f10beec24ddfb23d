//! The base set of supported attributes and their typed views.
//!
//! Every attribute of the base set has a descriptor (see [`base_descriptors`]) and a hook
//! that turns the decoded attribute into a [`KnownAttribute`]. Caller-registered attributes
//! may reuse the hooks or bring their own.

use strum::{Display, EnumIter, IntoEnumIterator};

use crate::{
    metadata::customattributes::{
        registry::AttributeDescriptor,
        shape::ValueShape,
        value::{AttributeValue, DecodedAttribute},
    },
    registration::{ServerType, ThreadingModel},
    Result,
};

/// Namespace in which managed COM servers declare the component attributes
pub const COMPONENT_MODEL_NAMESPACE: &str = "DarkCreekWay.OSI.Microsoft.Windows.ComponentObjectModel";

/// Fully-qualified names of the supported attributes and enums
#[allow(missing_docs)]
pub mod names {
    pub const COMPILATION_RELAXATIONS: &str =
        "System.Runtime.CompilerServices.CompilationRelaxationsAttribute";
    pub const RUNTIME_COMPATIBILITY: &str =
        "System.Runtime.CompilerServices.RuntimeCompatibilityAttribute";
    pub const COM_VISIBLE: &str = "System.Runtime.InteropServices.ComVisibleAttribute";
    pub const GUID: &str = "System.Runtime.InteropServices.GuidAttribute";
    pub const PROG_ID: &str = "System.Runtime.InteropServices.ProgIdAttribute";
    pub const TARGET_FRAMEWORK: &str = "System.Runtime.Versioning.TargetFrameworkAttribute";
    pub const COMPONENT_SERVER_TYPE: &str =
        "DarkCreekWay.OSI.Microsoft.Windows.ComponentObjectModel.ComponentServerTypeAttribute";
    pub const COMPONENT_THREADING_MODEL: &str =
        "DarkCreekWay.OSI.Microsoft.Windows.ComponentObjectModel.ComponentThreadingModelAttribute";
    pub const SERVER_TYPE_ENUM: &str =
        "DarkCreekWay.OSI.Microsoft.Windows.ComponentObjectModel.ComponentServerType";
    pub const THREADING_MODEL_ENUM: &str =
        "DarkCreekWay.OSI.Microsoft.Windows.ComponentObjectModel.ComponentThreadingModel";
}

/// The `System.Reflection.Assembly*Attribute` family, which all carry a single string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[allow(missing_docs)]
pub enum AssemblyInfoKind {
    Configuration,
    Copyright,
    Company,
    Description,
    FileVersion,
    InformationalVersion,
    Product,
    Title,
    Trademark,
}

impl AssemblyInfoKind {
    /// Returns the full attribute type name, e.g. `System.Reflection.AssemblyTitleAttribute`.
    #[must_use]
    pub fn attribute_name(self) -> String {
        format!("System.Reflection.Assembly{self}Attribute")
    }

    /// Maps a full attribute type name back to its kind.
    #[must_use]
    pub fn from_attribute_name(name: &str) -> Option<Self> {
        let kind = name
            .strip_prefix("System.Reflection.Assembly")?
            .strip_suffix("Attribute")?;

        Self::iter().find(|candidate| candidate.to_string() == kind)
    }
}

/// Typed view over a decoded attribute of the base set.
#[derive(Debug, Clone, PartialEq)]
pub enum KnownAttribute {
    /// One of the `System.Reflection.Assembly*Attribute` strings
    AssemblyInfo {
        /// Which attribute of the family
        kind: AssemblyInfoKind,
        /// The declared string
        value: String,
    },
    /// `CompilationRelaxationsAttribute(int)`
    CompilationRelaxations(i32),
    /// `RuntimeCompatibilityAttribute`
    RuntimeCompatibility {
        /// `WrapNonExceptionThrows`, `None` if the property was not set
        wrap_non_exception_throws: Option<bool>,
    },
    /// `ComVisibleAttribute(bool)`
    ComVisible(bool),
    /// `GuidAttribute(string)`, not validated
    Guid(String),
    /// `ProgIdAttribute(string)`
    ProgId(String),
    /// `TargetFrameworkAttribute(string)`
    TargetFramework {
        /// Framework name, e.g. `.NETCoreApp,Version=v3.1`
        framework_name: String,
        /// `FrameworkDisplayName`, `None` if the property was not set
        display_name: Option<String>,
    },
    /// `ComponentServerTypeAttribute`, `None` for unnamed values
    ComponentServerType(Option<ServerType>),
    /// `ComponentThreadingModelAttribute`, `None` for unnamed values
    ComponentThreadingModel(Option<ThreadingModel>),
}

/// Hook for the `System.Reflection.Assembly*Attribute` family.
///
/// # Errors
/// Returns [`crate::Error::MalformedAttributeRecord`] if the attribute is not part of the
/// family or has no string argument.
pub fn assembly_info(attribute: &DecodedAttribute) -> Result<KnownAttribute> {
    let kind = AssemblyInfoKind::from_attribute_name(&attribute.type_name)
        .ok_or_else(|| attribute.malformed("not an assembly info attribute".to_string()))?;

    Ok(KnownAttribute::AssemblyInfo {
        kind,
        value: attribute.fixed_str(0)?.to_string(),
    })
}

/// Hook for `CompilationRelaxationsAttribute`.
///
/// # Errors
/// Returns [`crate::Error::MalformedAttributeRecord`] if the argument is not an `int`.
pub fn compilation_relaxations(attribute: &DecodedAttribute) -> Result<KnownAttribute> {
    let value = attribute.fixed_arg(0)?;
    let relaxations = value
        .as_i32()
        .ok_or_else(|| attribute.malformed(format!("argument 0 is not an int32: {value}")))?;

    Ok(KnownAttribute::CompilationRelaxations(relaxations))
}

/// Hook for `RuntimeCompatibilityAttribute`.
///
/// # Errors
/// Returns [`crate::Error::MalformedAttributeRecord`] if `WrapNonExceptionThrows` is set to a
/// non-boolean.
pub fn runtime_compatibility(attribute: &DecodedAttribute) -> Result<KnownAttribute> {
    let wrap_non_exception_throws = match attribute.named_value("WrapNonExceptionThrows") {
        Some(AttributeValue::Bool(wrap)) => Some(*wrap),
        Some(other) => {
            return Err(attribute.malformed(format!(
                "WrapNonExceptionThrows is not a boolean: {other}"
            )))
        }
        None => None,
    };

    Ok(KnownAttribute::RuntimeCompatibility {
        wrap_non_exception_throws,
    })
}

/// Hook for `ComVisibleAttribute`.
///
/// # Errors
/// Returns [`crate::Error::MalformedAttributeRecord`] if the argument is not a boolean.
pub fn com_visible(attribute: &DecodedAttribute) -> Result<KnownAttribute> {
    Ok(KnownAttribute::ComVisible(attribute.fixed_bool(0)?))
}

/// Hook for `GuidAttribute`.
///
/// # Errors
/// Returns [`crate::Error::MalformedAttributeRecord`] if the argument is not a string.
pub fn guid(attribute: &DecodedAttribute) -> Result<KnownAttribute> {
    Ok(KnownAttribute::Guid(attribute.fixed_str(0)?.to_string()))
}

/// Hook for `ProgIdAttribute`.
///
/// # Errors
/// Returns [`crate::Error::MalformedAttributeRecord`] if the argument is not a string.
pub fn prog_id(attribute: &DecodedAttribute) -> Result<KnownAttribute> {
    Ok(KnownAttribute::ProgId(attribute.fixed_str(0)?.to_string()))
}

/// Hook for `TargetFrameworkAttribute`.
///
/// # Errors
/// Returns [`crate::Error::MalformedAttributeRecord`] if the argument is not a string.
pub fn target_framework(attribute: &DecodedAttribute) -> Result<KnownAttribute> {
    let display_name = attribute
        .named_value("FrameworkDisplayName")
        .and_then(AttributeValue::as_str)
        .map(str::to_string);

    Ok(KnownAttribute::TargetFramework {
        framework_name: attribute.fixed_str(0)?.to_string(),
        display_name,
    })
}

/// Hook for `ComponentServerTypeAttribute`.
///
/// # Errors
/// Returns [`crate::Error::MalformedAttributeRecord`] if the argument is not an enum value.
pub fn component_server_type(attribute: &DecodedAttribute) -> Result<KnownAttribute> {
    let value = attribute.fixed_enum(0)?;
    let server_type = value
        .constant
        .as_ref()
        .and_then(|_| ServerType::from_value(value.value));

    Ok(KnownAttribute::ComponentServerType(server_type))
}

/// Hook for `ComponentThreadingModelAttribute`.
///
/// # Errors
/// Returns [`crate::Error::MalformedAttributeRecord`] if the argument is not an enum value.
pub fn component_threading_model(attribute: &DecodedAttribute) -> Result<KnownAttribute> {
    let value = attribute.fixed_enum(0)?;
    let threading_model = value
        .constant
        .as_ref()
        .and_then(|_| ThreadingModel::from_value(value.value));

    Ok(KnownAttribute::ComponentThreadingModel(threading_model))
}

/// Descriptors of the base set, in registration order.
#[must_use]
pub fn base_descriptors() -> Vec<AttributeDescriptor> {
    let mut descriptors: Vec<AttributeDescriptor> = AssemblyInfoKind::iter()
        .map(|kind| {
            AttributeDescriptor::new(kind.attribute_name())
                .param(ValueShape::String)
                .hook(assembly_info)
        })
        .collect();

    descriptors.extend([
        AttributeDescriptor::new(names::COMPILATION_RELAXATIONS)
            .param(ValueShape::Int32)
            .hook(compilation_relaxations),
        AttributeDescriptor::new(names::RUNTIME_COMPATIBILITY)
            .property("WrapNonExceptionThrows", ValueShape::Bool)
            .hook(runtime_compatibility),
        AttributeDescriptor::new(names::COM_VISIBLE)
            .param(ValueShape::Bool)
            .hook(com_visible),
        AttributeDescriptor::new(names::GUID)
            .param(ValueShape::String)
            .hook(guid),
        AttributeDescriptor::new(names::PROG_ID)
            .param(ValueShape::String)
            .hook(prog_id),
        AttributeDescriptor::new(names::TARGET_FRAMEWORK)
            .param(ValueShape::String)
            .property("FrameworkDisplayName", ValueShape::String)
            .hook(target_framework),
        AttributeDescriptor::new(names::COMPONENT_SERVER_TYPE)
            .param(ValueShape::named(names::SERVER_TYPE_ENUM))
            .hook(component_server_type),
        AttributeDescriptor::new(names::COMPONENT_THREADING_MODEL)
            .param(ValueShape::named(names::THREADING_MODEL_ENUM))
            .hook(component_threading_model),
    ]);

    descriptors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::customattributes::value::EnumValue;

    #[test]
    fn assembly_info_names() {
        assert_eq!(
            AssemblyInfoKind::InformationalVersion.attribute_name(),
            "System.Reflection.AssemblyInformationalVersionAttribute"
        );
        assert_eq!(
            AssemblyInfoKind::from_attribute_name("System.Reflection.AssemblyTitleAttribute"),
            Some(AssemblyInfoKind::Title)
        );
        assert_eq!(
            AssemblyInfoKind::from_attribute_name("System.Reflection.AssemblyVersionAttribute"),
            None
        );
    }

    #[test]
    fn base_set_names_are_unique() {
        let descriptors = base_descriptors();
        let mut names: Vec<_> = descriptors.iter().map(|d| d.name.clone()).collect();
        names.sort();
        names.dedup();

        assert_eq!(descriptors.len(), 17);
        assert_eq!(names.len(), descriptors.len());
    }

    #[test]
    fn assembly_info_hook() {
        let attribute = DecodedAttribute::new(
            "System.Reflection.AssemblyCompanyAttribute",
            vec![AttributeValue::String("Dark Creek".into())],
            vec![],
        );

        assert_eq!(
            assembly_info(&attribute).unwrap(),
            KnownAttribute::AssemblyInfo {
                kind: AssemblyInfoKind::Company,
                value: "Dark Creek".into()
            }
        );
    }

    #[test]
    fn server_type_hook_keeps_unnamed_values_apart() {
        let enum_attribute = |value, constant: Option<&str>| {
            DecodedAttribute::new(
                names::COMPONENT_SERVER_TYPE,
                vec![AttributeValue::Enum(EnumValue {
                    type_name: names::SERVER_TYPE_ENUM.into(),
                    value,
                    constant: constant.map(str::to_string),
                })],
                vec![],
            )
        };

        assert_eq!(
            component_server_type(&enum_attribute(2, Some("InprocServer32"))).unwrap(),
            KnownAttribute::ComponentServerType(Some(ServerType::InprocServer32))
        );
        assert_eq!(
            component_server_type(&enum_attribute(0, Some("Undefined"))).unwrap(),
            KnownAttribute::ComponentServerType(Some(ServerType::Undefined))
        );
        assert_eq!(
            component_server_type(&enum_attribute(42, None)).unwrap(),
            KnownAttribute::ComponentServerType(None)
        );
    }

    #[test]
    fn hooks_reject_wrong_argument_types() {
        let attribute = DecodedAttribute::new(
            names::COM_VISIBLE,
            vec![AttributeValue::String("true".into())],
            vec![],
        );
        assert!(com_visible(&attribute).is_err());

        let attribute = DecodedAttribute::new(names::RUNTIME_COMPATIBILITY, vec![], vec![]);
        assert_eq!(
            runtime_compatibility(&attribute).unwrap(),
            KnownAttribute::RuntimeCompatibility {
                wrap_non_exception_throws: None
            }
        );
    }
}
