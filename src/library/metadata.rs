//! Result of reading one component library.

use std::{fmt, path::PathBuf};

use crate::{
    file::ImageKind,
    library::runtime::{FrameworkName, TargetRuntime},
    metadata::{customattributes::AttributeCollection, identity::AssemblyIdentity},
    registration::RegistrationDescriptor,
};

/// Assembly-level facts of a managed library.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyMetadata {
    /// Identity from the `Assembly` table
    pub identity: AssemblyIdentity,
    /// Runtime metadata version, e.g. `v4.0.30319`
    pub runtime_version: String,
    /// Runtime family from `TargetFrameworkAttribute`, `Unknown` without one
    pub target_runtime: TargetRuntime,
    /// Declared framework name, `None` without a `TargetFrameworkAttribute`
    pub framework: Option<FrameworkName>,
    /// Decoded assembly-scope attributes
    pub attributes: AttributeCollection,
}

impl AssemblyMetadata {
    /// Returns `true` if the assembly is `[ComVisible(true)]`.
    ///
    /// A missing or malformed attribute counts as not visible.
    #[must_use]
    pub fn is_com_visible(&self) -> bool {
        matches!(self.attributes.com_visible(), Ok(Some(true)))
    }
}

/// Everything read from one component library.
///
/// Native libraries carry no assembly metadata and no descriptors.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryMetadata {
    /// Absolute path of the library that was inspected
    pub path: PathBuf,
    /// Classification of the image
    pub image_kind: ImageKind,
    /// Assembly metadata, `None` for native libraries
    pub assembly: Option<AssemblyMetadata>,
    /// One descriptor per registrable class, in definition order
    pub descriptors: Vec<RegistrationDescriptor>,
}

impl LibraryMetadata {
    /// Creates the result for a native library.
    #[must_use]
    pub fn native(path: PathBuf) -> Self {
        Self {
            path,
            image_kind: ImageKind::Native,
            assembly: None,
            descriptors: Vec::new(),
        }
    }

    /// Target runtime of the library, `Unknown` for native libraries.
    #[must_use]
    pub fn target_runtime(&self) -> TargetRuntime {
        self.assembly
            .as_ref()
            .map_or(TargetRuntime::Unknown, |assembly| assembly.target_runtime)
    }

    /// Returns `true` if at least one class can be registered.
    #[must_use]
    pub fn has_components(&self) -> bool {
        !self.descriptors.is_empty()
    }
}

impl fmt::Display for LibraryMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Library: {}", self.path.display())?;
        writeln!(f, "Image: {}", self.image_kind)?;

        if let Some(assembly) = &self.assembly {
            writeln!(f, "Assembly: {}", assembly.identity)?;
            writeln!(f, "Runtime version: {}", assembly.runtime_version)?;
            match &assembly.framework {
                Some(framework) => writeln!(
                    f,
                    "Target runtime: {} ({})",
                    assembly.target_runtime, framework.version
                )?,
                None => writeln!(f, "Target runtime: {}", assembly.target_runtime)?,
            }

            let names: Vec<&str> = assembly.attributes.type_names().collect();
            writeln!(f, "Attributes: {}", names.join(", "))?;
        }

        write!(f, "Components: {}", self.descriptors.len())?;
        for descriptor in &self.descriptors {
            write!(f, "\n  {descriptor}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::identity::AssemblyVersion;

    #[test]
    fn native_display() {
        let metadata = LibraryMetadata::native(PathBuf::from("/opt/widgets/native.dll"));

        assert_eq!(metadata.target_runtime(), TargetRuntime::Unknown);
        assert!(!metadata.has_components());
        assert_eq!(
            metadata.to_string(),
            "Library: /opt/widgets/native.dll\nImage: Native\nComponents: 0"
        );
    }

    #[test]
    fn managed_display() {
        let metadata = LibraryMetadata {
            path: PathBuf::from("/opt/widgets/Widgets.dll"),
            image_kind: ImageKind::Managed,
            assembly: Some(AssemblyMetadata {
                identity: AssemblyIdentity::new("Widgets", AssemblyVersion::new(1, 0, 0, 0)),
                runtime_version: "v4.0.30319".into(),
                target_runtime: TargetRuntime::NetCore,
                framework: Some(FrameworkName::parse(".NETCoreApp,Version=v3.1").unwrap()),
                attributes: AttributeCollection::new(),
            }),
            descriptors: Vec::new(),
        };

        assert_eq!(metadata.target_runtime(), TargetRuntime::NetCore);
        assert!(!metadata.assembly.as_ref().unwrap().is_com_visible());
        assert_eq!(
            metadata.to_string(),
            "Library: /opt/widgets/Widgets.dll\n\
             Image: Managed\n\
             Assembly: Widgets, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null\n\
             Runtime version: v4.0.30319\n\
             Target runtime: NetCore (3.1)\n\
             Attributes: \n\
             Components: 0"
        );
    }
}
