//! Turns eligible type definitions into registration descriptors.
//!
//! The synthesizer applies the visibility policy, then builds the descriptor for the
//! module's target runtime from the decoded type attributes. Types without a
//! `GuidAttribute` are not components and yield no descriptor.
//!
//! # Visibility
//!
//! A type is registrable if it is `[ComVisible(true)]`, or if it carries no `ComVisible`
//! attribute at all while the assembly is `[ComVisible(true)]` and targets the .NET
//! Framework. An explicit `[ComVisible(false)]` always wins.

use std::path::{Path, PathBuf};

use log::{debug, trace, warn};

use crate::{
    library::{config::ReaderConfig, runtime::TargetRuntime},
    metadata::{
        customattributes::{known::names, AttributeCollection},
        identity::AssemblyIdentity,
        typedef::TypeDefinition,
    },
    registration::{
        descriptor::{NetCoreClass, NetFrameworkClass, RegistrationDescriptor, TypeInformation},
        paths::comhost_path,
        types::{Clsid, ServerType, ThreadingModel},
    },
    Error::{HostingShimNotFound, InvalidClsid, UnsupportedTargetRuntime},
    Result,
};

/// Module-wide facts the synthesizer needs for every type.
#[derive(Debug, Clone, Copy)]
pub struct ModuleContext<'a> {
    /// Absolute path of the managed library
    pub path: &'a Path,
    /// Assembly identity
    pub identity: &'a AssemblyIdentity,
    /// Runtime metadata version, e.g. `v4.0.30319`
    pub runtime_version: &'a str,
    /// Classified target runtime
    pub runtime: TargetRuntime,
    /// `true` if the assembly is `[ComVisible(true)]`
    pub com_visible: bool,
}

/// Builds [`RegistrationDescriptor`]s for the types of one module.
pub struct DescriptorSynthesizer<'a> {
    config: &'a ReaderConfig,
    module: ModuleContext<'a>,
}

impl<'a> DescriptorSynthesizer<'a> {
    /// Creates a synthesizer for one module.
    #[must_use]
    pub fn new(config: &'a ReaderConfig, module: ModuleContext<'a>) -> Self {
        Self { config, module }
    }

    /// Builds the descriptor for `definition`, which must have passed the eligibility filter.
    ///
    /// Returns `Ok(None)` if the type is not registrable or has no `GuidAttribute`.
    ///
    /// # Errors
    /// - [`crate::Error::HostingShimNotFound`] for a .NET Framework module without a shim
    /// - [`crate::Error::UnsupportedTargetRuntime`] if the module has no known runtime
    /// - [`crate::Error::InvalidClsid`] if the `GuidAttribute` is not a GUID
    /// - [`crate::Error::MultipleInstances`] if a single-use attribute is applied twice
    pub fn synthesize(
        &self,
        definition: &TypeDefinition,
        attributes: AttributeCollection,
    ) -> Result<Option<RegistrationDescriptor>> {
        let type_name = definition.full_name();

        if !self.is_registrable(&type_name, &attributes)? {
            return Ok(None);
        }

        let Some(guid) = attributes.guid()? else {
            trace!("{} has no GuidAttribute", type_name);
            return Ok(None);
        };

        let descriptor = match self.module.runtime {
            TargetRuntime::NetFramework => {
                let shim_path = self.locate_shim(&type_name)?;
                let clsid = parse_clsid(&type_name, &guid)?;
                let shared_type_info = self.type_information(&type_name);

                RegistrationDescriptor::NetFramework(NetFrameworkClass {
                    clsid,
                    prog_id: self.prog_id(&attributes)?,
                    server_type: self.server_type(&type_name, &attributes)?,
                    threading_model: self.threading_model(&type_name, &attributes)?,
                    type_name,
                    shim_path,
                    versioned_type_info: vec![shared_type_info.clone()],
                    shared_type_info,
                    attributes,
                })
            }
            TargetRuntime::NetCore => {
                let host_shim_path = comhost_path(self.module.path)?;
                let clsid = parse_clsid(&type_name, &guid)?;

                RegistrationDescriptor::NetCore(NetCoreClass {
                    clsid,
                    prog_id: self.prog_id(&attributes)?,
                    server_type: self.server_type(&type_name, &attributes)?,
                    threading_model: self.threading_model(&type_name, &attributes)?,
                    type_name,
                    host_shim_path,
                    codebase: self.module.path.to_path_buf(),
                    attributes,
                })
            }
            TargetRuntime::Unknown => return Err(UnsupportedTargetRuntime { type_name }),
        };

        debug!("Synthesized {}", descriptor);
        Ok(Some(descriptor))
    }

    fn is_registrable(&self, type_name: &str, attributes: &AttributeCollection) -> Result<bool> {
        match attributes.com_visible()? {
            Some(true) => Ok(true),
            Some(false) => {
                trace!("{} is ComVisible(false)", type_name);
                Ok(false)
            }
            None => {
                let inherited =
                    self.module.com_visible && self.module.runtime == TargetRuntime::NetFramework;
                if !inherited {
                    trace!(
                        "{} is not ComVisible and does not inherit visibility on {}",
                        type_name,
                        self.module.runtime
                    );
                }
                Ok(inherited)
            }
        }
    }

    fn locate_shim(&self, type_name: &str) -> Result<PathBuf> {
        match self.config.shim_path() {
            Some(shim_path) if shim_path.is_file() => Ok(shim_path),
            Some(shim_path) => Err(HostingShimNotFound {
                type_name: type_name.to_string(),
                shim_path,
            }),
            None => Err(HostingShimNotFound {
                type_name: type_name.to_string(),
                shim_path: PathBuf::from(&self.config.framework_shim_name),
            }),
        }
    }

    fn type_information(&self, type_name: &str) -> TypeInformation {
        let identity = self.module.identity;

        TypeInformation {
            type_full_name: type_name.to_string(),
            codebase: self.module.path.to_path_buf(),
            assembly_full_name: identity.display_name(),
            assembly_version: identity.version,
            assembly_is_strong_named: identity.is_strong_named(),
            runtime_version: self.module.runtime_version.to_string(),
        }
    }

    fn prog_id(&self, attributes: &AttributeCollection) -> Result<String> {
        Ok(attributes
            .prog_id()?
            .unwrap_or_else(|| self.config.fallback_prog_id.clone()))
    }

    fn server_type(&self, type_name: &str, attributes: &AttributeCollection) -> Result<ServerType> {
        match attributes.server_type()? {
            Some(server_type) => Ok(server_type),
            None => {
                if attributes.contains(names::COMPONENT_SERVER_TYPE) {
                    warn!(
                        "{} declares an unnamed server type, using {}",
                        type_name, self.config.fallback_server_type
                    );
                }
                Ok(self.config.fallback_server_type)
            }
        }
    }

    fn threading_model(
        &self,
        type_name: &str,
        attributes: &AttributeCollection,
    ) -> Result<ThreadingModel> {
        match attributes.threading_model()? {
            Some(threading_model) => Ok(threading_model),
            None => {
                if attributes.contains(names::COMPONENT_THREADING_MODEL) {
                    warn!(
                        "{} declares an unnamed threading model, using {}",
                        type_name, self.config.fallback_threading_model
                    );
                }
                Ok(self.config.fallback_threading_model)
            }
        }
    }
}

fn parse_clsid(type_name: &str, guid: &str) -> Result<Clsid> {
    Clsid::parse(guid).ok_or_else(|| InvalidClsid {
        type_name: type_name.to_string(),
        value: guid.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::{identity::AssemblyVersion, synthetic::SyntheticType},
        test::{
            create_configured_spinner, create_decoded_type, create_shim_directory,
            create_spinner, SPINNER_CLSID,
        },
        Error,
    };

    fn identity() -> AssemblyIdentity {
        AssemblyIdentity::new("Widgets", AssemblyVersion::new(1, 2, 0, 0))
    }

    fn run(
        config: &ReaderConfig,
        runtime: TargetRuntime,
        com_visible: bool,
        definition: SyntheticType,
    ) -> Result<Option<RegistrationDescriptor>> {
        let identity = identity();
        let context = ModuleContext {
            path: Path::new("/opt/widgets/Widgets.dll"),
            identity: &identity,
            runtime_version: "v4.0.30319",
            runtime,
            com_visible,
        };
        let (definition, attributes) = create_decoded_type(definition);

        DescriptorSynthesizer::new(config, context).synthesize(&definition, attributes)
    }

    #[test]
    fn net_core_descriptor() {
        let descriptor = run(
            &ReaderConfig::default(),
            TargetRuntime::NetCore,
            false,
            create_configured_spinner(),
        )
        .unwrap()
        .unwrap();

        let RegistrationDescriptor::NetCore(class) = descriptor else {
            panic!("expected a .NET Core class");
        };
        assert_eq!(class.clsid.to_string(), format!("{{{SPINNER_CLSID}}}"));
        assert_eq!(class.prog_id, "Widgets.Spinner");
        assert_eq!(class.type_name, "Widgets.Spinner");
        assert_eq!(class.server_type, ServerType::InprocServer32);
        assert_eq!(class.threading_model, ThreadingModel::Both);
        assert_eq!(
            class.host_shim_path,
            Path::new("/opt/widgets/Widgets.comhost.dll")
        );
        assert_eq!(class.codebase, Path::new("/opt/widgets/Widgets.dll"));
        assert_eq!(class.attributes.len(), 5);
    }

    #[test]
    fn visibility_policy() {
        let config = ReaderConfig::default();
        let cases = [
            (TargetRuntime::NetCore, true, None, false),
            (TargetRuntime::NetCore, false, Some(true), true),
            (TargetRuntime::NetCore, true, Some(false), false),
            (TargetRuntime::NetFramework, false, None, false),
            (TargetRuntime::NetFramework, true, Some(false), false),
            (TargetRuntime::Unknown, true, None, false),
        ];

        for (runtime, module_visible, type_visible, expected) in cases {
            let mut definition = create_spinner();
            if let Some(visible) = type_visible {
                definition = definition.com_visible(visible);
            }

            let result = run(&config, runtime, module_visible, definition).unwrap();
            assert_eq!(
                result.is_some(),
                expected,
                "{runtime} module={module_visible} type={type_visible:?}"
            );
        }
    }

    #[test]
    fn framework_inherits_module_visibility() {
        let shim = create_shim_directory();
        let config = ReaderConfig::with_system_directory(shim.path());

        let descriptor = run(&config, TargetRuntime::NetFramework, true, create_spinner())
            .unwrap()
            .unwrap();

        let RegistrationDescriptor::NetFramework(class) = descriptor else {
            panic!("expected a .NET Framework class");
        };
        assert_eq!(class.shim_path, shim.path().join("mscoree.dll"));
        assert_eq!(class.versioned_type_info, vec![class.shared_type_info.clone()]);
        assert_eq!(class.shared_type_info.type_full_name, "Widgets.Spinner");
        assert_eq!(
            class.shared_type_info.assembly_full_name,
            "Widgets, Version=1.2.0.0, Culture=neutral, PublicKeyToken=null"
        );
        assert_eq!(
            class.shared_type_info.assembly_version,
            AssemblyVersion::new(1, 2, 0, 0)
        );
        assert!(!class.shared_type_info.assembly_is_strong_named);
        assert_eq!(class.shared_type_info.runtime_version, "v4.0.30319");
        assert!(class.prog_id.is_empty());
        assert_eq!(class.server_type, ServerType::Undefined);
    }

    #[test]
    fn missing_shim() {
        let result = run(
            &ReaderConfig::default(),
            TargetRuntime::NetFramework,
            false,
            create_spinner().com_visible(true),
        );
        assert!(matches!(
            result,
            Err(Error::HostingShimNotFound { type_name, shim_path })
                if type_name == "Widgets.Spinner" && shim_path == Path::new("mscoree.dll")
        ));

        let empty = tempfile::tempdir().unwrap();
        let result = run(
            &ReaderConfig::with_system_directory(empty.path()),
            TargetRuntime::NetFramework,
            true,
            create_spinner(),
        );
        assert!(matches!(result, Err(Error::HostingShimNotFound { .. })));
    }

    #[test]
    fn unknown_runtime_with_visible_component() {
        let result = run(
            &ReaderConfig::default(),
            TargetRuntime::Unknown,
            false,
            create_spinner().com_visible(true),
        );

        assert!(matches!(
            result,
            Err(Error::UnsupportedTargetRuntime { type_name }) if type_name == "Widgets.Spinner"
        ));
    }

    #[test]
    fn no_guid_is_not_a_component() {
        let result = run(
            &ReaderConfig::default(),
            TargetRuntime::Unknown,
            false,
            SyntheticType::class("Widgets", "Helper").com_visible(true),
        );

        assert!(result.unwrap().is_none());
    }

    #[test]
    fn invalid_guid() {
        let result = run(
            &ReaderConfig::default(),
            TargetRuntime::NetCore,
            false,
            SyntheticType::class("Widgets", "Spinner")
                .guid("not-a-guid")
                .com_visible(true),
        );

        assert!(matches!(
            result,
            Err(Error::InvalidClsid { value, .. }) if value == "not-a-guid"
        ));
    }

    #[test]
    fn absent_values_fall_back() {
        let config = ReaderConfig::default()
            .fallback_prog_id("Widgets.Default")
            .fallback_server_type(ServerType::LocalServer32)
            .fallback_threading_model(ThreadingModel::Apartment);

        let descriptor = run(
            &config,
            TargetRuntime::NetCore,
            false,
            create_spinner()
                .com_visible(true)
                .threading_model(ThreadingModel::Free),
        )
        .unwrap()
        .unwrap();

        assert_eq!(descriptor.prog_id(), "Widgets.Default");
        assert_eq!(descriptor.server_type(), ServerType::LocalServer32);
        assert_eq!(descriptor.threading_model(), ThreadingModel::Free);
        assert!(descriptor.is_persistable());
    }

    #[test]
    fn declared_undefined_values_are_kept() {
        let config = ReaderConfig::default()
            .fallback_server_type(ServerType::LocalServer32)
            .fallback_threading_model(ThreadingModel::Apartment);

        let descriptor = run(
            &config,
            TargetRuntime::NetCore,
            false,
            create_spinner()
                .com_visible(true)
                .server_type(ServerType::Undefined)
                .threading_model(ThreadingModel::Undefined),
        )
        .unwrap()
        .unwrap();

        assert_eq!(descriptor.server_type(), ServerType::Undefined);
        assert_eq!(descriptor.threading_model(), ThreadingModel::Undefined);
        assert!(!descriptor.is_persistable());
    }
}
