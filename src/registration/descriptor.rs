//! Registration descriptors, one per registrable COM class.
//!
//! A descriptor holds everything needed to write the class registration: the declarative
//! configuration taken from attributes, and how the class is hosted. Hosting differs per
//! runtime, hence one variant per runtime family.

use std::{fmt, path::PathBuf};

use crate::{
    metadata::{customattributes::AttributeCollection, identity::AssemblyVersion},
    registration::types::{Clsid, ServerType, ThreadingModel},
};

/// Assembly binding information of a .NET Framework class.
///
/// Written once as shared information and once per assembly version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInformation {
    /// Namespace-qualified class name
    pub type_full_name: String,
    /// Path of the library holding the class
    pub codebase: PathBuf,
    /// Assembly display name
    pub assembly_full_name: String,
    /// Assembly version
    pub assembly_version: AssemblyVersion,
    /// `true` if the assembly carries a strong name
    pub assembly_is_strong_named: bool,
    /// Runtime metadata version, e.g. `v4.0.30319`
    pub runtime_version: String,
}

/// A class hosted by the .NET Framework through its shim.
#[derive(Debug, Clone, PartialEq)]
pub struct NetFrameworkClass {
    /// Class identifier
    pub clsid: Clsid,
    /// Programmatic identifier, empty if not declared
    pub prog_id: String,
    /// Server type
    pub server_type: ServerType,
    /// Threading model
    pub threading_model: ThreadingModel,
    /// Namespace-qualified class name
    pub type_name: String,
    /// Path of the hosting shim (`mscoree.dll`)
    pub shim_path: PathBuf,
    /// Information shared by all versions
    pub shared_type_info: TypeInformation,
    /// Information per assembly version
    pub versioned_type_info: Vec<TypeInformation>,
    /// Decoded attributes of the class
    pub attributes: AttributeCollection,
}

/// A class hosted by .NET Core through its COM host.
#[derive(Debug, Clone, PartialEq)]
pub struct NetCoreClass {
    /// Class identifier
    pub clsid: Clsid,
    /// Programmatic identifier, empty if not declared
    pub prog_id: String,
    /// Server type
    pub server_type: ServerType,
    /// Threading model
    pub threading_model: ThreadingModel,
    /// Namespace-qualified class name
    pub type_name: String,
    /// Path of the `X.comhost.dll` next to the library
    pub host_shim_path: PathBuf,
    /// Path of the library holding the class
    pub codebase: PathBuf,
    /// Decoded attributes of the class
    pub attributes: AttributeCollection,
}

/// A class implemented by a native library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeClass {
    /// Class identifier
    pub clsid: Clsid,
    /// Programmatic identifier, empty if not declared
    pub prog_id: String,
    /// Server type
    pub server_type: ServerType,
    /// Threading model
    pub threading_model: ThreadingModel,
    /// Path of the native library
    pub native_path: PathBuf,
}

/// Registration data of one COM class.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationDescriptor {
    /// Managed class for the .NET Framework
    NetFramework(NetFrameworkClass),
    /// Managed class for .NET Core
    NetCore(NetCoreClass),
    /// Native class
    Native(NativeClass),
}

impl RegistrationDescriptor {
    /// Class identifier
    #[must_use]
    pub fn clsid(&self) -> Clsid {
        match self {
            RegistrationDescriptor::NetFramework(class) => class.clsid,
            RegistrationDescriptor::NetCore(class) => class.clsid,
            RegistrationDescriptor::Native(class) => class.clsid,
        }
    }

    /// Programmatic identifier, empty if not declared
    #[must_use]
    pub fn prog_id(&self) -> &str {
        match self {
            RegistrationDescriptor::NetFramework(class) => &class.prog_id,
            RegistrationDescriptor::NetCore(class) => &class.prog_id,
            RegistrationDescriptor::Native(class) => &class.prog_id,
        }
    }

    /// Server type
    #[must_use]
    pub fn server_type(&self) -> ServerType {
        match self {
            RegistrationDescriptor::NetFramework(class) => class.server_type,
            RegistrationDescriptor::NetCore(class) => class.server_type,
            RegistrationDescriptor::Native(class) => class.server_type,
        }
    }

    /// Threading model
    #[must_use]
    pub fn threading_model(&self) -> ThreadingModel {
        match self {
            RegistrationDescriptor::NetFramework(class) => class.threading_model,
            RegistrationDescriptor::NetCore(class) => class.threading_model,
            RegistrationDescriptor::Native(class) => class.threading_model,
        }
    }

    /// Namespace-qualified class name, `None` for native classes.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        match self {
            RegistrationDescriptor::NetFramework(class) => Some(&class.type_name),
            RegistrationDescriptor::NetCore(class) => Some(&class.type_name),
            RegistrationDescriptor::Native(_) => None,
        }
    }

    /// Decoded attributes of the class, `None` for native classes.
    #[must_use]
    pub fn attributes(&self) -> Option<&AttributeCollection> {
        match self {
            RegistrationDescriptor::NetFramework(class) => Some(&class.attributes),
            RegistrationDescriptor::NetCore(class) => Some(&class.attributes),
            RegistrationDescriptor::Native(_) => None,
        }
    }

    /// Short name of the hosting kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            RegistrationDescriptor::NetFramework(_) => "NetFramework",
            RegistrationDescriptor::NetCore(_) => "NetCore",
            RegistrationDescriptor::Native(_) => "Native",
        }
    }

    /// Returns `true` if both server type and threading model are defined.
    ///
    /// A registration store can not express `Undefined` for either of them.
    #[must_use]
    pub fn is_persistable(&self) -> bool {
        self.server_type().is_defined() && self.threading_model().is_defined()
    }
}

impl fmt::Display for RegistrationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ProgId=\"{}\" ServerType={} ThreadingModel={}",
            self.kind(),
            self.clsid(),
            self.prog_id(),
            self.server_type(),
            self.threading_model()
        )?;

        if let Some(type_name) = self.type_name() {
            write!(f, " Type={type_name}")?;
        }

        Ok(())
    }
}
