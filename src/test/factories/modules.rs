//! Factory methods for synthetic modules.

use crate::{
    metadata::{
        access::ModuleMetadata,
        customattributes::{AttributeCollection, AttributeDecoder, AttributeRegistry, TypeResolver},
        synthetic::{SyntheticModule, SyntheticModuleBuilder, SyntheticType},
        typedef::TypeDefinition,
    },
    registration::{ServerType, ThreadingModel},
};

/// CLSID of the spinner component
pub const SPINNER_CLSID: &str = "5b6f0a2e-2d7c-4f7e-9a59-3c8e1a0b6d11";

/// Framework name of .NET Core 3.1
pub const NET_CORE_31: &str = ".NETCoreApp,Version=v3.1";

/// Framework name of .NET Framework 4.8
pub const NET_FRAMEWORK_48: &str = ".NETFramework,Version=v4.8";

/// The `Widgets.Spinner` component, with a CLSID and nothing else
pub fn create_spinner() -> SyntheticType {
    SyntheticType::class("Widgets", "Spinner").guid(SPINNER_CLSID)
}

/// The `Widgets.Spinner` component with every registration attribute set
pub fn create_configured_spinner() -> SyntheticType {
    create_spinner()
        .com_visible(true)
        .prog_id("Widgets.Spinner")
        .server_type(ServerType::InprocServer32)
        .threading_model(ThreadingModel::Both)
}

/// A `Widgets` module targeting `framework` with the given types
pub fn create_widgets_module(framework: &str, types: Vec<SyntheticType>) -> SyntheticModule {
    types
        .into_iter()
        .fold(
            SyntheticModuleBuilder::new("Widgets").target_framework(framework),
            SyntheticModuleBuilder::add_type,
        )
        .build()
        .unwrap()
}

/// Builds a module around `definition` and returns its definition with decoded attributes.
pub fn create_decoded_type(definition: SyntheticType) -> (TypeDefinition, AttributeCollection) {
    let module = SyntheticModuleBuilder::new("Widgets")
        .add_type(definition)
        .build()
        .unwrap();
    let definition = module.type_definitions().unwrap().remove(1);

    let registry = AttributeRegistry::new();
    let resolver = TypeResolver::new();
    let attributes = AttributeDecoder::new(&registry, &resolver)
        .decode_scope(&module, definition.token, &definition.custom_attributes)
        .unwrap();

    (definition, attributes)
}
