//! Reading component libraries into [`LibraryMetadata`].
//!
//! [`LibraryReader::read`] drives the whole pipeline for one path: it resolves the managed
//! library from the file name, classifies the image, decodes the assembly attributes,
//! determines the target runtime and finally synthesizes a descriptor for every eligible,
//! visible type carrying a `GuidAttribute`.
//!
//! # Examples
//!
//! ```rust
//! use comscope::{
//!     metadata::synthetic::{SyntheticModuleBuilder, SyntheticSource, SyntheticType},
//!     LibraryReader,
//! };
//!
//! let dir = tempfile::tempdir()?;
//! let path = std::path::absolute(dir.path().join("Widgets.dll"))?;
//! std::fs::write(&path, b"MZ")?;
//!
//! let module = SyntheticModuleBuilder::new("Widgets")
//!     .target_framework(".NETCoreApp,Version=v3.1")
//!     .add_type(
//!         SyntheticType::class("Widgets", "Spinner")
//!             .guid("5b6f0a2e-2d7c-4f7e-9a59-3c8e1a0b6d11")
//!             .com_visible(true),
//!     )
//!     .build()?;
//!
//! let reader = LibraryReader::new(SyntheticSource::new().with_module(&path, module));
//! let metadata = reader.read(&path)?;
//! assert_eq!(metadata.descriptors.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::path::{Path, PathBuf};

use log::{debug, info, trace};
use rayon::prelude::*;

use crate::{
    file::ImageKind,
    library::{
        config::ReaderConfig,
        metadata::{AssemblyMetadata, LibraryMetadata},
        runtime::{FrameworkName, TargetRuntime},
    },
    metadata::{
        access::{MetadataSource, ModuleMetadata},
        cil::CilSource,
        customattributes::{
            known::names, AttributeCollection, AttributeDecoder, AttributeRegistry, TypeResolver,
        },
        token::Token,
    },
    registration::{
        is_com_eligible, paths::library_path, DescriptorSynthesizer, ModuleContext,
        RegistrationDescriptor,
    },
    Error::{
        Empty, GoblinErr, MalformedAttributeRecord, ModuleNotFound, NotImplementedForImageKind,
        NotSupportedOperation, UnrecognizedRuntimeFamily,
    },
    Result,
};

/// Reads component libraries.
///
/// A reader is immutable once built and can serve reads from several threads at once.
pub struct LibraryReader {
    source: Box<dyn MetadataSource>,
    registry: AttributeRegistry,
    resolver: TypeResolver,
    config: ReaderConfig,
}

impl LibraryReader {
    /// Creates a reader with the base attribute set, the default resolver and the default
    /// configuration.
    #[must_use]
    pub fn new(source: impl MetadataSource + 'static) -> Self {
        LibraryReaderBuilder::new(source).build()
    }

    /// Starts building a reader over `source`.
    #[must_use]
    pub fn builder(source: impl MetadataSource + 'static) -> LibraryReaderBuilder {
        LibraryReaderBuilder::new(source)
    }

    /// Supported attribute types
    #[must_use]
    pub fn registry(&self) -> &AttributeRegistry {
        &self.registry
    }

    /// Resolver for attribute argument types
    #[must_use]
    pub fn resolver(&self) -> &TypeResolver {
        &self.resolver
    }

    /// Reader configuration
    #[must_use]
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Reads the component library at `path`.
    ///
    /// `path` may name the library itself or its .NET Core COM host, `X.comhost.dll` is
    /// read as `X.dll`.
    ///
    /// # Errors
    /// - [`crate::Error::NotSupportedOperation`] if `path` is a directory
    /// - [`crate::Error::UnsupportedFileName`] if the name is not `<name>.dll`
    /// - [`crate::Error::ModuleNotFound`] if the library does not exist
    /// - [`crate::Error::NotImplementedForImageKind`] if the image is not a PE image
    /// - [`crate::Error::UnrecognizedRuntimeFamily`] for an unknown target framework
    /// - any error of the attribute decoder or the descriptor synthesizer
    pub fn read(&self, path: impl AsRef<Path>) -> Result<LibraryMetadata> {
        let path = path.as_ref();
        if path.is_dir() {
            return Err(NotSupportedOperation(path.to_path_buf()));
        }

        let library = std::path::absolute(library_path(path)?)?;
        if !library.is_file() {
            return Err(ModuleNotFound(library));
        }

        let image_kind = match self.source.classify(&library) {
            Ok(image_kind) => image_kind,
            Err(Empty | GoblinErr(_)) => {
                return Err(NotImplementedForImageKind { path: library })
            }
            Err(error) => return Err(error),
        };

        match image_kind {
            ImageKind::Managed => self.read_managed(library),
            ImageKind::Native => {
                info!("{} is a native library", library.display());
                Ok(LibraryMetadata::native(library))
            }
            ImageKind::Unknown => Err(NotImplementedForImageKind { path: library }),
        }
    }

    /// Reads several libraries in parallel.
    ///
    /// Returns one result per path, in the order of `paths`.
    pub fn read_many<P>(&self, paths: &[P]) -> Vec<Result<LibraryMetadata>>
    where
        P: AsRef<Path> + Sync,
    {
        paths.par_iter().map(|path| self.read(path)).collect()
    }

    fn read_managed(&self, path: PathBuf) -> Result<LibraryMetadata> {
        let module = self.source.open(&path)?;
        let decoder = AttributeDecoder::new(&self.registry, &self.resolver);

        let identity = module.identity()?;
        let runtime_version = module.runtime_version()?;
        let attributes =
            decoder.decode_scope(&*module, Token::ASSEMBLY, &module.assembly_attributes()?)?;
        let (target_runtime, framework) = classify_runtime(&path, &attributes)?;

        debug!(
            "{} targets {} with metadata version {}",
            identity, target_runtime, runtime_version
        );

        let context = ModuleContext {
            path: &path,
            identity: &identity,
            runtime_version: &runtime_version,
            runtime: target_runtime,
            com_visible: attributes.com_visible()?.unwrap_or(false),
        };
        let descriptors = self.read_types(&*module, &decoder, context)?;

        info!("{} holds {} component(s)", path.display(), descriptors.len());

        Ok(LibraryMetadata {
            path,
            image_kind: ImageKind::Managed,
            assembly: Some(AssemblyMetadata {
                identity,
                runtime_version,
                target_runtime,
                framework,
                attributes,
            }),
            descriptors,
        })
    }

    fn read_types(
        &self,
        module: &dyn ModuleMetadata,
        decoder: &AttributeDecoder<'_>,
        context: ModuleContext<'_>,
    ) -> Result<Vec<RegistrationDescriptor>> {
        let synthesizer = DescriptorSynthesizer::new(&self.config, context);
        let mut descriptors = Vec::new();

        for definition in module.type_definitions()? {
            if definition.is_module_type() {
                continue;
            }

            if !is_com_eligible(&definition) {
                trace!("Skipping {}", definition.full_name());
                continue;
            }

            let attributes =
                decoder.decode_scope(module, definition.token, &definition.custom_attributes)?;

            if let Some(descriptor) = synthesizer.synthesize(&definition, attributes)? {
                descriptors.push(descriptor);
            }
        }

        Ok(descriptors)
    }
}

/// Determines the target runtime from the assembly's `TargetFrameworkAttribute`.
fn classify_runtime(
    path: &Path,
    attributes: &AttributeCollection,
) -> Result<(TargetRuntime, Option<FrameworkName>)> {
    let Some((framework_name, _)) = attributes.target_framework()? else {
        return Ok((TargetRuntime::Unknown, None));
    };

    let framework =
        FrameworkName::parse(&framework_name).map_err(|error| MalformedAttributeRecord {
            attribute: names::TARGET_FRAMEWORK.to_string(),
            message: error.to_string(),
        })?;

    let runtime = framework
        .runtime()
        .ok_or_else(|| UnrecognizedRuntimeFamily {
            path: path.to_path_buf(),
            identifier: framework.identifier.clone(),
        })?;

    Ok((runtime, Some(framework)))
}

impl Default for LibraryReader {
    /// A reader over managed PE images on disk, see [`CilSource`].
    fn default() -> Self {
        Self::new(CilSource)
    }
}

/// Builds a [`LibraryReader`].
pub struct LibraryReaderBuilder {
    source: Box<dyn MetadataSource>,
    registry: AttributeRegistry,
    resolver: TypeResolver,
    config: ReaderConfig,
}

impl LibraryReaderBuilder {
    /// Starts with the base attribute set, the default resolver and the default
    /// configuration.
    #[must_use]
    pub fn new(source: impl MetadataSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            registry: AttributeRegistry::new(),
            resolver: TypeResolver::new(),
            config: ReaderConfig::default(),
        }
    }

    /// Replaces the supported attribute types.
    #[must_use]
    pub fn registry(mut self, registry: AttributeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replaces the type resolver.
    #[must_use]
    pub fn resolver(mut self, resolver: TypeResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn config(mut self, config: ReaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the reader.
    #[must_use]
    pub fn build(self) -> LibraryReader {
        LibraryReader {
            source: self.source,
            registry: self.registry,
            resolver: self.resolver,
            config: self.config,
        }
    }
}
