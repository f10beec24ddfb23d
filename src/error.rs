use std::path::PathBuf;

use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The variants fall into a handful of groups, matching how a caller is expected to react to
/// them. Policy non-matches (ineligible types, unsupported attribute kinds, unnamed enum
/// constants) are never reported through this type.
///
/// # Error Categories
///
/// ## Caller Input
/// - [`Error::NotSupportedOperation`] - The path names a directory
/// - [`Error::ModuleNotFound`] - The resolved module file does not exist
/// - [`Error::UnsupportedFileName`] - The file name does not follow the library naming convention
/// - [`Error::FileError`] - Filesystem I/O errors
///
/// ## Format
/// - [`Error::Malformed`] - Corrupted binary structure, with the detecting source location
/// - [`Error::MalformedAttributeRecord`] - A custom attribute blob could not be decoded
/// - [`Error::OutOfBounds`] - Attempted to read beyond the end of a buffer
/// - [`Error::UnrecognizedRuntimeFamily`] - Target framework identifier is not a known family
/// - [`Error::NotImplementedForImageKind`] - The image could not be recognized as PE
/// - [`Error::InvalidClsid`] - A `GuidAttribute` does not carry a valid 128-bit identifier
/// - [`Error::GoblinErr`] - PE parsing errors from the goblin crate
/// - [`Error::MetadataErr`] - Metadata table and heap errors from the dotscope crate
/// - [`Error::Empty`] - Empty input provided
///
/// ## Environment
/// - [`Error::HostingShimNotFound`] - The classic runtime shim is missing on this machine
/// - [`Error::UnsupportedTargetRuntime`] - A component was found in a module without a runtime
///
/// ## Configuration
/// - [`Error::UnsupportedPrimitive`], [`Error::TypeNotPrimitive`], [`Error::UnknownEnumType`],
///   [`Error::DuplicateAttribute`], [`Error::ValueShapeMismatch`], [`Error::MultipleInstances`]
///
/// # Examples
///
/// ```rust,no_run
/// use comscope::{Error, LibraryReader, SyntheticSource};
///
/// let reader = LibraryReader::new(SyntheticSource::new());
/// match reader.read("Widgets.dll") {
///     Ok(metadata) => println!("{metadata}"),
///     Err(Error::ModuleNotFound(path)) => eprintln!("missing: {}", path.display()),
///     Err(Error::UnrecognizedRuntimeFamily { identifier, .. }) => {
///         eprintln!("unknown runtime family {identifier}")
///     }
///     Err(e) => eprintln!("Other error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    // Caller input errors
    /// The requested operation is not supported for this input.
    ///
    /// Returned by [`crate::LibraryReader::read`] when the given path is a directory, the
    /// reader never scans directories.
    #[error("Operation not supported for {0}")]
    NotSupportedOperation(PathBuf),

    /// The module file resolved from the input path does not exist.
    #[error("Module not found - {0}")]
    ModuleNotFound(PathBuf),

    /// The file name does not follow the `<base>.dll` / `<base>.comhost.dll` convention.
    #[error("Unsupported file name - {0}")]
    UnsupportedFileName(String),

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur during file operations
    /// such as reading from disk, permission issues, or filesystem errors.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    // Format errors
    /// The data is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A custom attribute record of a supported kind could not be decoded.
    ///
    /// Truncated blobs, invalid prologs, unknown serialization tags and shape mismatches all
    /// end up here. The decode pass of the owning scope is aborted.
    #[error("Malformed custom attribute record '{attribute}': {message}")]
    MalformedAttributeRecord {
        /// Fully-qualified name of the attribute type
        attribute: String,
        /// What went wrong while decoding
        message: String,
    },

    /// An out of bound access was attempted while parsing.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// Error from the goblin crate during PE parsing.
    #[error("{0}")]
    GoblinErr(#[from] goblin::error::Error),

    /// Error from the dotscope crate while loading metadata tables and heaps.
    #[error("{0}")]
    MetadataErr(#[from] dotscope::Error),

    /// The `TargetFrameworkAttribute` names a runtime family which is neither `.NETFramework`
    /// nor `.NETCoreApp`.
    #[error("Unrecognized runtime family '{identifier}' in {}", path.display())]
    UnrecognizedRuntimeFamily {
        /// Module that declared the framework
        path: PathBuf,
        /// The framework identifier as declared
        identifier: String,
    },

    /// The image at this path could not be recognized as a PE image, so it can be neither
    /// introspected as managed nor accepted as native.
    #[error("Image kind not supported - {}", path.display())]
    NotImplementedForImageKind {
        /// The offending module path
        path: PathBuf,
    },

    /// A `GuidAttribute` on a component type does not hold a valid 128-bit identifier.
    #[error("Invalid CLSID '{value}' on type {type_name}")]
    InvalidClsid {
        /// Full name of the component type
        type_name: String,
        /// The attribute value as declared
        value: String,
    },

    // Environment errors
    /// The classic runtime hosting shim could not be located on this machine.
    #[error("Hosting shim {} not found, required by {type_name}", shim_path.display())]
    HostingShimNotFound {
        /// Full name of the component type being synthesized
        type_name: String,
        /// The path that was checked, or the bare shim name if no system directory is known
        shim_path: PathBuf,
    },

    /// A component type was found in a module without a recognized target runtime.
    #[error("Unsupported target runtime for component {type_name}")]
    UnsupportedTargetRuntime {
        /// Full name of the component type
        type_name: String,
    },

    // Configuration errors
    /// `Void` was requested as the shape of an attribute argument.
    #[error("Void is not a valid custom attribute argument type")]
    UnsupportedPrimitive,

    /// This element type can not be converted to a primitive.
    ///
    /// The associated value is the offending ELEMENT_TYPE byte.
    #[error("This type can not be converted to a primitive - 0x{0:02X}")]
    TypeNotPrimitive(u8),

    /// The resolver does not know the underlying type of this enum.
    #[error("Unknown enum type {0}")]
    UnknownEnumType(String),

    /// An attribute descriptor with this name is already registered.
    #[error("Custom attribute {0} is already registered")]
    DuplicateAttribute(String),

    /// A value handed to the encoder does not match the declared shape.
    #[error("Value does not match shape - {0}")]
    ValueShapeMismatch(String),

    /// More than one instance of an attribute was found where exactly one is allowed.
    #[error("Multiple instances of custom attribute {0}")]
    MultipleInstances(String),
}
