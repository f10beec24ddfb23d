//! PE image access and managed/native classification.
//!
//! A module handed to the reader is either a managed library (a PE image whose optional
//! header points at a CLR runtime header) or a native one. This module wraps the goblin PE
//! parser over a pluggable data [`crate::file::Backend`] and answers exactly that question,
//! along with the low-level I/O helpers that the custom attribute codec is built on.
//!
//! # Key Components
//!
//! - [`crate::file::File`] - Parsed PE image over a file or memory backend
//! - [`crate::file::ImageKind`] - Managed, native or unknown
//! - [`crate::file::parser::Parser`] - Cursor over metadata blobs
//! - [`crate::file::io`] - Little-endian primitive reading and writing
//!
//! # Examples
//!
//! ```rust,no_run
//! use comscope::{File, ImageKind};
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("Widgets.dll"))?;
//! if file.kind() == ImageKind::Managed {
//!     let (rva, size) = file.clr().unwrap_or_default();
//!     println!("CLR header at 0x{rva:x}, {size} bytes");
//! }
//! # Ok::<(), comscope::Error>(())
//! ```

pub mod io;
pub mod parser;

mod memory;
mod physical;

use std::{fmt, path::Path};

use crate::{
    Error::{Empty, GoblinErr},
    Result,
};
use goblin::pe::PE;
use memory::Memory;
use ouroboros::self_referencing;
use physical::Physical;

/// Backend trait for image data sources.
///
/// This trait abstracts over the source of PE data, allowing for both in-memory and on-disk
/// representations. All implementations must be thread-safe.
pub trait Backend: Send + Sync {
    /// Returns a slice of the data at the given offset and length.
    ///
    /// # Arguments
    ///
    /// * `offset` - The starting offset within the data.
    /// * `len` - The length of the slice in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested range is out of bounds.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize;
}

/// How a module image was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageKind {
    /// Not classified
    #[default]
    Unknown,
    /// PE image carrying a CLR runtime header
    Managed,
    /// PE image without managed metadata
    Native,
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageKind::Unknown => "Unknown",
            ImageKind::Managed => "Managed",
            ImageKind::Native => "Native",
        };
        f.write_str(name)
    }
}

#[self_referencing]
/// Represents a loaded PE image.
///
/// Unlike a full metadata loader, a `File` accepts any valid PE image. Whether the image is
/// managed is reported by [`File::kind`] rather than enforced while loading.
pub struct File {
    /// The underlying data source (memory or file).
    data: Box<dyn Backend>,
    /// The parsed PE structure, referencing the data.
    #[borrows(data)]
    #[not_covariant]
    pe: PE<'this>,
}

impl File {
    /// Loads a PE image from the given path.
    ///
    /// The file is memory-mapped for the lifetime of the returned value.
    ///
    /// # Arguments
    ///
    /// * `file` - Path to the PE file on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, is empty or is not a valid PE image.
    pub fn from_file(file: &Path) -> Result<File> {
        let input = Physical::new(file)?;

        Self::load(input)
    }

    /// Loads a PE image from a memory buffer.
    ///
    /// # Arguments
    ///
    /// * `data` - The bytes of the PE file.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is empty or is not a valid PE image.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        let input = Memory::new(data);

        Self::load(input)
    }

    fn load<T: Backend + 'static>(data: T) -> Result<File> {
        if data.len() == 0 {
            return Err(Empty);
        }

        let data = Box::new(data);

        File::try_new(data, |data| PE::parse(data.data()).map_err(GoblinErr))
    }

    /// Returns the total size of the loaded image in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.with_data(|data| data.len())
    }

    /// Returns `true` if the image has a length of zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the RVA and size of the CLR runtime header, if the image has one.
    #[must_use]
    pub fn clr(&self) -> Option<(usize, usize)> {
        self.with_pe(|pe| {
            let optional_header = pe.header.optional_header?;
            let clr = optional_header.data_directories.get_clr_runtime_header()?;

            if clr.virtual_address == 0 || clr.size == 0 {
                return None;
            }

            Some((clr.virtual_address as usize, clr.size as usize))
        })
    }

    /// Classifies the image as managed or native.
    #[must_use]
    pub fn kind(&self) -> ImageKind {
        if self.clr().is_some() {
            ImageKind::Managed
        } else {
            ImageKind::Native
        }
    }
}

/// Classifies the PE image at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid PE image.
pub fn classify_image(path: &Path) -> Result<ImageKind> {
    let file = File::from_file(path)?;
    Ok(file.kind())
}
