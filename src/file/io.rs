//! Little-endian reading and writing of primitive values.
//!
//! Custom attribute blobs, public key tokens and every other binary structure this crate
//! touches are little-endian. The [`crate::file::io::CilIO`] trait gives the primitive types a
//! common interface so that [`crate::file::parser::Parser`] and the attribute encoder can be
//! generic over the value being read or written.
//!
//! # Key Components
//!
//! - [`crate::file::io::CilIO`] - Endian-aware conversion for primitive types
//! - [`crate::file::io::read_le`] - Read a value from the start of a buffer
//! - [`crate::file::io::read_le_at`] - Read a value at an offset, advancing the offset
//! - [`crate::file::io::write_le`] - Append a value to a growable buffer
//! - [`crate::file::io::write_compressed_uint`] - Append an ECMA-335 compressed integer
//!
//! # Examples
//!
//! ```rust,ignore
//! use comscope::file::io::{read_le_at, write_le};
//!
//! let mut buffer = Vec::new();
//! write_le(&mut buffer, 0x0001_u16);
//! write_le(&mut buffer, -1_i32);
//!
//! let mut offset = 0;
//! assert_eq!(read_le_at::<u16>(&buffer, &mut offset)?, 1);
//! assert_eq!(read_le_at::<i32>(&buffer, &mut offset)?, -1);
//! # Ok::<(), comscope::Error>(())
//! ```

use crate::{Error::OutOfBounds, Result};

/// Trait for implementing type specific safe readers and writers
///
/// Implemented for the fixed-width integer and floating point types that can appear in
/// metadata blobs. The associated `Bytes` array is what the value is converted to and from.
pub trait CilIO: Sized {
    /// Byte array representation of this type
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Read T from a byte buffer in little-endian
    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    /// Convert T into its little-endian byte representation
    fn to_le_bytes(self) -> Self::Bytes;
}

macro_rules! impl_cil_io {
    ($($ty:ty),*) => {
        $(
            impl CilIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }
            }
        )*
    };
}

impl_cil_io!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// Safely reads T in little-endian from the start of a data buffer
///
/// ## Arguments
/// * 'data' - The data buffer to read from
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the buffer is shorter than `T`.
pub fn read_le<T: CilIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Safely reads T in little-endian from a data buffer at `offset`, advancing the offset
///
/// ## Arguments
/// * 'data'    - The data buffer to read from
/// * 'offset'  - The offset to read from, incremented by the size of `T` on success
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain.
pub fn read_le_at<T: CilIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };

    if end > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;

    Ok(T::from_le_bytes(read))
}

/// Appends T in little-endian to a growable buffer
///
/// ## Arguments
/// * 'buffer'  - The buffer to extend
/// * 'value'   - The value to write
pub fn write_le<T: CilIO>(buffer: &mut Vec<u8>, value: T) {
    buffer.extend_from_slice(value.to_le_bytes().as_ref());
}

/// Appends a compressed unsigned integer (ECMA-335 II.23.2) to a growable buffer
///
/// ## Arguments
/// * 'buffer'  - The buffer to extend
/// * 'value'   - The value to write, at most `0x1FFF_FFFF`
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if the value does not fit the 4-byte encoding.
pub fn write_compressed_uint(buffer: &mut Vec<u8>, value: u32) -> Result<()> {
    #[allow(clippy::cast_possible_truncation)]
    match value {
        0..=0x7F => buffer.push(value as u8),
        0x80..=0x3FFF => {
            buffer.push(((value >> 8) as u8) | 0x80);
            buffer.push(value as u8);
        }
        0x4000..=0x1FFF_FFFF => {
            buffer.push(((value >> 24) as u8) | 0xC0);
            buffer.push((value >> 16) as u8);
            buffer.push((value >> 8) as u8);
            buffer.push(value as u8);
        }
        _ => {
            return Err(malformed_error!(
                "Value 0x{:X} is too large for a compressed integer",
                value
            ))
        }
    }

    Ok(())
}
