//! Cursor-based reader for metadata blobs.
//!
//! [`crate::file::parser::Parser`] wraps a byte slice and a position. Every read is bounds
//! checked and advances the cursor, which makes it a natural fit for the sequential layout of
//! ECMA-335 blobs: custom attribute prologs, compressed lengths, serialized strings and the
//! primitive values that follow them.
//!
//! # Examples
//!
//! ```rust
//! use comscope::Parser;
//!
//! // Prolog, followed by a serialized string "Hi"
//! let data = [0x01, 0x00, 0x02, b'H', b'i'];
//! let mut parser = Parser::new(&data);
//!
//! assert_eq!(parser.read_le::<u16>()?, 0x0001);
//! assert_eq!(parser.read_compressed_string_utf8()?, "Hi");
//! assert!(!parser.has_more_data());
//! # Ok::<(), comscope::Error>(())
//! ```

use crate::{
    file::io::{read_le_at, CilIO},
    Error::OutOfBounds,
    Result,
};

/// A generic binary data parser for reading ECMA-335 blob structures.
///
/// `Parser` maintains an internal position cursor and provides bounds checking to prevent
/// buffer overruns when reading malformed or truncated data. A failed read leaves the cursor
/// where it was.
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`crate::file::parser::Parser`] from a byte slice.
    ///
    /// # Arguments
    /// * `data` - The byte slice to read from
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there are unread bytes left.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Returns the current position of the cursor.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Returns the number of unread bytes.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Move the cursor to an absolute position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `pos` lies beyond the end of the data.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(OutOfBounds);
        }

        self.position = pos;
        Ok(())
    }

    /// Returns the byte at the cursor without consuming it.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if no data is left.
    pub fn peek_byte(&self) -> Result<u8> {
        match self.data.get(self.position) {
            Some(byte) => Ok(*byte),
            None => Err(OutOfBounds),
        }
    }

    /// Read a primitive value in little-endian and advance the cursor.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if not enough data is left.
    pub fn read_le<T: CilIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Read a compressed unsigned integer (ECMA-335 II.23.2).
    ///
    /// The encoding uses one, two or four bytes depending on the high bits of the first byte.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the encoding is truncated or
    /// [`crate::Error::Malformed`] if the first byte does not start a valid encoding.
    pub fn read_compressed_uint(&mut self) -> Result<u32> {
        let start = self.position;
        let first_byte = self.read_le::<u8>()?;

        // 1-byte encoding: 0xxxxxxx
        if (first_byte & 0x80) == 0 {
            return Ok(u32::from(first_byte));
        }

        let result = if (first_byte & 0xC0) == 0x80 {
            // 2-byte encoding: 10xxxxxx xxxxxxxx
            self.read_le::<u8>()
                .map(|second| ((u32::from(first_byte) & 0x3F) << 8) | u32::from(second))
        } else if (first_byte & 0xE0) == 0xC0 {
            // 4-byte encoding: 110xxxxx xxxxxxxx xxxxxxxx xxxxxxxx
            self.read_bytes(3).map(|rest| {
                ((u32::from(first_byte) & 0x1F) << 24)
                    | (u32::from(rest[0]) << 16)
                    | (u32::from(rest[1]) << 8)
                    | u32::from(rest[2])
            })
        } else {
            Err(malformed_error!("Invalid compressed uint - 0x{:02X}", first_byte))
        };

        if result.is_err() {
            self.position = start;
        }
        result
    }

    /// Read a compressed length followed by that many bytes of UTF-8.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the string is truncated or
    /// [`crate::Error::Malformed`] if the bytes are not valid UTF-8.
    pub fn read_compressed_string_utf8(&mut self) -> Result<String> {
        let start = self.position;
        let length = self.read_compressed_uint()? as usize;

        let bytes = match self.read_bytes(length) {
            Ok(bytes) => bytes,
            Err(error) => {
                self.position = start;
                return Err(error);
            }
        };

        String::from_utf8(bytes.to_vec()).map_err(|e| {
            malformed_error!(
                "Invalid UTF-8 compressed string at offset {}-{}: {}",
                self.position - length,
                self.position,
                e.utf8_error()
            )
        })
    }

    /// Read `length` raw bytes and advance the cursor past them.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `length` bytes are left.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self
            .position
            .checked_add(length)
            .ok_or(OutOfBounds)?;

        if end > self.data.len() {
            return Err(OutOfBounds);
        }

        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }
}
