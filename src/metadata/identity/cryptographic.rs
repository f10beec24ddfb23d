//! Strong-name identity of an assembly.

use crate::{file::io::read_le, Result};

use md5::{Digest, Md5};
use sha1::Sha1;

/// Hash algorithm used to derive a public key token, as stored in the Assembly table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    /// CALG_MD5
    Md5,
    /// CALG_SHA1, the algorithm used for all display names
    #[default]
    Sha1,
}

impl HashAlgorithm {
    /// Maps the raw `HashAlgId` of the Assembly table.
    ///
    /// Returns `None` for algorithms that cannot be used for token derivation.
    #[must_use]
    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            0x8003 => Some(HashAlgorithm::Md5),
            0x8004 => Some(HashAlgorithm::Sha1),
            _ => None,
        }
    }
}

/// The strong-name part of an assembly identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StrongName {
    /// The full public key blob
    PublicKey(Vec<u8>),
    /// The 8-byte public key token, little-endian
    Token(u64),
}

impl StrongName {
    /// Returns the public key token, hashing the public key with `algo` if needed.
    ///
    /// The token is the last 8 bytes of the hash, read as a little-endian integer.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the hash output is shorter than 8 bytes.
    pub fn to_token(&self, algo: HashAlgorithm) -> Result<u64> {
        match self {
            StrongName::PublicKey(data) => match algo {
                HashAlgorithm::Md5 => {
                    let mut hasher = Md5::new();
                    hasher.update(data);

                    let result = hasher.finalize();

                    read_le::<u64>(&result[result.len() - 8..])
                }
                HashAlgorithm::Sha1 => {
                    let mut hasher = Sha1::new();
                    hasher.update(data);

                    let result = hasher.finalize();

                    read_le::<u64>(&result[result.len() - 8..])
                }
            },
            StrongName::Token(token) => Ok(*token),
        }
    }
}
