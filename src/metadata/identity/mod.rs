//! Assembly identity and strong-name tokens.
//!
//! Registration type information records the full display name of the assembly that defines
//! a component, its version, and whether it is strong-named. This module models exactly that
//! part of ECMA-335 (II.6.2.1.3 for public key tokens, II.22.2 for the Assembly table).
//!
//! # Key Components
//!
//! - [`AssemblyIdentity`] - Name, version, culture and strong name
//! - [`AssemblyVersion`] - Four-part version numbering
//! - [`StrongName`] - Public key or public key token
//! - [`HashAlgorithm`] - Token derivation algorithm
//!
//! # Examples
//!
//! ```rust
//! use comscope::metadata::identity::{AssemblyIdentity, AssemblyVersion};
//!
//! let identity = AssemblyIdentity::new("Widgets", AssemblyVersion::new(1, 0, 0, 0));
//! assert_eq!(
//!     identity.display_name(),
//!     "Widgets, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null"
//! );
//! ```

mod assembly;
mod cryptographic;

pub use assembly::{AssemblyIdentity, AssemblyVersion};
pub use cryptographic::{HashAlgorithm, StrongName};
