//! COM registration data derived from module metadata.
//!
//! This module holds everything between decoded attributes and the final
//! [`RegistrationDescriptor`]: the structural eligibility rules of COM activation, the
//! visibility policy and the per-runtime hosting data.
//!
//! # Key Components
//!
//! - [`is_com_eligible`] - Structural requirements a class must meet to be activatable
//! - [`DescriptorSynthesizer`] - Builds one descriptor per registrable type
//! - [`RegistrationDescriptor`] - Registration data of one class, per hosting runtime
//! - [`paths`] - The `<name>.dll` / `<name>.comhost.dll` file name convention
//!
//! # Examples
//!
//! ```rust
//! use comscope::registration::{Clsid, ServerType, ThreadingModel};
//!
//! let clsid: Clsid = "5b6f0a2e-2d7c-4f7e-9a59-3c8e1a0b6d11".parse()?;
//! assert_eq!(clsid.to_string(), "{5b6f0a2e-2d7c-4f7e-9a59-3c8e1a0b6d11}");
//! assert_eq!(ServerType::from_value(2), Some(ServerType::InprocServer32));
//! assert!(!ThreadingModel::Undefined.is_defined());
//! # Ok::<(), comscope::Error>(())
//! ```

mod descriptor;
mod eligibility;
pub mod paths;
mod synthesizer;
mod types;

pub use descriptor::{
    NativeClass, NetCoreClass, NetFrameworkClass, RegistrationDescriptor, TypeInformation,
};
pub use eligibility::is_com_eligible;
pub use synthesizer::{DescriptorSynthesizer, ModuleContext};
pub use types::{Clsid, ServerType, ThreadingModel};
