//! Domain enums and identifiers shared by descriptors and attributes.

use std::{fmt, str::FromStr};

use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// How a COM class is hosted.
///
/// Discriminants match `ComponentServerType`, as declared through
/// `ComponentServerTypeAttribute`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[repr(i32)]
pub enum ServerType {
    /// Not declared, never persisted
    #[default]
    Undefined = 0,
    /// 16-bit in-process server
    InprocServer = 1,
    /// In-process server
    InprocServer32 = 2,
    /// 16-bit local server
    LocalServer = 3,
    /// Out-of-process server
    LocalServer32 = 4,
}

/// COM apartment compatibility of a class.
///
/// Discriminants match `ComponentThreadingModel`, as declared through
/// `ComponentThreadingModelAttribute`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[repr(i32)]
pub enum ThreadingModel {
    /// Not declared, never persisted
    #[default]
    Undefined = 0,
    /// Single-threaded apartment
    Apartment = 1,
    /// Single- or multi-threaded apartment
    Both = 2,
    /// Multi-threaded apartment
    Free = 3,
    /// Neutral apartment
    Neutral = 4,
}

macro_rules! impl_component_enum {
    ($ty:ty) => {
        impl $ty {
            /// Maps a raw enum value to its variant, `None` for unnamed values.
            #[must_use]
            pub fn from_value(value: i64) -> Option<Self> {
                Self::iter().find(|variant| variant.value() == value)
            }

            /// Returns the raw enum value.
            #[must_use]
            pub fn value(self) -> i64 {
                i64::from(self as i32)
            }

            /// Returns `true` unless this is the `Undefined` sentinel.
            #[must_use]
            pub fn is_defined(self) -> bool {
                self != Self::Undefined
            }

            /// Constant table of this enum, as `(name, value)` pairs.
            pub fn constants() -> impl Iterator<Item = (&'static str, i64)> {
                Self::iter().map(|variant| (<&'static str>::from(variant), variant.value()))
            }
        }
    };
}

impl_component_enum!(ServerType);
impl_component_enum!(ThreadingModel);

/// A COM class identifier.
///
/// Displays in registry form, `{xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clsid(pub uguid::Guid);

impl Clsid {
    /// Parses a GUID with or without surrounding braces.
    ///
    /// Returns `None` if the string is not a hyphenated 128-bit identifier.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        let inner = trimmed
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .unwrap_or(trimmed);

        uguid::Guid::try_parse(inner).ok().map(Clsid)
    }

    /// Returns the wrapped GUID.
    #[must_use]
    pub fn guid(&self) -> uguid::Guid {
        self.0
    }
}

impl From<uguid::Guid> for Clsid {
    fn from(guid: uguid::Guid) -> Self {
        Clsid(guid)
    }
}

impl FromStr for Clsid {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Clsid::parse(s).ok_or_else(|| crate::Error::InvalidClsid {
            type_name: String::new(),
            value: s.to_string(),
        })
    }
}

impl fmt::Display for Clsid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0)
    }
}
