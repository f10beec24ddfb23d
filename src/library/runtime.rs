//! Target runtime classification.
//!
//! Compilers record the framework a module was built for in a `TargetFrameworkAttribute`
//! on the assembly, as a framework name such as `.NETCoreApp,Version=v3.1`. Only the
//! identifier matters for registration: it decides how a class is hosted.

use std::{fmt, str::FromStr};

use crate::{Error, Result};

/// Framework identifier of the .NET Framework
pub const NET_FRAMEWORK_IDENTIFIER: &str = ".NETFramework";

/// Framework identifier of .NET Core and .NET 5 and later
pub const NET_CORE_IDENTIFIER: &str = ".NETCoreApp";

/// Runtime family a module targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TargetRuntime {
    /// No `TargetFrameworkAttribute` on the assembly
    #[default]
    Unknown,
    /// .NET Framework, hosted through `mscoree.dll`
    NetFramework,
    /// .NET Core, hosted through `<name>.comhost.dll`
    NetCore,
}

impl TargetRuntime {
    /// Maps a framework identifier to its runtime family.
    ///
    /// The comparison is exact, identifiers are case-sensitive.
    #[must_use]
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        match identifier {
            NET_FRAMEWORK_IDENTIFIER => Some(TargetRuntime::NetFramework),
            NET_CORE_IDENTIFIER => Some(TargetRuntime::NetCore),
            _ => None,
        }
    }
}

impl fmt::Display for TargetRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetRuntime::Unknown => "Unknown",
            TargetRuntime::NetFramework => "NetFramework",
            TargetRuntime::NetCore => "NetCore",
        };
        f.write_str(name)
    }
}

/// Version component of a framework name, two to four numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameworkVersion {
    /// Major version
    pub major: u32,
    /// Minor version
    pub minor: u32,
    /// Build number, if declared
    pub build: Option<u32>,
    /// Revision number, if declared
    pub revision: Option<u32>,
}

impl FrameworkVersion {
    /// Create a two-component version.
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            build: None,
            revision: None,
        }
    }

    /// Parse `major.minor[.build[.revision]]`, with an optional leading `v`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for fewer than two or more than four components,
    /// or a component that is not a number.
    pub fn parse(version: &str) -> Result<Self> {
        let digits = version
            .strip_prefix('v')
            .or_else(|| version.strip_prefix('V'))
            .unwrap_or(version);

        let components = digits
            .split('.')
            .map(|part| {
                part.parse::<u32>()
                    .map_err(|_| malformed_error!("Invalid framework version '{}'", version))
            })
            .collect::<Result<Vec<u32>>>()?;

        match components.as_slice() {
            [major, minor] => Ok(Self::new(*major, *minor)),
            [major, minor, build] => Ok(Self {
                build: Some(*build),
                ..Self::new(*major, *minor)
            }),
            [major, minor, build, revision] => Ok(Self {
                major: *major,
                minor: *minor,
                build: Some(*build),
                revision: Some(*revision),
            }),
            _ => Err(malformed_error!(
                "Framework version '{}' needs two to four components",
                version
            )),
        }
    }
}

impl fmt::Display for FrameworkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(build) = self.build {
            write!(f, ".{build}")?;
            if let Some(revision) = self.revision {
                write!(f, ".{revision}")?;
            }
        }
        Ok(())
    }
}

/// A parsed framework name, `<identifier>,Version=v<version>[,Profile=<profile>]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameworkName {
    /// Framework identifier, e.g. `.NETCoreApp`
    pub identifier: String,
    /// Framework version
    pub version: FrameworkVersion,
    /// Profile, e.g. `Client`, if declared
    pub profile: Option<String>,
}

impl FrameworkName {
    /// Parse a framework name.
    ///
    /// Keys are matched case-insensitively, whitespace around components is ignored.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the identifier is empty, the version is missing
    /// or invalid, or a component is not a known `key=value` pair.
    ///
    /// ```rust
    /// use comscope::library::FrameworkName;
    ///
    /// let name = FrameworkName::parse(".NETFramework,Version=v4.7.2,Profile=Client")?;
    /// assert_eq!(name.identifier, ".NETFramework");
    /// assert_eq!(name.version.to_string(), "4.7.2");
    /// assert_eq!(name.profile.as_deref(), Some("Client"));
    /// # Ok::<(), comscope::Error>(())
    /// ```
    pub fn parse(name: &str) -> Result<Self> {
        let mut components = name.split(',');

        let identifier = components.next().map(str::trim).unwrap_or_default();
        if identifier.is_empty() {
            return Err(malformed_error!("Framework name '{}' has no identifier", name));
        }

        let mut version = None;
        let mut profile = None;

        for component in components {
            let Some((key, value)) = component.split_once('=') else {
                return Err(malformed_error!(
                    "Invalid component '{}' in framework name '{}'",
                    component,
                    name
                ));
            };

            let (key, value) = (key.trim(), value.trim());
            if key.eq_ignore_ascii_case("Version") && version.is_none() {
                version = Some(FrameworkVersion::parse(value)?);
            } else if key.eq_ignore_ascii_case("Profile") && profile.is_none() {
                if !value.is_empty() {
                    profile = Some(value.to_string());
                }
            } else {
                return Err(malformed_error!(
                    "Unexpected key '{}' in framework name '{}'",
                    key,
                    name
                ));
            }
        }

        let version =
            version.ok_or_else(|| malformed_error!("Framework name '{}' has no version", name))?;

        Ok(Self {
            identifier: identifier.to_string(),
            version,
            profile,
        })
    }

    /// Runtime family of this framework, `None` if the identifier is not recognized.
    #[must_use]
    pub fn runtime(&self) -> Option<TargetRuntime> {
        TargetRuntime::from_identifier(&self.identifier)
    }
}

impl fmt::Display for FrameworkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},Version=v{}", self.identifier, self.version)?;
        if let Some(profile) = &self.profile {
            write!(f, ",Profile={profile}")?;
        }
        Ok(())
    }
}

impl FromStr for FrameworkName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
