use std::{fmt, fmt::Write as _, str::FromStr};

use crate::{
    metadata::identity::cryptographic::{HashAlgorithm, StrongName},
    Error, Result,
};

/// Identity of an assembly, as rendered into registration type information.
///
/// Equality covers every component including the strong name, which makes two reads of the
/// same module compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssemblyIdentity {
    /// Simple assembly name
    pub name: String,
    /// Four-part assembly version
    pub version: AssemblyVersion,
    /// Culture, `None` for culture-neutral assemblies
    pub culture: Option<String>,
    /// Public key or token, `None` for assemblies without a strong name
    pub strong_name: Option<StrongName>,
}

/// Four-part assembly version `major.minor.build.revision`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AssemblyVersion {
    /// Major version
    pub major: u16,
    /// Minor version
    pub minor: u16,
    /// Build number
    pub build: u16,
    /// Revision number
    pub revision: u16,
}

impl AssemblyIdentity {
    /// Create a culture-neutral identity without a strong name.
    ///
    /// # Arguments
    /// * `name` - The simple assembly name
    /// * `version` - The assembly version
    pub fn new(name: impl Into<String>, version: AssemblyVersion) -> Self {
        Self {
            name: name.into(),
            version,
            culture: None,
            strong_name: None,
        }
    }

    /// Attach a strong name to this identity.
    #[must_use]
    pub fn with_strong_name(mut self, strong_name: StrongName) -> Self {
        self.strong_name = Some(strong_name);
        self
    }

    /// Attach a culture to this identity.
    #[must_use]
    pub fn with_culture(mut self, culture: impl Into<String>) -> Self {
        self.culture = Some(culture.into());
        self
    }

    /// Parse an assembly display name.
    ///
    /// Accepts `Name[, Version=a.b.c.d][, Culture=xx][, PublicKeyToken=hex|null]`. Unknown
    /// components are ignored.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the name is empty, the version is not a valid
    /// version or the token is not 16 hex digits.
    pub fn parse(display_name: &str) -> Result<Self> {
        let mut parts = display_name.split(',').map(str::trim);

        let name = parts.next().unwrap_or_default();
        if name.is_empty() {
            return Err(malformed_error!("Assembly name cannot be empty"));
        }

        let mut identity = AssemblyIdentity::new(name, AssemblyVersion::default());

        for part in parts {
            if let Some(value) = part.strip_prefix("Version=") {
                identity.version = AssemblyVersion::parse(value)?;
            } else if let Some(value) = part.strip_prefix("Culture=") {
                if value != "neutral" {
                    identity.culture = Some(value.to_string());
                }
            } else if let Some(value) = part.strip_prefix("PublicKeyToken=") {
                if value != "null" && !value.is_empty() {
                    if value.len() != 16 {
                        return Err(malformed_error!(
                            "PublicKeyToken must be 16 hex characters, got '{}'",
                            value
                        ));
                    }

                    let token = u64::from_str_radix(value, 16).map_err(|e| {
                        malformed_error!("Invalid hex in PublicKeyToken '{}': {}", value, e)
                    })?;
                    identity.strong_name = Some(StrongName::Token(token));
                }
            }
        }

        Ok(identity)
    }

    /// Render the full display name, e.g.
    /// `Widgets, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null`.
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut result = String::with_capacity(self.name.len() + 80);

        result.push_str(&self.name);

        let _ = write!(result, ", Version={}", self.version);

        let culture_str = self.culture.as_deref().unwrap_or("neutral");
        let _ = write!(result, ", Culture={culture_str}");

        result.push_str(", PublicKeyToken=");
        match self
            .strong_name
            .as_ref()
            .map(|name| name.to_token(HashAlgorithm::Sha1))
        {
            Some(Ok(token)) => {
                let _ = write!(result, "{token:016x}");
            }
            _ => result.push_str("null"),
        }

        result
    }

    /// Returns `true` if the assembly carries a public key or token.
    #[must_use]
    pub fn is_strong_named(&self) -> bool {
        self.strong_name.is_some()
    }
}

impl AssemblyVersion {
    /// Create a version from its four components.
    #[must_use]
    pub const fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }

    /// Parse a dotted version string with one to four components.
    ///
    /// Missing components are zero.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if there are more than four components or any of
    /// them is not a `u16`.
    pub fn parse(version_str: &str) -> Result<Self> {
        let parts: Vec<&str> = version_str.split('.').collect();

        if parts.len() > 4 {
            return Err(malformed_error!("Invalid version format: {}", version_str));
        }

        let mut components = [0u16; 4];

        for (i, part) in parts.iter().enumerate() {
            components[i] = part
                .parse::<u16>()
                .map_err(|_| malformed_error!("Invalid version component: {}", part))?;
        }

        Ok(Self::new(
            components[0],
            components[1],
            components[2],
            components[3],
        ))
    }
}

impl fmt::Display for AssemblyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

impl fmt::Display for AssemblyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

impl FromStr for AssemblyVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl FromStr for AssemblyIdentity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
