//! Identity realms.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Identity source that owns a user's authoritative record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Realm {
    /// Users stored by this service.
    Local,
    /// Users managed by an LDAP directory.
    Ldap,
    /// Users configured in process memory (service accounts).
    Memory,
    /// Placeholder for principals whose source could not be determined.
    Unknown,
}

impl Realm {
    /// Realm used when a caller does not name one.
    pub const DEFAULT: Self = Self::Local;

    /// All realms.
    pub const ALL: [Self; 4] = [Self::Local, Self::Ldap, Self::Memory, Self::Unknown];

    /// Returns the canonical (upper case) realm name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "LOCAL",
            Self::Ldap => "LDAP",
            Self::Memory => "MEMORY",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Realm {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|realm| realm.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ModelError::UnknownRealm(s.to_string()))
    }
}

impl TryFrom<String> for Realm {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
