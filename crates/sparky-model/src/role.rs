//! User roles and their authority strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Capability level of a user.
///
/// Every user carries exactly one role. Authorization checks and issued
/// tokens use the authority form (`ROLE_ADMIN`), transfer objects the bare
/// name (`ADMIN`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    /// Regular user. May read and edit its own account.
    #[default]
    Default,
    /// Administrator. May manage every account.
    Admin,
    /// Machine principal.
    Service,
}

impl UserRole {
    /// Prefix shared by all authority strings.
    pub const AUTHORITY_PREFIX: &'static str = "ROLE_";

    /// All roles.
    pub const ALL: [Self; 3] = [Self::Default, Self::Admin, Self::Service];

    /// Returns the bare role name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Default => "DEFAULT",
            Self::Admin => "ADMIN",
            Self::Service => "SERVICE",
        }
    }

    /// Returns the authority string for this role.
    #[must_use]
    pub const fn authority(&self) -> &'static str {
        match self {
            Self::Default => "ROLE_DEFAULT",
            Self::Admin => "ROLE_ADMIN",
            Self::Service => "ROLE_SERVICE",
        }
    }

    /// Parses an authority string.
    ///
    /// Both the prefixed authority (`ROLE_ADMIN`) and the bare name
    /// (`ADMIN`) are accepted. Matching is exact.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownRole`] for any other input. Unknown
    /// authorities are never mapped to [`UserRole::Default`].
    pub fn from_authority(authority: &str) -> ModelResult<Self> {
        let name = authority
            .strip_prefix(Self::AUTHORITY_PREFIX)
            .unwrap_or(authority);
        Self::ALL
            .into_iter()
            .find(|role| role.name() == name)
            .ok_or_else(|| ModelError::UnknownRole(authority.to_string()))
    }

    /// Checks whether this role grants administrative access.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UserRole {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_authority(s)
    }
}
