//! Password hashing and verification using Argon2id.
//!
//! New local users and password changes always get an Argon2id PHC string.
//! Verification dispatches on the credential's algorithm tag, so plain
//! credentials of configured memory users are accepted as well.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, SaltString, rand_core::OsRng},
};
use sparky_model::{Credential, HashAlgorithm};

use crate::error::{AuthError, AuthResult};

/// Password hashing configuration.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Time cost (iterations).
    pub time_cost: u32,
    /// Parallelism factor.
    pub parallelism: u32,
    /// Output hash length.
    pub hash_length: u32,
    /// Minimum number of characters of a new password.
    pub min_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        // OWASP recommended settings for Argon2id
        Self {
            memory_cost: 19 * 1024, // 19 MiB
            time_cost: 2,
            parallelism: 1,
            hash_length: 32,
            min_length: 1,
        }
    }
}

impl PasswordPolicy {
    /// Creates a new password policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the memory cost in KiB.
    #[must_use]
    pub const fn memory_cost(mut self, kib: u32) -> Self {
        self.memory_cost = kib;
        self
    }

    /// Sets the time cost (iterations).
    #[must_use]
    pub const fn time_cost(mut self, iterations: u32) -> Self {
        self.time_cost = iterations;
        self
    }

    /// Sets the parallelism factor.
    #[must_use]
    pub const fn parallelism(mut self, p: u32) -> Self {
        self.parallelism = p;
        self
    }

    /// Sets the minimum password length.
    #[must_use]
    pub const fn min_length(mut self, chars: usize) -> Self {
        self.min_length = chars;
        self
    }

    fn build_params(&self) -> Result<Params, argon2::Error> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(self.hash_length as usize),
        )
    }
}

/// Password hasher using Argon2id.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasherService {
    policy: PasswordPolicy,
}

impl PasswordHasherService {
    /// Creates a new password hasher with the given policy.
    #[must_use]
    pub const fn new(policy: PasswordPolicy) -> Self {
        Self { policy }
    }

    /// Returns the active policy.
    #[must_use]
    pub const fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    /// Checks a new password against the policy.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the password is too short.
    pub fn validate(&self, password: &str) -> AuthResult<()> {
        let length = password.chars().count();
        if length < self.policy.min_length {
            return Err(AuthError::WeakPassword(format!(
                "at least {} characters required",
                self.policy.min_length
            )));
        }
        Ok(())
    }

    /// Hashes a password.
    ///
    /// Returns the PHC-formatted hash string.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing fails.
    pub fn hash(&self, password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        let params = self
            .policy
            .build_params()
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(hash.to_string())
    }

    /// Validates and hashes a new password into a credential.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` for policy violations and
    /// `AuthError::Internal` if hashing fails.
    pub fn hash_credential(&self, password: &str) -> AuthResult<Credential> {
        self.validate(password)?;
        Ok(Credential::argon2id(self.hash(password)?))
    }

    /// Verifies a password against a stored credential.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if verification fails.
    pub fn verify(&self, password: &str, credential: &Credential) -> AuthResult<()> {
        if credential.verify(password) {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Checks if a credential should be re-hashed on the next successful
    /// login.
    ///
    /// Plain credentials are never upgraded; they belong to configured
    /// memory users that are not stored.
    #[must_use]
    pub fn needs_rehash(&self, credential: &Credential) -> bool {
        if credential.algorithm() != HashAlgorithm::Argon2id {
            return false;
        }
        let Ok(parsed) = PasswordHash::new(credential.representation()) else {
            return true;
        };

        if parsed.algorithm != argon2::ARGON2ID_IDENT {
            return true;
        }

        let params = &parsed.params;
        let m_cost = params.get_decimal("m").unwrap_or(0);
        let t_cost = params.get_decimal("t").unwrap_or(0);
        let p_cost = params.get_decimal("p").unwrap_or(0);

        m_cost != self.policy.memory_cost
            || t_cost != self.policy.time_cost
            || p_cost != self.policy.parallelism
    }
}
