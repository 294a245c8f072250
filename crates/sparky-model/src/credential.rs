//! Stored credentials.

use std::fmt;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};

/// Algorithm that produced a credential representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// Argon2id PHC string.
    Argon2id,
    /// Unhashed secret. Only used for configured in-memory users.
    Plain,
    /// Credential material of unknown origin, captured from an
    /// authentication context. Never verifies.
    Unknown,
}

impl HashAlgorithm {
    /// Returns the algorithm tag.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Argon2id => "argon2id",
            Self::Plain => "plain",
            Self::Unknown => "UNKWN",
        }
    }

    /// Looks up an algorithm by its tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "argon2id" => Some(Self::Argon2id),
            "plain" => Some(Self::Plain),
            "UNKWN" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Immutable password representation plus the algorithm tag used to
/// produce it.
///
/// Two credentials are equal when their representations are equal; the
/// algorithm tag does not take part in equality.
#[derive(Clone)]
pub struct Credential {
    representation: String,
    algorithm: HashAlgorithm,
}

impl Credential {
    /// Creates a credential from an existing representation.
    #[must_use]
    pub fn new(representation: impl Into<String>, algorithm: HashAlgorithm) -> Self {
        Self {
            representation: representation.into(),
            algorithm,
        }
    }

    /// Wraps an Argon2id PHC string.
    #[must_use]
    pub fn argon2id(phc: impl Into<String>) -> Self {
        Self::new(phc, HashAlgorithm::Argon2id)
    }

    /// Wraps an unhashed secret.
    #[must_use]
    pub fn plain(secret: impl Into<String>) -> Self {
        Self::new(secret, HashAlgorithm::Plain)
    }

    /// Wraps credential material whose algorithm is not known.
    #[must_use]
    pub fn unknown(material: impl Into<String>) -> Self {
        Self::new(material, HashAlgorithm::Unknown)
    }

    /// Returns the stored representation.
    #[must_use]
    pub fn representation(&self) -> &str {
        &self.representation
    }

    /// Returns the algorithm tag.
    #[must_use]
    pub const fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Checks a plaintext password against this credential.
    ///
    /// Malformed Argon2 hashes and [`HashAlgorithm::Unknown`] credentials
    /// never verify.
    #[must_use]
    pub fn verify(&self, plaintext: &str) -> bool {
        match self.algorithm {
            HashAlgorithm::Argon2id => PasswordHash::new(&self.representation)
                .is_ok_and(|hash| {
                    Argon2::default()
                        .verify_password(plaintext.as_bytes(), &hash)
                        .is_ok()
                }),
            HashAlgorithm::Plain => self.representation == plaintext,
            HashAlgorithm::Unknown => false,
        }
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.representation == other.representation
    }
}

impl Eq for Credential {}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("representation", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}
