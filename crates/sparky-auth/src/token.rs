//! JWT issuance and validation.
//!
//! Tokens are HS512-signed with the configured secret. The claims carry
//! everything needed to rebuild an [`AuthenticationContext`] without a
//! store round trip: subject, realm and the single role authority.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sparky_core::TokenSettings;
use sparky_model::{Realm, UserRecord};
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use crate::principal::{AuthenticationContext, TokenPrincipal};

const ALGORITHM: Algorithm = Algorithm::HS512;

/// Claims of an issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username).
    pub sub: String,
    /// Realm of the subject.
    pub realm: Realm,
    /// Authority strings.
    pub authorities: Vec<String>,
    /// Issuer.
    pub iss: String,
    /// Issued at (seconds since epoch).
    pub iat: i64,
    /// Expiration (seconds since epoch).
    pub exp: i64,
    /// Token id.
    pub jti: String,
}

impl Claims {
    /// Converts the claims into an authentication context.
    #[must_use]
    pub fn authentication_context(&self) -> AuthenticationContext {
        AuthenticationContext::new(self.sub.clone(), self.authorities.clone()).with_realm(self.realm)
    }

    /// Returns the name and realm carried by the token.
    #[must_use]
    pub fn token_principal(&self) -> TokenPrincipal {
        TokenPrincipal {
            username: self.sub.clone(),
            realm: self.realm,
        }
    }

    /// Returns the expiration as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// An encoded token and its expiration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    /// Encoded JWT.
    pub token: String,
    /// Expiration time.
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    lifespan: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &ALGORITHM)
            .field("keys", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("lifespan", &self.lifespan)
            .finish()
    }
}

impl TokenService {
    /// Creates a token service from settings.
    #[must_use]
    pub fn from_settings(settings: &TokenSettings) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.secret.as_bytes()),
            issuer: settings.issuer.clone(),
            lifespan: Duration::seconds(settings.lifespan_secs),
        }
    }

    /// Returns the issuer claim.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Issues a token for a user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if signing fails.
    pub fn issue(&self, user: &UserRecord) -> AuthResult<IssuedToken> {
        self.issue_at(user, Utc::now())
    }

    /// Issues a token as of a given instant.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if signing fails.
    pub fn issue_at(&self, user: &UserRecord, now: DateTime<Utc>) -> AuthResult<IssuedToken> {
        let mut expires_at = now + self.lifespan;
        // A token never outlives the account.
        if let Some(account_expiry) = user.expiration_time() {
            expires_at = expires_at.min(account_expiry);
        }

        let claims = Claims {
            sub: user.username().to_string(),
            realm: user.realm(),
            authorities: vec![user.role().authority().to_string()],
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let mut header = Header::new(ALGORITHM);
        header.typ = Some("JWT".to_string());

        let token = encode(&header, &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("token signing failed: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Validates a raw token and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for bad signatures, expired tokens,
    /// foreign issuers and malformed input.
    pub fn verify(&self, raw: &str) -> AuthResult<Claims> {
        let mut validation = Validation::new(ALGORITHM);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_exp = true;

        decode::<Claims>(raw, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}
