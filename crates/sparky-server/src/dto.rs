//! Request and response bodies of the authentication endpoints.
//!
//! User bodies are the transfer objects of `sparky-model`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sparky_auth::{AuthenticationInfo, IssuedToken};
use sparky_model::UserDto;

/// Login request, accepted as form data or JSON.
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Query of the token verification endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyQuery {
    /// Token to verify.
    pub jwt_token: String,
}

/// Token part of an authentication response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDto {
    /// Encoded JWT.
    pub token: String,
    /// Expiration time.
    pub expiration: DateTime<Utc>,
    /// Always `Bearer`.
    pub token_type: String,
}

impl From<IssuedToken> for TokenDto {
    fn from(token: IssuedToken) -> Self {
        Self {
            token: token.token,
            expiration: token.expires_at,
            token_type: "Bearer".to_string(),
        }
    }
}

/// Result of a login, check or verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticationInfoDto {
    /// The resolved user.
    pub user: UserDto,
    /// The token.
    pub token: TokenDto,
}

impl From<AuthenticationInfo> for AuthenticationInfoDto {
    fn from(info: AuthenticationInfo) -> Self {
        Self {
            user: info.user.to_dto(),
            token: info.token.into(),
        }
    }
}
