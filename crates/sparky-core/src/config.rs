//! Configuration management.
//!
//! Configuration is read from environment variables (after loading an
//! optional `.env` file) with defaults for everything except the token
//! signing secret.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `SPARKY_HOST` | `0.0.0.0` |
//! | `SPARKY_PORT` | `8080` |
//! | `SPARKY_CORS_ORIGINS` | `*` |
//! | `SPARKY_JWT_SECRET` | required |
//! | `SPARKY_JWT_ISSUER` | `sparkyservice` |
//! | `SPARKY_TOKEN_LIFESPAN` | `3600` seconds |
//! | `SPARKY_CROSS_REALM_FALLBACK` | `true` |
//! | `SPARKY_MEMORY_USERS` | none |
//! | `RUST_LOG` | `info` |

use serde::{Deserialize, Serialize};
use sparky_model::UserRole;
use thiserror::Error;

/// Minimum length of the token signing secret in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    /// A variable is set but cannot be used.
    #[error("invalid value for {key}: {reason}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Token issuance settings.
    pub token: TokenSettings,
    /// Identity resolution settings.
    pub identity: IdentitySettings,
    /// Log filter directive.
    pub log_level: String,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Allowed CORS origins. `*` allows any origin.
    pub cors_origins: Vec<String>,
}

/// Token issuance settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenSettings {
    /// HMAC signing secret.
    pub secret: String,
    /// Issuer claim.
    pub issuer: String,
    /// Token lifespan in seconds.
    pub lifespan_secs: i64,
}

impl std::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("lifespan_secs", &self.lifespan_secs)
            .finish()
    }
}

/// Identity resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitySettings {
    /// Whether refresh extraction may fall back to the first stored user
    /// with a matching username in any realm.
    pub cross_realm_fallback: bool,
    /// Users living only in process memory.
    pub memory_users: Vec<MemoryUserSettings>,
}

/// A configured in-memory user.
#[derive(Clone, Serialize, Deserialize)]
pub struct MemoryUserSettings {
    /// Username.
    pub username: String,
    /// Password (stored as given).
    pub password: String,
    /// Role.
    pub role: UserRole,
}

impl std::fmt::Debug for MemoryUserSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryUserSettings")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `SPARKY_JWT_SECRET` is missing or any variable
    /// holds an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("SPARKY_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("SPARKY_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: "SPARKY_PORT",
                reason: format!("'{raw}' is not a port: {e}"),
            })?,
            None => 8080,
        };
        let cors_origins = lookup("SPARKY_CORS_ORIGINS")
            .map(|s| s.split(',').map(str::trim).map(String::from).collect())
            .unwrap_or_else(|| vec!["*".to_string()]);

        let secret = lookup("SPARKY_JWT_SECRET").ok_or(ConfigError::Missing("SPARKY_JWT_SECRET"))?;
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::Invalid {
                key: "SPARKY_JWT_SECRET",
                reason: format!("must be at least {MIN_SECRET_LENGTH} bytes"),
            });
        }
        let issuer = lookup("SPARKY_JWT_ISSUER").unwrap_or_else(|| "sparkyservice".to_string());
        let lifespan_secs = match lookup("SPARKY_TOKEN_LIFESPAN") {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "SPARKY_TOKEN_LIFESPAN",
                        reason: format!("'{raw}' is not a positive number of seconds"),
                    });
                }
            },
            None => 3600,
        };

        let cross_realm_fallback = lookup("SPARKY_CROSS_REALM_FALLBACK")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true);
        let memory_users = match lookup("SPARKY_MEMORY_USERS") {
            Some(raw) => parse_memory_users(&raw)?,
            None => Vec::new(),
        };

        let log_level = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            server: ServerSettings {
                host,
                port,
                cors_origins,
            },
            token: TokenSettings {
                secret,
                issuer,
                lifespan_secs,
            },
            identity: IdentitySettings {
                cross_realm_fallback,
                memory_users,
            },
            log_level,
        })
    }

    /// Creates a configuration for testing.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
            },
            token: TokenSettings {
                secret: "test-secret-that-is-long-enough-for-hs512".to_string(),
                issuer: "sparkyservice-test".to_string(),
                lifespan_secs: 300,
            },
            identity: IdentitySettings {
                cross_realm_fallback: true,
                memory_users: Vec::new(),
            },
            log_level: "debug".to_string(),
        }
    }

    /// Adds an in-memory user.
    #[must_use]
    pub fn with_memory_user(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
        role: UserRole,
    ) -> Self {
        self.identity.memory_users.push(MemoryUserSettings {
            username: username.into(),
            password: password.into(),
            role,
        });
        self
    }

    /// Returns the socket address string to bind to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Parses `name:password:ROLE` entries separated by commas.
///
/// The role part is optional and defaults to `DEFAULT`.
fn parse_memory_users(raw: &str) -> Result<Vec<MemoryUserSettings>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let mut parts = entry.splitn(3, ':');
            let username = parts.next().unwrap_or_default();
            let password = parts.next().unwrap_or_default();
            if username.is_empty() || password.is_empty() {
                return Err(ConfigError::Invalid {
                    key: "SPARKY_MEMORY_USERS",
                    reason: format!("entry '{username}' needs a username and a password"),
                });
            }
            let role = match parts.next() {
                Some(role) => role.parse().map_err(|e: sparky_model::ModelError| {
                    ConfigError::Invalid {
                        key: "SPARKY_MEMORY_USERS",
                        reason: e.to_string(),
                    }
                })?,
                None => UserRole::Default,
            };
            Ok(MemoryUserSettings {
                username: username.to_string(),
                password: password.to_string(),
                role,
            })
        })
        .collect()
}
