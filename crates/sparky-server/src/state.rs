//! Application state management.
//!
//! This module defines the shared state that is passed to all request handlers.

use std::sync::Arc;

use sparky_auth::{
    DirectoryAuthenticator, ExtractorConfig, FactoryRegistry, IdentityExtractor, LoginService,
    MemoryRealm, PasswordHasherService, TokenService, UserService,
};
use sparky_core::Config;
use sparky_storage::UserStore;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Configuration.
    pub config: Arc<Config>,
    /// Login and token checks.
    pub login: LoginService,
    /// Account management.
    pub users: UserService,
}

impl AppState {
    /// Wires the services around a user store.
    ///
    /// # Errors
    ///
    /// Fails if the configured memory users cannot be built.
    pub fn new(
        config: Config,
        store: Arc<dyn UserStore>,
        directory: Option<Arc<dyn DirectoryAuthenticator>>,
    ) -> anyhow::Result<Self> {
        let factories = Arc::new(FactoryRegistry::with_defaults());
        let extractor = IdentityExtractor::new(
            store.clone(),
            factories.clone(),
            ExtractorConfig {
                cross_realm_fallback: config.identity.cross_realm_fallback,
            },
        );
        if !config.identity.cross_realm_fallback {
            tracing::info!("Cross-realm fallback disabled");
        }

        let memory = Arc::new(MemoryRealm::from_settings(&config.identity.memory_users, &factories)?);
        let hasher = Arc::new(PasswordHasherService::default());
        let tokens = Arc::new(TokenService::from_settings(&config.token));

        let mut login = LoginService::new(store.clone(), extractor.clone(), memory, hasher.clone(), tokens);
        if let Some(directory) = directory {
            login = login.with_directory(directory);
        }
        let users = UserService::new(store, extractor, hasher);

        Ok(Self {
            config: Arc::new(config),
            login,
            users,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}
