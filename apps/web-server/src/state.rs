//! Application state - shared across all handlers.

use std::sync::Arc;

use inkwell_core::ports::TokenService;
use inkwell_core::services::{BlogService, Repositories};
use inkwell_infra::{Argon2PasswordService, InMemoryStore, JwtConfig, JwtTokenService};

#[cfg(feature = "postgres")]
use inkwell_infra::DatabaseConnections;

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub blog: BlogService,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<Argon2PasswordService>,
    pub secure_cookies: bool,
}

impl AppState {
    /// Build the application state, falling back to the in-memory store when
    /// no database is configured or reachable.
    pub async fn new(config: &AppConfig) -> Self {
        #[cfg(feature = "postgres")]
        let repos: Repositories = match &config.database {
            Some(db_config) => match DatabaseConnections::init(db_config).await {
                Ok(connections) => connections.repositories(),
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                    Arc::new(InMemoryStore::new()).repositories()
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                Arc::new(InMemoryStore::new()).repositories()
            }
        };

        #[cfg(not(feature = "postgres"))]
        let repos: Repositories = {
            tracing::info!("Running without postgres feature - using in-memory store");
            Arc::new(InMemoryStore::new()).repositories()
        };

        tracing::info!("Application state initialized");

        Self::with_repositories(repos, config.jwt.clone(), config.posts_per_page)
            .secure_cookies(config.secure_cookies)
    }

    pub fn with_repositories(repos: Repositories, jwt: JwtConfig, per_page: u64) -> Self {
        Self {
            blog: BlogService::new(repos, per_page),
            tokens: Arc::new(JwtTokenService::new(jwt)),
            passwords: Arc::new(Argon2PasswordService::new()),
            secure_cookies: false,
        }
    }

    pub fn secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }
}
