//! Application state - shared across all handlers.

use std::sync::Arc;

use blogpad_core::ports::{
    GroupRepository, PasswordService, PostRepository, TokenService, UserRepository,
};
use blogpad_core::{BlogService, BlogSettings};
use blogpad_infra::{Argon2PasswordService, InMemoryStore, JwtConfig, JwtTokenService};

#[cfg(feature = "postgres")]
use blogpad_infra::database::{
    PostgresGroupRepository, PostgresPostRepository, PostgresUserRepository, connect,
};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub blog: BlogService,
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub session_cookie_secure: bool,
}

struct Repositories {
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn GroupRepository>,
    posts: Arc<dyn PostRepository>,
}

impl Repositories {
    fn in_memory(store: &InMemoryStore) -> Self {
        Self {
            users: Arc::new(store.users()),
            groups: Arc::new(store.groups()),
            posts: Arc::new(store.posts()),
        }
    }
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        #[cfg(feature = "postgres")]
        let repos = match &config.database {
            Some(db_config) => match connect(db_config).await {
                Ok(conn) => Repositories {
                    users: Arc::new(PostgresUserRepository::new(conn.clone())),
                    groups: Arc::new(PostgresGroupRepository::new(conn.clone())),
                    posts: Arc::new(PostgresPostRepository::new(conn)),
                },
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                    Repositories::in_memory(&InMemoryStore::new())
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                Repositories::in_memory(&InMemoryStore::new())
            }
        };

        #[cfg(not(feature = "postgres"))]
        let repos = {
            if config.database.is_some() {
                tracing::warn!("DATABASE_URL ignored: built without the postgres feature");
            }
            tracing::info!("Running without postgres feature - using in-memory store");
            Repositories::in_memory(&InMemoryStore::new())
        };

        let state = Self::from_parts(
            repos,
            config.blog,
            config.jwt.clone(),
            config.session_cookie_secure,
        );
        tracing::info!("Application state initialized");
        state
    }

    /// State over an existing in-memory store.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn in_memory(store: &InMemoryStore, settings: BlogSettings, jwt: JwtConfig) -> Self {
        Self::from_parts(Repositories::in_memory(store), settings, jwt, false)
    }

    fn from_parts(
        repos: Repositories,
        settings: BlogSettings,
        jwt: JwtConfig,
        session_cookie_secure: bool,
    ) -> Self {
        let blog = BlogService::new(repos.posts, repos.groups, repos.users.clone(), settings);

        Self {
            blog,
            users: repos.users,
            tokens: Arc::new(JwtTokenService::new(jwt)),
            passwords: Arc::new(Argon2PasswordService::new()),
            session_cookie_secure,
        }
    }
}
