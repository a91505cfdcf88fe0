//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use blogpad_core::BlogSettings;
use blogpad_core::blog::DEFAULT_POST_TEXT_MAX_CHARS;
use blogpad_core::pagination::DEFAULT_PAGE_SIZE;
use blogpad_infra::{DatabaseConfig, JwtConfig};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub blog: BlogSettings,
    pub jwt: JwtConfig,
    /// Mark the session cookie `Secure` (HTTPS deployments).
    pub session_cookie_secure: bool,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: parse_var("DB_MAX_CONNECTIONS", 20),
            min_connections: parse_var("DB_MIN_CONNECTIONS", 2),
        });

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT", 8080),
            database,
            blog: blog_settings(),
            jwt: JwtConfig::from_env(),
            session_cookie_secure: env::var("SESSION_COOKIE_SECURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

/// `POST_TEXT_MAX_CHARS=0` removes the cap on post text.
fn blog_settings() -> BlogSettings {
    let max_chars: usize = parse_var("POST_TEXT_MAX_CHARS", DEFAULT_POST_TEXT_MAX_CHARS);
    BlogSettings {
        posts_per_page: parse_var("POSTS_PER_PAGE", DEFAULT_PAGE_SIZE).max(1),
        post_text_max_chars: (max_chars > 0).then_some(max_chars),
    }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
