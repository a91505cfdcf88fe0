use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// User entity - the author of posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub const USERNAME_MAX_CHARS: usize = 150;

    /// Create a new user with generated ID and timestamp.
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            password_hash,
            created_at: Utc::now(),
        }
    }

    /// Usernames are 1-150 ASCII letters, digits and `@.+-_`, so they can appear in URLs as-is.
    pub fn validate_username(username: &str) -> Result<(), DomainError> {
        if username.is_empty() {
            return Err(DomainError::Validation("Username is required".to_string()));
        }
        if username.chars().count() > Self::USERNAME_MAX_CHARS {
            return Err(DomainError::Validation(format!(
                "Username must be at most {} characters",
                Self::USERNAME_MAX_CHARS
            )));
        }
        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
        if !username.chars().all(allowed) {
            return Err(DomainError::Validation(
                "Username may contain only English letters, digits and @/./+/-/_".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}
