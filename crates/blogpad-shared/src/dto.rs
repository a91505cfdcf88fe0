//! Data Transfer Objects - form bodies and query strings as submitted.

use serde::{Deserialize, Serialize};

/// `?next=` on the login page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Create/edit post form body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostFormData {
    #[serde(default)]
    pub text: String,
    /// Group id, or empty for no group.
    pub group: Option<String>,
}

/// Login form body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginFormData {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

/// Registration form body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupFormData {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}
