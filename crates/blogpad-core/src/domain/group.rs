use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Group entity - a named category that posts may belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl Group {
    pub const TITLE_MAX_CHARS: usize = 200;
    pub const SLUG_MAX_CHARS: usize = 20;

    /// Create a new group, checking the title and slug constraints.
    pub fn new(
        title: impl Into<String>,
        slug: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let title = title.into();
        let slug = slug.into();

        if title.trim().is_empty() || title.chars().count() > Self::TITLE_MAX_CHARS {
            return Err(DomainError::Validation(format!(
                "Group title must be 1-{} characters",
                Self::TITLE_MAX_CHARS
            )));
        }
        Self::validate_slug(&slug)?;

        Ok(Self {
            id: Uuid::new_v4(),
            title,
            slug,
            description: description.into(),
        })
    }

    /// Slugs are case-sensitive, URL-safe and at most 20 characters.
    pub fn validate_slug(slug: &str) -> Result<(), DomainError> {
        let valid_chars = slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if slug.is_empty() || slug.len() > Self::SLUG_MAX_CHARS || !valid_chars {
            return Err(DomainError::Validation(format!(
                "Invalid slug '{slug}': use 1-{} letters, digits, hyphens or underscores",
                Self::SLUG_MAX_CHARS
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}
