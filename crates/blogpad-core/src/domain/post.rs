use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Group, User};

/// What happens to a post when the row it references is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    /// Delete the post along with the referenced row.
    Cascade,
    /// Keep the post and clear the reference.
    SetNull,
}

/// Post entity - a single authored text entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
}

impl Post {
    /// Deleting the author removes their posts.
    pub const AUTHOR_ON_DELETE: OnDelete = OnDelete::Cascade;
    /// Deleting a group only detaches its posts.
    pub const GROUP_ON_DELETE: OnDelete = OnDelete::SetNull;

    /// Number of characters of `text` used when a post is displayed.
    pub const DISPLAY_CHARS: usize = 15;

    /// Create a new post published now.
    pub fn new(author_id: Uuid, text: String, group_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            pub_date: Utc::now(),
            author_id,
            group_id,
        }
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head: String = self.text.chars().take(Self::DISPLAY_CHARS).collect();
        f.write_str(&head)
    }
}

/// A post together with the rows it references, as listings and detail pages need them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostEntry {
    pub post: Post,
    pub author: User,
    pub group: Option<Group>,
}

/// Which posts a listing query selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(Uuid),
    Author(Uuid),
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        match self {
            PostFilter::All => true,
            PostFilter::Group(id) => post.group_id == Some(*id),
            PostFilter::Author(id) => post.author_id == *id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_takes_first_fifteen_chars() {
        let post = Post::new(Uuid::new_v4(), "A test post that is long".to_string(), None);
        assert_eq!(post.to_string(), "A test post tha");
    }

    #[test]
    fn test_display_counts_characters_not_bytes() {
        let post = Post::new(Uuid::new_v4(), "Тестовый пост для проверки".to_string(), None);
        assert_eq!(post.to_string(), "Тестовый пост д");
    }

    #[test]
    fn test_display_short_text_unchanged() {
        let post = Post::new(Uuid::new_v4(), "short".to_string(), None);
        assert_eq!(post.to_string(), "short");
    }

    #[test]
    fn test_filter_matches() {
        let author = Uuid::new_v4();
        let group = Uuid::new_v4();
        let post = Post::new(author, "text".to_string(), Some(group));

        assert!(PostFilter::All.matches(&post));
        assert!(PostFilter::Group(group).matches(&post));
        assert!(PostFilter::Author(author).matches(&post));
        assert!(!PostFilter::Group(Uuid::new_v4()).matches(&post));
        assert!(!PostFilter::Author(Uuid::new_v4()).matches(&post));
    }

    #[test]
    fn test_deletion_rules() {
        assert_eq!(Post::AUTHOR_ON_DELETE, OnDelete::Cascade);
        assert_eq!(Post::GROUP_ON_DELETE, OnDelete::SetNull);
    }
}
