//! Form validation.
//!
//! Validation never fails with an error for bad input: it returns a
//! [`FormResult`], so the caller can redisplay the submitted values together
//! with the field errors. `Err` is reserved for repository failures.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::domain::{Post, User};
use crate::error::RepoError;
use crate::ports::{GroupRepository, UserRepository};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Outcome of validating a submitted form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormResult<T> {
    Valid(T),
    Invalid(FormErrors),
}

impl<T> FormResult<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, FormResult::Valid(_))
    }
}

/// Errors keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
}

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> FormResult<T> {
        if self.is_empty() {
            FormResult::Valid(value())
        } else {
            FormResult::Invalid(self)
        }
    }
}

/// Submitted values of the create/edit post form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostForm {
    pub text: String,
    /// Raw group id as submitted; empty means "no group".
    pub group: Option<String>,
}

/// A post form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedPost {
    pub text: String,
    pub group_id: Option<Uuid>,
}

impl PostForm {
    pub fn new(text: impl Into<String>, group: Option<String>) -> Self {
        Self {
            text: text.into(),
            group,
        }
    }

    /// Initial values when editing an existing post.
    pub fn from_post(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id.map(|id| id.to_string()),
        }
    }

    /// Check text length and the group reference.
    ///
    /// `max_chars` of `None` leaves the text length unbounded.
    pub async fn validate(
        &self,
        groups: &dyn GroupRepository,
        max_chars: Option<usize>,
    ) -> Result<FormResult<CleanedPost>, RepoError> {
        let mut errors = FormErrors::default();

        let text = self.text.trim();
        if text.is_empty() {
            errors.add("text", REQUIRED);
        } else if let Some(max) = max_chars {
            let len = text.chars().count();
            if len > max {
                errors.add(
                    "text",
                    format!("Ensure this value has at most {max} characters (it has {len})."),
                );
            }
        }

        let group_id = match self.group.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match Uuid::parse_str(raw) {
                Ok(id) if groups.find_by_id(id).await?.is_some() => Some(id),
                _ => {
                    errors.add("group", INVALID_CHOICE);
                    None
                }
            },
        };

        Ok(errors.into_result(|| CleanedPost {
            text: text.to_string(),
            group_id,
        }))
    }
}

/// Submitted values of the registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub username: String,
    pub password1: String,
    pub password2: String,
}

/// A registration form that passed validation. The password is still plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedSignup {
    pub username: String,
    pub password: String,
}

impl SignupForm {
    pub const PASSWORD_MIN_CHARS: usize = 8;

    pub async fn validate(
        &self,
        users: &dyn UserRepository,
    ) -> Result<FormResult<CleanedSignup>, RepoError> {
        let mut errors = FormErrors::default();
        let username = self.username.trim();

        if let Err(err) = User::validate_username(username) {
            errors.add("username", validation_message(err));
        } else if users.find_by_username(username).await?.is_some() {
            errors.add("username", "A user with that username already exists.");
        }

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        } else if self.password1.chars().count() < Self::PASSWORD_MIN_CHARS {
            errors.add(
                "password1",
                format!(
                    "This password is too short. It must contain at least {} characters.",
                    Self::PASSWORD_MIN_CHARS
                ),
            );
        }
        if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }

        Ok(errors.into_result(|| CleanedSignup {
            username: username.to_string(),
            password: self.password1.clone(),
        }))
    }
}

fn validation_message(err: crate::DomainError) -> String {
    match err {
        crate::DomainError::Validation(msg) => msg,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Group;
    use crate::ports::BaseRepository;
    use async_trait::async_trait;

    struct OneGroup(Group);

    #[async_trait]
    impl BaseRepository<Group, Uuid> for OneGroup {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, RepoError> {
            Ok((id == self.0.id).then(|| self.0.clone()))
        }

        async fn insert(&self, entity: Group) -> Result<Group, RepoError> {
            Ok(entity)
        }

        async fn update(&self, entity: Group) -> Result<Group, RepoError> {
            Ok(entity)
        }

        async fn delete(&self, _id: Uuid) -> Result<(), RepoError> {
            Ok(())
        }
    }

    #[async_trait]
    impl GroupRepository for OneGroup {
        async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
            Ok((slug == self.0.slug).then(|| self.0.clone()))
        }

        async fn list_all(&self) -> Result<Vec<Group>, RepoError> {
            Ok(vec![self.0.clone()])
        }
    }

    fn groups() -> OneGroup {
        OneGroup(Group::new("Test group", "test-slug", "").unwrap())
    }

    #[tokio::test]
    async fn test_valid_form_trims_text() {
        let repo = groups();
        let form = PostForm::new("  hello  ", Some(repo.0.id.to_string()));

        let result = form.validate(&repo, Some(100)).await.unwrap();

        assert_eq!(
            result,
            FormResult::Valid(CleanedPost {
                text: "hello".to_string(),
                group_id: Some(repo.0.id),
            })
        );
    }

    #[tokio::test]
    async fn test_empty_group_means_none() {
        let form = PostForm::new("text", Some(String::new()));
        match form.validate(&groups(), Some(100)).await.unwrap() {
            FormResult::Valid(cleaned) => assert_eq!(cleaned.group_id, None),
            FormResult::Invalid(errors) => panic!("unexpected errors: {errors:?}"),
        }
    }

    #[tokio::test]
    async fn test_blank_text_is_required() {
        let form = PostForm::new("   ", None);
        let FormResult::Invalid(errors) = form.validate(&groups(), Some(100)).await.unwrap() else {
            panic!("blank text must not validate");
        };
        assert_eq!(errors.field("text"), [REQUIRED.to_string()]);
    }

    #[tokio::test]
    async fn test_text_length_bound() {
        let repo = groups();
        let long = "я".repeat(101);

        let result = PostForm::new(long.clone(), None)
            .validate(&repo, Some(100))
            .await
            .unwrap();
        let FormResult::Invalid(errors) = result else {
            panic!("over-long text must not validate");
        };
        assert!(errors.field("text")[0].contains("at most 100"));

        let unbounded = PostForm::new(long, None).validate(&repo, None).await.unwrap();
        assert!(unbounded.is_valid());

        let exact = PostForm::new("я".repeat(100), None)
            .validate(&repo, Some(100))
            .await
            .unwrap();
        assert!(exact.is_valid());
    }

    #[tokio::test]
    async fn test_unknown_or_malformed_group_rejected() {
        let repo = groups();
        for raw in [Uuid::new_v4().to_string(), "not-a-uuid".to_string()] {
            let result = PostForm::new("text", Some(raw))
                .validate(&repo, Some(100))
                .await
                .unwrap();
            let FormResult::Invalid(errors) = result else {
                panic!("unknown group must not validate");
            };
            assert_eq!(errors.field("group"), [INVALID_CHOICE.to_string()]);
            assert!(errors.field("text").is_empty());
        }
    }

    #[test]
    fn test_from_post_prefills_values() {
        let group_id = Uuid::new_v4();
        let post = Post::new(Uuid::new_v4(), "body".to_string(), Some(group_id));
        let form = PostForm::from_post(&post);
        assert_eq!(form.text, "body");
        assert_eq!(form.group, Some(group_id.to_string()));
    }
}
