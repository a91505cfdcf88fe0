//! The blog service: listings, post detail, and the create/edit flows.
//!
//! Every operation that acts on behalf of a user takes that user explicitly.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Group, Post, PostEntry, PostFilter, User};
use crate::error::DomainError;
use crate::forms::{FormErrors, FormResult, PostForm};
use crate::pagination::{DEFAULT_PAGE_SIZE, Page, Paginator};
use crate::ports::{GroupRepository, PostRepository, UserRepository};

/// Default cap on post text, in characters.
pub const DEFAULT_POST_TEXT_MAX_CHARS: usize = 100;

/// Tunables for the blog service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlogSettings {
    pub posts_per_page: u64,
    /// `None` leaves post text unbounded.
    pub post_text_max_chars: Option<usize>,
}

impl Default for BlogSettings {
    fn default() -> Self {
        Self {
            posts_per_page: DEFAULT_PAGE_SIZE,
            post_text_max_chars: Some(DEFAULT_POST_TEXT_MAX_CHARS),
        }
    }
}

/// A group page.
#[derive(Debug, Clone)]
pub struct GroupListing {
    pub group: Group,
    pub page: Page<PostEntry>,
}

/// An author's profile page.
#[derive(Debug, Clone)]
pub struct ProfileListing {
    pub author: User,
    pub page: Page<PostEntry>,
}

/// A single post with the author's post count.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub entry: PostEntry,
    pub author_posts: u64,
}

/// Result of submitting the create form.
#[derive(Debug, Clone)]
pub enum CreateOutcome {
    Created(Post),
    Invalid(FormErrors),
}

/// Result of opening the edit form.
#[derive(Debug, Clone)]
pub enum EditAccess {
    Allowed { post: Post, form: PostForm },
    NotAuthor { post_id: Uuid },
}

/// Result of submitting the edit form.
#[derive(Debug, Clone)]
pub enum EditOutcome {
    Saved(Post),
    Invalid { post: Post, errors: FormErrors },
    NotAuthor { post_id: Uuid },
}

/// Read and write operations over posts, groups and authors.
#[derive(Clone)]
pub struct BlogService {
    posts: Arc<dyn PostRepository>,
    groups: Arc<dyn GroupRepository>,
    users: Arc<dyn UserRepository>,
    settings: BlogSettings,
}

impl BlogService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        groups: Arc<dyn GroupRepository>,
        users: Arc<dyn UserRepository>,
        settings: BlogSettings,
    ) -> Self {
        Self {
            posts,
            groups,
            users,
            settings,
        }
    }

    pub fn settings(&self) -> BlogSettings {
        self.settings
    }

    /// All posts, newest first.
    pub async fn index(&self, page: Option<&str>) -> Result<Page<PostEntry>, DomainError> {
        self.paginate(PostFilter::All, page).await
    }

    /// Posts of the group with `slug`.
    pub async fn group_posts(
        &self,
        slug: &str,
        page: Option<&str>,
    ) -> Result<GroupListing, DomainError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found("group", slug))?;

        let page = self.paginate(PostFilter::Group(group.id), page).await?;
        Ok(GroupListing { group, page })
    }

    /// Posts written by `username`.
    pub async fn profile(
        &self,
        username: &str,
        page: Option<&str>,
    ) -> Result<ProfileListing, DomainError> {
        let author = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("user", username))?;

        let page = self.paginate(PostFilter::Author(author.id), page).await?;
        Ok(ProfileListing { author, page })
    }

    pub async fn post_detail(&self, post_id: Uuid) -> Result<PostDetail, DomainError> {
        let entry = self
            .posts
            .find_entry(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))?;
        let author_posts = self
            .posts
            .count(PostFilter::Author(entry.author.id))
            .await?;

        Ok(PostDetail {
            entry,
            author_posts,
        })
    }

    /// Groups offered by the post form.
    pub async fn groups(&self) -> Result<Vec<Group>, DomainError> {
        Ok(self.groups.list_all().await?)
    }

    /// Validate `form` and publish it as a new post by `author`.
    pub async fn create_post(
        &self,
        author: &User,
        form: &PostForm,
    ) -> Result<CreateOutcome, DomainError> {
        let cleaned = match form
            .validate(self.groups.as_ref(), self.settings.post_text_max_chars)
            .await?
        {
            FormResult::Valid(cleaned) => cleaned,
            FormResult::Invalid(errors) => return Ok(CreateOutcome::Invalid(errors)),
        };

        let post = Post::new(author.id, cleaned.text, cleaned.group_id);
        let post = self.posts.insert(post).await?;
        tracing::info!(post_id = %post.id, author = %author.username, "Post created");

        Ok(CreateOutcome::Created(post))
    }

    /// Open the edit form for `post_id` as `editor`.
    pub async fn edit_access(
        &self,
        editor: Uuid,
        post_id: Uuid,
    ) -> Result<EditAccess, DomainError> {
        let post = self.load_post(post_id).await?;
        if !post.is_authored_by(editor) {
            return Ok(EditAccess::NotAuthor { post_id });
        }

        let form = PostForm::from_post(&post);
        Ok(EditAccess::Allowed { post, form })
    }

    /// Apply an edit submitted by `editor`. Only the author may change a post;
    /// anyone else gets `NotAuthor` and nothing is written.
    pub async fn edit_post(
        &self,
        editor: Uuid,
        post_id: Uuid,
        form: &PostForm,
    ) -> Result<EditOutcome, DomainError> {
        let mut post = self.load_post(post_id).await?;
        if !post.is_authored_by(editor) {
            tracing::debug!(%post_id, %editor, "Edit by non-author ignored");
            return Ok(EditOutcome::NotAuthor { post_id });
        }

        let cleaned = match form
            .validate(self.groups.as_ref(), self.settings.post_text_max_chars)
            .await?
        {
            FormResult::Valid(cleaned) => cleaned,
            FormResult::Invalid(errors) => return Ok(EditOutcome::Invalid { post, errors }),
        };

        post.text = cleaned.text;
        post.group_id = cleaned.group_id;
        let post = self.posts.update(post).await?;
        tracing::info!(%post_id, "Post updated");

        Ok(EditOutcome::Saved(post))
    }

    async fn load_post(&self, post_id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))
    }

    async fn paginate(
        &self,
        filter: PostFilter,
        page: Option<&str>,
    ) -> Result<Page<PostEntry>, DomainError> {
        let paginator = Paginator::new(self.settings.posts_per_page);
        let total = self.posts.count(filter).await?;
        let window = paginator.window(total, page);

        let items = self.posts.list(filter, window.offset, window.limit).await?;
        Ok(window.into_page(items))
    }
}
