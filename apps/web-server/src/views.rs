//! Page templates and the view models they render.
//!
//! Templates live under `templates/` and are compiled in by askama. View
//! models carry display-ready strings so the templates stay free of logic.

use actix_web::{HttpResponse, http::StatusCode};
use askama::Template;

use blogpad_core::domain::{Group, PostEntry};
use blogpad_core::forms::{FormErrors, PostForm};
use blogpad_core::pagination::Page;

use crate::middleware::error::AppResult;

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

const DATE_FORMAT: &str = "%d %b %Y %H:%M";

/// Render a template to a string.
pub fn render_page<T: Template>(template: &T) -> askama::Result<String> {
    template.render()
}

/// Render a template into a `200 OK` HTML response.
pub fn html<T: Template>(template: &T) -> AppResult<HttpResponse> {
    let body = template.render()?;
    Ok(HttpResponse::Ok().content_type(HTML_CONTENT_TYPE).body(body))
}

pub fn post_url(post_id: impl std::fmt::Display) -> String {
    format!("/posts/{}/", post_id)
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", username)
}

/// Navigation bar state.
#[derive(Debug, Clone, Default)]
pub struct Nav {
    pub username: Option<String>,
}

impl Nav {
    pub fn new(username: Option<&str>) -> Self {
        Self {
            username: username.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GroupLink {
    pub slug: String,
    pub title: String,
}

/// One post as shown in listings and on its own page.
#[derive(Debug, Clone)]
pub struct PostCard {
    pub id: String,
    pub text: String,
    pub pub_date: String,
    pub author: String,
    pub group: Option<GroupLink>,
}

impl From<PostEntry> for PostCard {
    fn from(entry: PostEntry) -> Self {
        Self {
            id: entry.post.id.to_string(),
            pub_date: entry.post.pub_date.format(DATE_FORMAT).to_string(),
            text: entry.post.text,
            author: entry.author.username,
            group: entry.group.map(|g| GroupLink {
                slug: g.slug,
                title: g.title,
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageLink {
    pub number: u64,
    pub current: bool,
}

/// Paginator controls.
#[derive(Debug, Clone)]
pub struct Pager {
    pub number: u64,
    pub num_pages: u64,
    pub previous: Option<u64>,
    pub next: Option<u64>,
    pub links: Vec<PageLink>,
    pub visible: bool,
}

/// Split a page of entries into cards and paginator controls.
pub fn listing(page: Page<PostEntry>) -> (Vec<PostCard>, Pager) {
    let pager = Pager {
        number: page.number,
        num_pages: page.num_pages,
        previous: page.previous_page_number(),
        next: page.next_page_number(),
        links: page
            .page_range()
            .map(|number| PageLink {
                number,
                current: number == page.number,
            })
            .collect(),
        visible: page.has_other_pages(),
    };
    let cards = page.items.into_iter().map(PostCard::from).collect();
    (cards, pager)
}

#[derive(Template)]
#[template(path = "posts/index.html")]
pub struct IndexTemplate {
    pub nav: Nav,
    pub posts: Vec<PostCard>,
    pub pager: Pager,
}

#[derive(Template)]
#[template(path = "posts/group_list.html")]
pub struct GroupListTemplate {
    pub nav: Nav,
    pub title: String,
    pub description: String,
    pub posts: Vec<PostCard>,
    pub pager: Pager,
}

#[derive(Template)]
#[template(path = "posts/profile.html")]
pub struct ProfileTemplate {
    pub nav: Nav,
    pub author: String,
    pub post_count: u64,
    pub posts: Vec<PostCard>,
    pub pager: Pager,
}

#[derive(Template)]
#[template(path = "posts/post_detail.html")]
pub struct PostDetailTemplate {
    pub nav: Nav,
    pub post: PostCard,
    pub author_posts: u64,
    pub can_edit: bool,
}

#[derive(Debug, Clone)]
pub struct GroupOption {
    pub id: String,
    pub title: String,
    pub selected: bool,
}

/// The create/edit form. `is_edit` switches headings, action and button text.
#[derive(Template)]
#[template(path = "posts/create_post.html")]
pub struct PostFormTemplate {
    pub nav: Nav,
    pub is_edit: bool,
    pub action: String,
    pub text: String,
    pub max_chars: Option<usize>,
    pub groups: Vec<GroupOption>,
    pub text_errors: Vec<String>,
    pub group_errors: Vec<String>,
}

impl PostFormTemplate {
    /// `editing` carries the post id when an existing post is edited.
    pub fn new(
        nav: Nav,
        form: &PostForm,
        errors: &FormErrors,
        groups: Vec<Group>,
        max_chars: Option<usize>,
        editing: Option<uuid::Uuid>,
    ) -> Self {
        let selected = form.group.as_deref().map(str::trim).unwrap_or_default();
        let groups = groups
            .into_iter()
            .map(|g| {
                let id = g.id.to_string();
                GroupOption {
                    selected: id == selected,
                    id,
                    title: g.title,
                }
            })
            .collect();

        Self {
            nav,
            is_edit: editing.is_some(),
            action: match editing {
                Some(id) => format!("{}edit/", post_url(id)),
                None => "/create/".to_string(),
            },
            text: form.text.clone(),
            max_chars,
            groups,
            text_errors: errors.field("text").to_vec(),
            group_errors: errors.field("group").to_vec(),
        }
    }
}

#[derive(Template, Default)]
#[template(path = "users/login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub username: String,
    pub next: String,
    pub errors: Vec<String>,
}

#[derive(Template, Default)]
#[template(path = "users/signup.html")]
pub struct SignupTemplate {
    pub nav: Nav,
    pub username: String,
    pub username_errors: Vec<String>,
    pub password1_errors: Vec<String>,
    pub password2_errors: Vec<String>,
}

impl SignupTemplate {
    pub fn with_errors(username: String, errors: &FormErrors) -> Self {
        Self {
            nav: Nav::default(),
            username,
            username_errors: errors.field("username").to_vec(),
            password1_errors: errors.field("password1").to_vec(),
            password2_errors: errors.field("password2").to_vec(),
        }
    }
}

#[derive(Template, Default)]
#[template(path = "core/404.html")]
pub struct NotFoundTemplate {
    pub nav: Nav,
}

#[derive(Template)]
#[template(path = "core/error.html")]
pub struct ErrorTemplate {
    pub nav: Nav,
    pub status: u16,
    pub reason: String,
    pub detail: String,
}

impl ErrorTemplate {
    pub fn new(status: StatusCode, detail: String) -> Self {
        Self {
            nav: Nav::default(),
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Error").to_string(),
            detail,
        }
    }
}
