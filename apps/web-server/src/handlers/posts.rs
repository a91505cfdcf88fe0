//! Blog pages: listings, post detail, and the create/edit forms.

use actix_web::{HttpRequest, HttpResponse, web};
use uuid::Uuid;

use blogpad_core::blog::{CreateOutcome, EditAccess, EditOutcome};
use blogpad_core::forms::{FormErrors, PostForm};
use blogpad_shared::dto::PostFormData;

use crate::handlers::redirect;
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;
use crate::views::{
    self, GroupListTemplate, IndexTemplate, Nav, PostCard, PostDetailTemplate, PostFormTemplate,
    ProfileTemplate,
};

/// GET /
pub async fn index(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let page = state.blog.index(requested_page(&req).as_deref()).await?;
    let (posts, pager) = views::listing(page);

    views::html(&IndexTemplate {
        nav: Nav::new(identity.username()),
        posts,
        pager,
    })
}

/// GET /group/{slug}/
pub async fn group_posts(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    slug: web::Path<String>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let listing = state
        .blog
        .group_posts(&slug, requested_page(&req).as_deref())
        .await?;
    let (posts, pager) = views::listing(listing.page);

    views::html(&GroupListTemplate {
        nav: Nav::new(identity.username()),
        title: listing.group.title,
        description: listing.group.description,
        posts,
        pager,
    })
}

/// GET /profile/{username}/
pub async fn profile(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    username: web::Path<String>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let listing = state
        .blog
        .profile(&username, requested_page(&req).as_deref())
        .await?;
    let post_count = listing.page.total;
    let (posts, pager) = views::listing(listing.page);

    views::html(&ProfileTemplate {
        nav: Nav::new(identity.username()),
        author: listing.author.username,
        post_count,
        posts,
        pager,
    })
}

/// GET /posts/{id}/
pub async fn post_detail(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    post_id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let detail = state.blog.post_detail(*post_id).await?;
    let can_edit = identity
        .0
        .as_ref()
        .is_some_and(|i| detail.entry.post.is_authored_by(i.user.id));

    views::html(&PostDetailTemplate {
        nav: Nav::new(identity.username()),
        post: PostCard::from(detail.entry),
        author_posts: detail.author_posts,
        can_edit,
    })
}

/// GET /create/
pub async fn create_form(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    render_form(&state, &identity, &PostForm::default(), &FormErrors::default(), None).await
}

/// POST /create/
pub async fn create_submit(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Form<PostFormData>,
) -> AppResult<HttpResponse> {
    let form = post_form(body.into_inner());

    match state.blog.create_post(&identity.user, &form).await? {
        CreateOutcome::Created(_) => Ok(redirect(&views::profile_url(&identity.user.username))),
        CreateOutcome::Invalid(errors) => {
            tracing::debug!(user = %identity.user.username, "Rejected post form");
            render_form(&state, &identity, &form, &errors, None).await
        }
    }
}

/// GET /posts/{id}/edit/
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    match state.blog.edit_access(identity.user.id, *post_id).await? {
        EditAccess::Allowed { post, form } => {
            render_form(&state, &identity, &form, &FormErrors::default(), Some(post.id)).await
        }
        EditAccess::NotAuthor { post_id } => Ok(redirect(&views::post_url(post_id))),
    }
}

/// POST /posts/{id}/edit/
pub async fn edit_submit(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
    body: web::Form<PostFormData>,
) -> AppResult<HttpResponse> {
    let form = post_form(body.into_inner());

    match state.blog.edit_post(identity.user.id, *post_id, &form).await? {
        EditOutcome::Saved(post) => Ok(redirect(&views::post_url(post.id))),
        EditOutcome::Invalid { post, errors } => {
            render_form(&state, &identity, &form, &errors, Some(post.id)).await
        }
        EditOutcome::NotAuthor { post_id } => Ok(redirect(&views::post_url(post_id))),
    }
}

/// Last `page` value in the query string. Repeated or malformed keys never
/// fail the request; the paginator falls back on its own.
fn requested_page(req: &HttpRequest) -> Option<String> {
    url::form_urlencoded::parse(req.query_string().as_bytes())
        .filter(|(key, _)| key == "page")
        .map(|(_, value)| value.into_owned())
        .last()
}

fn post_form(data: PostFormData) -> PostForm {
    PostForm::new(data.text, data.group)
}

async fn render_form(
    state: &AppState,
    identity: &Identity,
    form: &PostForm,
    errors: &FormErrors,
    editing: Option<Uuid>,
) -> AppResult<HttpResponse> {
    let groups = state.blog.groups().await?;

    views::html(&PostFormTemplate::new(
        Nav::new(Some(&identity.user.username)),
        form,
        errors,
        groups,
        state.blog.settings().post_text_max_chars,
        editing,
    ))
}
