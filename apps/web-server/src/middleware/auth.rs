//! Session cookie handling and identity extractors.

use std::future::Future;
use std::pin::Pin;

use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};

use blogpad_core::domain::User;

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Cookie holding the session token.
pub const SESSION_COOKIE: &str = "blogpad_session";

/// Where unauthenticated visitors are sent.
pub const LOGIN_PATH: &str = "/auth/login/";

/// The logged-in user, resolved from the session cookie.
///
/// Using this extractor makes a route login-only: without a valid session the
/// request is redirected to the login page with `next` pointing back here.
/// ```ignore
/// async fn create_form(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user: User,
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let next = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| req.path().to_string());
        let token = req.cookie(SESSION_COOKIE).map(|c| c.value().to_string());
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let state = state.ok_or_else(|| {
                tracing::error!("AppState not found in app data");
                AppError::Internal("Server configuration error".to_string())
            })?;

            let Some(token) = token else {
                return Err(AppError::LoginRequired { next });
            };

            let claims = match state.tokens.validate_token(&token) {
                Ok(claims) => claims,
                Err(e) => {
                    tracing::debug!(error = %e, "Rejected session token");
                    return Err(AppError::LoginRequired { next });
                }
            };

            // The account may have been deleted since the token was issued.
            match state.users.find_by_id(claims.user_id).await? {
                Some(user) => Ok(Identity { user }),
                None => Err(AppError::LoginRequired { next }),
            }
        })
    }
}

/// Optional identity extractor - doesn't fail if not authenticated.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn username(&self) -> Option<&str> {
        self.0.as_ref().map(|identity| identity.user.username.as_str())
    }
}

impl FromRequest for OptionalIdentity {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let identity = Identity::from_request(req, payload);
        Box::pin(async move {
            match identity.await {
                Ok(identity) => Ok(OptionalIdentity(Some(identity))),
                Err(AppError::LoginRequired { .. }) => Ok(OptionalIdentity(None)),
                Err(e) => Err(e),
            }
        })
    }
}

/// Build the session cookie for a freshly issued token.
pub fn session_cookie(token: String, max_age_seconds: i64, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::seconds(max_age_seconds))
        .finish()
}

/// A cookie that makes the browser drop the session.
pub fn expired_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

/// Login page URL returning to `next` afterwards. Slashes are left readable.
pub fn login_url(next: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("{}?next={}", LOGIN_PATH, encoded.replace("%2F", "/"))
}

/// Only local absolute paths are followed after login; anything else goes home.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}
