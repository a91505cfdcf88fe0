//! Authentication handlers: signup, login and logout.

use actix_web::{HttpResponse, web};

use blogpad_core::domain::User;
use blogpad_core::error::RepoError;
use blogpad_core::forms::{FormErrors, FormResult, SignupForm};
use blogpad_shared::dto::{LoginFormData, NextQuery, SignupFormData};

use crate::handlers::redirect;
use crate::middleware::auth::{OptionalIdentity, expired_session_cookie, safe_next, session_cookie};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::views::{self, LoginTemplate, Nav, SignupTemplate};

const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// GET /auth/login/
pub async fn login_form(
    identity: OptionalIdentity,
    query: web::Query<NextQuery>,
) -> AppResult<HttpResponse> {
    views::html(&LoginTemplate {
        nav: Nav::new(identity.username()),
        next: safe_next(query.next.as_deref()).to_string(),
        ..Default::default()
    })
}

/// POST /auth/login/
pub async fn login_submit(
    state: web::Data<AppState>,
    body: web::Form<LoginFormData>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let username = req.username.trim();
    let next = safe_next(req.next.as_deref());

    let user = state.users.find_by_username(username).await?;
    let verified = match &user {
        Some(user) => state.passwords.verify(&req.password, &user.password_hash)?,
        None => false,
    };

    let Some(user) = user.filter(|_| verified) else {
        tracing::debug!(%username, "Failed login");
        return views::html(&LoginTemplate {
            nav: Nav::default(),
            username: username.to_string(),
            next: next.to_string(),
            errors: vec![BAD_CREDENTIALS.to_string()],
        });
    };

    tracing::info!(user = %user.username, "User logged in");
    start_session(&state, &user, next)
}

/// GET /auth/signup/
pub async fn signup_form() -> AppResult<HttpResponse> {
    views::html(&SignupTemplate::default())
}

/// POST /auth/signup/
pub async fn signup_submit(
    state: web::Data<AppState>,
    body: web::Form<SignupFormData>,
) -> AppResult<HttpResponse> {
    let data = body.into_inner();
    let form = SignupForm {
        username: data.username,
        password1: data.password1,
        password2: data.password2,
    };

    let result = form.validate(state.users.as_ref()).await?;
    let cleaned = match result {
        FormResult::Valid(cleaned) => cleaned,
        FormResult::Invalid(errors) => {
            return views::html(&SignupTemplate::with_errors(form.username, &errors));
        }
    };

    let password_hash = state.passwords.hash(&cleaned.password)?;
    let user = match state
        .users
        .insert(User::new(cleaned.username.clone(), password_hash))
        .await
    {
        Ok(user) => user,
        // Lost a race with a concurrent signup for the same name.
        Err(RepoError::Constraint(_)) => {
            let mut errors = FormErrors::default();
            errors.add("username", "A user with that username already exists.");
            return views::html(&SignupTemplate::with_errors(cleaned.username, &errors));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user = %user.username, "User registered");
    start_session(&state, &user, "/")
}

/// GET|POST /auth/logout/
pub async fn logout() -> HttpResponse {
    let mut response = redirect("/");
    if let Err(e) = response.add_cookie(&expired_session_cookie()) {
        tracing::error!("Failed to clear session cookie: {}", e);
    }
    response
}

fn start_session(state: &AppState, user: &User, next: &str) -> AppResult<HttpResponse> {
    let token = state.tokens.generate_token(user.id, &user.username)?;
    let cookie = session_cookie(
        token,
        state.tokens.expiration_seconds(),
        state.session_cookie_secure,
    );

    let mut response = redirect(next);
    response
        .add_cookie(&cookie)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(response)
}
