//! Error handling - maps failures to HTML error pages and redirects.

use std::fmt;

use actix_web::{HttpResponse, ResponseError, http::StatusCode, http::header};

use blogpad_core::error::{DomainError, RepoError};
use blogpad_core::ports::AuthError;

use crate::middleware::auth::login_url;
use crate::views::{self, ErrorTemplate, NotFoundTemplate};

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    /// Not logged in: redirect to the login page, then back to `next`.
    LoginRequired { next: String },
    Conflict(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::LoginRequired { next } => write!(f, "Login required for {}", next),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::LoginRequired { .. } => StatusCode::FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let page = match self {
            AppError::LoginRequired { next } => {
                return HttpResponse::Found()
                    .insert_header((header::LOCATION, login_url(next)))
                    .finish();
            }
            AppError::NotFound(detail) => {
                tracing::debug!("Not found: {}", detail);
                views::render_page(&NotFoundTemplate::default())
            }
            AppError::BadRequest(detail) | AppError::Conflict(detail) => {
                views::render_page(&ErrorTemplate::new(status, detail.clone()))
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                views::render_page(&ErrorTemplate::new(
                    status,
                    "Something went wrong on our side.".to_string(),
                ))
            }
        };

        match page {
            Ok(body) => HttpResponse::build(status)
                .content_type(views::HTML_CONTENT_TYPE)
                .body(body),
            Err(e) => {
                tracing::error!("Failed to render error page: {}", e);
                HttpResponse::build(status).body(status.to_string())
            }
        }
    }
}

// Conversion from domain errors
impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, key } => {
                AppError::NotFound(format!("{} '{}' not found", entity_type, key))
            }
            DomainError::Validation(msg) => AppError::BadRequest(msg),
            DomainError::Repository(err) => err.into(),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => AppError::Conflict(msg),
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<askama::Error> for AppError {
    fn from(err: askama::Error) -> Self {
        AppError::Internal(format!("Template rendering failed: {}", err))
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
