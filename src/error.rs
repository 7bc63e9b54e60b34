use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};

use crate::follow::FollowError;
use crate::routes::misc::{NotFoundTemplate, ServerErrorTemplate};
use crate::routes::home::Html;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Login required for {next}")]
    LoginRequired { next: String },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Follow graph error: {0}")]
    Follow(#[from] FollowError),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Login page URL that sends the user back to `next` afterwards.
pub fn login_url(next: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("/auth/login/?next={}", encoded)
}

fn server_error() -> Response {
    let mut response = Html(ServerErrorTemplate { viewer: None }).into_response();
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => {
                let mut response = Html(NotFoundTemplate {
                    viewer: None,
                    path: String::new(),
                })
                .into_response();
                *response.status_mut() = StatusCode::NOT_FOUND;
                response
            }
            AppError::LoginRequired { next } => Redirect::to(&login_url(&next)).into_response(),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Follow(FollowError::SelfFollow) => {
                (StatusCode::BAD_REQUEST, "Cannot follow yourself").into_response()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                server_error()
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                server_error()
            }
            AppError::Io(e) => {
                tracing::error!("IO error: {}", e);
                server_error()
            }
            AppError::Follow(e) => {
                tracing::error!("Follow graph error: {}", e);
                server_error()
            }
            AppError::Template(e) => {
                tracing::error!("Template render error: {}", e);
                server_error()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                server_error()
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
