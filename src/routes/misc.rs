use askama::Template;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};

use crate::extractors::MaybeUser;
use crate::routes::home::Html;

#[derive(Template)]
#[template(path = "misc/404.html")]
pub struct NotFoundTemplate {
    pub viewer: Option<String>,
    pub path: String,
}

#[derive(Template)]
#[template(path = "misc/500.html")]
pub struct ServerErrorTemplate {
    pub viewer: Option<String>,
}

/// Router fallback: any path no route matched.
pub async fn not_found(maybe_user: MaybeUser, uri: Uri) -> Response {
    tracing::debug!("No route for {}", uri.path());
    let mut response = Html(NotFoundTemplate {
        viewer: maybe_user.username(),
        path: uri.path().to_string(),
    })
    .into_response();
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}
