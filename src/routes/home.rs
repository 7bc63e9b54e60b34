use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::AppResult;
use crate::extractors::{MaybeUser, PageParam};
use crate::feed::{count_posts, fetch_page, FeedKind, FeedPost, Page, PageRequest};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub viewer: Option<String>,
    /// Pre-rendered feed markup, possibly served from the cache.
    pub feed: String,
}

/// Post cards plus paginator. Rendered on its own so the global feed can be cached
/// without the per-viewer page chrome.
#[derive(Template)]
#[template(path = "includes/feed.html")]
pub struct FeedTemplate {
    pub page: Page<FeedPost>,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// Cache key for one served page of the global feed.
pub fn index_cache_key(number: u64) -> String {
    format!("index_page:{}", number)
}

/// GET /
///
/// The request is resolved to a real page number before the cache lookup, so
/// junk and out-of-range `page` values all share the last page's entry.
pub async fn index(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    PageParam(request): PageParam,
) -> AppResult<Response> {
    let number = {
        let conn = state.db.get()?;
        let total = count_posts(&conn, FeedKind::Global)?;
        state.paginator().window(total, request).number
    };

    let feed = state
        .index_cache
        .get_or_insert_with(&index_cache_key(number), || {
            render_global_feed(&state, PageRequest::Number(number))
        })
        .await?;

    Ok(Html(IndexTemplate {
        viewer: maybe_user.username(),
        feed,
    })
    .into_response())
}

async fn render_global_feed(state: &AppState, request: PageRequest) -> AppResult<String> {
    let page = {
        let conn = state.db.get()?;
        fetch_page(&conn, FeedKind::Global, request, &state.paginator())?
    };
    tracing::debug!(
        "Rendering global feed page {} of {}",
        page.number,
        page.num_pages
    );
    Ok(FeedTemplate { page }.render()?)
}
