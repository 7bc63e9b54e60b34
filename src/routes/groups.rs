use askama::Template;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;

use crate::db::groups;
use crate::db::models::Group;
use crate::error::{AppError, AppResult};
use crate::extractors::{MaybeUser, PageParam};
use crate::feed::{fetch_page, FeedKind, FeedPost, Page};
use crate::routes::home::Html;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "posts/group.html")]
pub struct GroupTemplate {
    pub viewer: Option<String>,
    pub group: Group,
    pub page: Page<FeedPost>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/group/{slug}/", get(group_posts))
}

/// GET /group/{slug}/
async fn group_posts(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Path(slug): Path<String>,
    PageParam(request): PageParam,
) -> AppResult<Html<GroupTemplate>> {
    let conn = state.db.get()?;
    let group = groups::find_by_slug(&conn, &slug)?.ok_or(AppError::NotFound)?;
    let page = fetch_page(&conn, FeedKind::Group(&group.id), request, &state.paginator())?;

    Ok(Html(GroupTemplate {
        viewer: maybe_user.username(),
        group,
        page,
    }))
}
