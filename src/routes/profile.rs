use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;

use crate::db::models::User;
use crate::db::users;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser, PageParam};
use crate::feed::{fetch_page, FeedKind, FeedPost, Page};
use crate::follow::FollowError;
use crate::routes::home::Html;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "posts/profile.html")]
pub struct ProfileTemplate {
    pub viewer: Option<String>,
    pub author: User,
    pub page: Page<FeedPost>,
    /// Whether the viewer follows this author. Always false for guests.
    pub following: bool,
    pub is_self: bool,
    pub post_count: u64,
    pub follower_count: i64,
    pub followee_count: i64,
}

#[derive(Template)]
#[template(path = "posts/follow.html")]
pub struct FollowFeedTemplate {
    pub viewer: Option<String>,
    pub page: Page<FeedPost>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/follow/", get(follow_index))
        .route("/{username}/", get(profile))
        .route("/{username}/follow/", get(profile_follow).post(profile_follow))
        .route(
            "/{username}/unfollow/",
            get(profile_unfollow).post(profile_unfollow),
        )
}

pub(crate) fn find_author(state: &AppState, username: &str) -> AppResult<User> {
    let conn = state.db.get()?;
    users::find_by_username(&conn, username)?.ok_or(AppError::NotFound)
}

fn profile_url(username: &str) -> String {
    format!("/{}/", username)
}

// --- Handlers ---

/// GET /{username}/
async fn profile(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(username): Path<String>,
    PageParam(request): PageParam,
) -> AppResult<Html<ProfileTemplate>> {
    let (author, page) = {
        let conn = state.db.get()?;
        let author = users::find_by_username(&conn, &username)?.ok_or(AppError::NotFound)?;
        let page = fetch_page(&conn, FeedKind::Author(&author.id), request, &state.paginator())?;
        (author, page)
    };

    let following = match &viewer {
        Some(viewer) => state.follows.is_following(&viewer.id, &author.id).await?,
        None => false,
    };
    let follower_count = state.follows.follower_count(&author.id).await?;
    let followee_count = state.follows.followee_count(&author.id).await?;

    Ok(Html(ProfileTemplate {
        is_self: viewer.as_ref().is_some_and(|v| v.id == author.id),
        viewer: viewer.map(|v| v.username),
        post_count: page.total,
        author,
        page,
        following,
        follower_count,
        followee_count,
    }))
}

/// GET|POST /{username}/follow/
async fn profile_follow(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let author = find_author(&state, &username)?;

    match state.follows.follow(&user.id, &author.id).await {
        Ok(true) => tracing::info!("{} now follows {}", user.username, author.username),
        Ok(false) => tracing::debug!("{} already follows {}", user.username, author.username),
        Err(FollowError::SelfFollow) => {
            tracing::debug!("Ignoring self-follow by {}", user.username)
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Redirect::to(&profile_url(&author.username)).into_response())
}

/// GET|POST /{username}/unfollow/
async fn profile_unfollow(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let author = find_author(&state, &username)?;

    if state.follows.unfollow(&user.id, &author.id).await? {
        tracing::info!("{} unfollowed {}", user.username, author.username);
    }

    Ok(Redirect::to(&profile_url(&author.username)).into_response())
}

/// GET /follow/
async fn follow_index(
    State(state): State<AppState>,
    user: CurrentUser,
    PageParam(request): PageParam,
) -> AppResult<Html<FollowFeedTemplate>> {
    let page = {
        let conn = state.db.get()?;
        fetch_page(&conn, FeedKind::FollowedBy(&user.id), request, &state.paginator())?
    };

    Ok(Html(FollowFeedTemplate {
        viewer: Some(user.username),
        page,
    }))
}
