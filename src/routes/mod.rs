pub mod about;
pub mod assets;
pub mod auth;
pub mod groups;
pub mod home;
pub mod misc;
pub mod posts;
pub mod profile;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// First path segments owned by the site itself; never valid usernames.
pub const RESERVED_PATHS: &[&str] = &[
    "new", "follow", "group", "auth", "about", "assets", "media", "admin",
];

/// The full application router with state applied.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::index))
        .route("/assets/{*path}", get(assets::serve))
        .route("/media/{*path}", get(crate::media::serve))
        .merge(auth::router())
        .merge(about::router())
        .merge(groups::router())
        .merge(profile::router())
        .merge(posts::router())
        .fallback(misc::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
