use axum::extract::{FromRequestParts, Query};
use axum::http::{header, HeaderMap, Uri};
use axum::http::request::Parts;
use serde::Deserialize;

use crate::auth::session;
use crate::error::AppError;
use crate::feed::PageRequest;
use crate::state::AppState;

/// Represents the currently authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
}

/// Extractor that requires authentication.
/// Anonymous requests are sent to the login page with a return path.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match resolve_user(parts, state)? {
            Some(user) => Ok(user),
            None => Err(AppError::LoginRequired {
                next: return_path(&parts.uri),
            }),
        }
    }
}

/// Path plus query string, so login lands back on the same page of a feed.
fn return_path(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

/// Optional user extractor: None instead of a login redirect for guests.
pub struct MaybeUser(pub Option<CurrentUser>);

impl MaybeUser {
    pub fn username(&self) -> Option<String> {
        self.0.as_ref().map(|u| u.username.clone())
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(resolve_user(parts, state)?))
    }
}

fn resolve_user(parts: &Parts, state: &AppState) -> Result<Option<CurrentUser>, AppError> {
    let Some(token) = session_token(&parts.headers, &state.config.auth.cookie_name) else {
        return Ok(None);
    };

    let conn = state.db.get()?;
    let user = session::user_for_token(&conn, token)?;
    Ok(user.map(|u| CurrentUser {
        id: u.id,
        username: u.username,
    }))
}

pub fn session_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == cookie_name && !val.is_empty() {
                Some(val)
            } else {
                None
            }
        })
}

#[derive(Deserialize)]
struct PageParams {
    page: Option<String>,
}

/// The `?page=` query parameter, normalised. Never rejects.
pub struct PageParam(pub PageRequest);

impl<S: Send + Sync> FromRequestParts<S> for PageParam {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let page = Query::<PageParams>::from_request_parts(parts, state)
            .await
            .ok()
            .and_then(|Query(params)| params.page);
        Ok(PageParam(PageRequest::parse(page.as_deref())))
    }
}
