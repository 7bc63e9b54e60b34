use askama::Template;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use crate::auth::password;
use crate::auth::session;
use crate::db::models::FieldErrors;
use crate::db::users;
use crate::error::{AppError, AppResult};
use crate::extractors::{session_token, MaybeUser};
use crate::routes::home::Html;
use crate::state::AppState;

// -- Templates --

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub viewer: Option<String>,
    pub username: String,
    pub next: String,
    pub error: String,
}

#[derive(Template)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub viewer: Option<String>,
    pub username: String,
    pub errors: FieldErrors,
}

// -- Request types --

#[derive(Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub next: String,
}

#[derive(Deserialize)]
pub struct SignupForm {
    pub username: String,
    pub password1: String,
    pub password2: String,
}

// -- Cookie helpers --

fn session_cookie(name: &str, token: &str, max_age_hours: u64) -> String {
    let max_age_secs = max_age_hours * 3600;
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        name, token, max_age_secs
    )
}

fn clear_session_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", name)
}

/// Only same-site absolute paths are followed after login.
pub fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}

fn logged_in(state: &AppState, token: &str, to: &str) -> Response {
    (
        AppendHeaders([(
            header::SET_COOKIE,
            session_cookie(
                &state.config.auth.cookie_name,
                token,
                state.config.auth.session_hours,
            ),
        )]),
        Redirect::to(to),
    )
        .into_response()
}

// -- Login --

/// GET /auth/login/
pub async fn login_page(
    MaybeUser(user): MaybeUser,
    Query(query): Query<NextQuery>,
) -> AppResult<Response> {
    let next = safe_next(query.next.as_deref());
    if user.is_some() {
        return Ok(Redirect::to(&next).into_response());
    }

    Ok(Html(LoginTemplate {
        viewer: None,
        username: String::new(),
        next,
        error: String::new(),
    })
    .into_response())
}

/// POST /auth/login/
pub async fn login_submit(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let username = form.username.trim().to_string();
    let next = safe_next(Some(&form.next));

    let conn = state.db.get()?;
    let verified = match users::credentials(&conn, &username)? {
        Some((user, Some(hash))) if password::verify_password(&form.password, &hash) => Some(user),
        _ => None,
    };

    let Some(user) = verified else {
        tracing::info!("Failed login for {}", username);
        return Ok(Html(LoginTemplate {
            viewer: None,
            username,
            next,
            error: "Please enter a correct username and password.".to_string(),
        })
        .into_response());
    };

    let token = session::create_session(&conn, &user.id, state.config.auth.session_hours)?;
    tracing::info!("User {} logged in", user.username);

    Ok(logged_in(&state, &token, &next))
}

// -- Signup --

/// GET /auth/signup/
pub async fn signup_page(MaybeUser(user): MaybeUser) -> AppResult<Response> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    Ok(Html(SignupTemplate {
        viewer: None,
        username: String::new(),
        errors: FieldErrors::default(),
    })
    .into_response())
}

/// POST /auth/signup/
pub async fn signup_submit(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    let username = form.username.trim().to_string();

    let mut errors = FieldErrors::default();
    password::validate_username(&username, &mut errors);
    password::validate_new_password(&form.password1, &form.password2, &mut errors);
    if !errors.is_empty() {
        return Ok(Html(SignupTemplate {
            viewer: None,
            username,
            errors,
        })
        .into_response());
    }

    let password = form.password1;
    let hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let conn = state.db.get()?;
    let Some(user) = users::create_user(&conn, &username, Some(&hash))? else {
        let mut errors = FieldErrors::default();
        errors.add("username", "A user with that username already exists.");
        return Ok(Html(SignupTemplate {
            viewer: None,
            username,
            errors,
        })
        .into_response());
    };

    let token = session::create_session(&conn, &user.id, state.config.auth.session_hours)?;
    tracing::info!("Registered user {}", user.username);

    Ok(logged_in(&state, &token, "/"))
}

// -- Logout --

/// GET|POST /auth/logout/
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let cookie_name = state.config.auth.cookie_name.clone();
    if let Some(token) = session_token(&headers, &cookie_name) {
        let conn = state.db.get()?;
        session::delete_session(&conn, token)?;
    }

    Ok((
        AppendHeaders([(header::SET_COOKIE, clear_session_cookie(&cookie_name))]),
        Redirect::to("/"),
    )
        .into_response())
}
