#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use quire::auth::session;
use quire::cache::ManualClock;
use quire::config::Config;
use quire::db::models::{NewPost, Post};
use quire::db::{self, groups, posts, users};
use quire::state::AppState;
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "quire-test-boundary";

pub const SMALL_GIF: &[u8] = b"\x47\x49\x46\x38\x39\x61\x02\x00\x01\x00\x80\x00\x00\x00\x00\x00\
\xFF\xFF\xFF\x21\xF9\x04\x00\x00\x00\x00\x00\x2C\x00\x00\x00\x00\x02\x00\x01\x00\x00\x02\x02\x0C\x0A\x00\x3B";

pub struct TestApp {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    // Keeps the database and media directory alive for the test
    _dir: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> &str {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    /// Number of post cards rendered on the page.
    pub fn card_count(&self) -> usize {
        self.body.matches("class=\"card post\"").count()
    }
}

pub fn test_app() -> TestApp {
    let dir = TempDir::new().expect("temp dir");
    let pool = db::create_pool(&dir.path().join("test.db")).expect("pool");
    db::run_migrations(&pool).expect("migrations");

    let mut config = Config::default();
    config.resolve_paths(dir.path());

    let clock = Arc::new(ManualClock::new());
    let state = AppState::with_clock(pool, config, clock.clone());

    TestApp {
        state,
        clock,
        _dir: dir,
    }
}

impl TestApp {
    pub fn router(&self) -> Router {
        quire::routes::app(self.state.clone())
    }

    pub fn user(&self, username: &str) -> String {
        let conn = self.state.db.get().unwrap();
        users::create_user(&conn, username, None).unwrap().unwrap().id
    }

    /// Cookie header value for a fresh session of `user_id`.
    pub fn login(&self, user_id: &str) -> String {
        let conn = self.state.db.get().unwrap();
        let token = session::create_session(&conn, user_id, 1).unwrap();
        format!("{}={}", self.state.config.auth.cookie_name, token)
    }

    pub fn group(&self, slug: &str, title: &str) -> String {
        let conn = self.state.db.get().unwrap();
        groups::create_group(&conn, slug, title, "").unwrap().0.id
    }

    pub fn post_at(
        &self,
        author_id: &str,
        text: &str,
        group_id: Option<&str>,
        pub_date: DateTime<Utc>,
    ) -> Post {
        let conn = self.state.db.get().unwrap();
        let new = NewPost::new(author_id, text, pub_date)
            .unwrap()
            .group(group_id.map(str::to_string));
        posts::insert_post(&conn, &new).unwrap()
    }

    /// `count` posts, one minute apart, the last one newest.
    pub fn posts(&self, author_id: &str, count: usize, prefix: &str) -> Vec<Post> {
        let start = Utc::now() - Duration::hours(1);
        (1..=count)
            .map(|i| {
                self.post_at(
                    author_id,
                    &format!("{} {:02}", prefix, i),
                    None,
                    start + Duration::minutes(i as i64),
                )
            })
            .collect()
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router().oneshot(request).await.expect("router responds");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, cookie: Option<&str>, form: &str) -> TestResponse {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap())
            .await
    }

    pub async fn post_multipart(&self, uri: &str, cookie: &str, body: Vec<u8>) -> TestResponse {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::COOKIE, cookie)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }
}

/// A multipart body with plain fields and an optional file part.
pub fn multipart(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, content_type, data)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, file_name, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}
