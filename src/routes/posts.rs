use askama::Template;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::db::models::{CommentView, FieldErrors, NewPost, Post, PostEdit, User, REQUIRED};
use crate::db::{comments, groups, posts};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::feed::{fetch_post, FeedPost};
use crate::media::{self, Upload};
use crate::routes::home::Html;
use crate::routes::profile::find_author;
use crate::state::AppState;

const INVALID_GROUP: &str = "Select a valid choice. That choice is not one of the available choices.";

// --- Templates ---

#[derive(Template)]
#[template(path = "posts/post.html")]
pub struct PostTemplate {
    pub viewer: Option<String>,
    pub post: FeedPost,
    pub author_post_count: i64,
    pub comments: Vec<CommentView>,
    pub comment_text: String,
    pub errors: FieldErrors,
    pub can_edit: bool,
}

/// One `<option>` of the group select.
pub struct GroupChoice {
    pub id: String,
    pub title: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "posts/new.html")]
pub struct PostFormTemplate {
    pub viewer: Option<String>,
    pub editing: bool,
    pub post_id: String,
    pub action: String,
    pub text: String,
    pub groups: Vec<GroupChoice>,
    pub current_image: Option<String>,
    pub errors: FieldErrors,
}

// --- Forms ---

#[derive(Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

/// Fields of the multipart post form.
#[derive(Debug, Default)]
pub struct PostSubmission {
    pub text: String,
    pub group: Option<String>,
    pub image: Option<Upload>,
    pub clear_image: bool,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/new/", get(new_post_page).post(create_post))
        .route("/{username}/{post_id}/", get(post_view))
        .route("/{username}/{post_id}/edit/", get(edit_page).post(edit_post))
        .route(
            "/{username}/{post_id}/comment",
            get(comment_redirect).post(add_comment),
        )
}

fn post_url(username: &str, post_id: &str) -> String {
    format!("/{}/{}/", username, post_id)
}

fn bad_multipart(e: MultipartError) -> AppError {
    AppError::BadRequest(format!("Invalid form data: {}", e))
}

async fn read_submission(mut multipart: Multipart) -> AppResult<PostSubmission> {
    let mut submission = PostSubmission::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text" => submission.text = field.text().await.map_err(bad_multipart)?,
            "group" => {
                let value = field.text().await.map_err(bad_multipart)?;
                submission.group = Some(value.trim().to_string()).filter(|v| !v.is_empty());
            }
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(bad_multipart)?;
                let upload = Upload {
                    file_name,
                    content_type,
                    data,
                };
                submission.image = Some(upload).filter(|u| !u.is_empty());
            }
            "image-clear" => submission.clear_image = true,
            _ => {}
        }
    }

    Ok(submission)
}

/// Field-level checks shared by create and edit. Nothing is written here.
fn validate(state: &AppState, submission: &PostSubmission) -> AppResult<FieldErrors> {
    let mut errors = FieldErrors::default();

    if submission.text.trim().is_empty() {
        errors.add("text", REQUIRED);
    }
    if let Some(group_id) = &submission.group {
        let conn = state.db.get()?;
        if groups::find_by_id(&conn, group_id)?.is_none() {
            errors.add("group", INVALID_GROUP);
        }
    }
    if let Some(upload) = &submission.image {
        if upload.data.is_empty() || upload.image_extension().is_none() {
            errors.add("image", media::INVALID_IMAGE);
        }
    }

    Ok(errors)
}

/// Store the upload, if any. Must only run after `validate` passed.
async fn store_upload(state: &AppState, submission: &PostSubmission) -> AppResult<Option<String>> {
    let Some(upload) = &submission.image else {
        return Ok(None);
    };
    match media::save_image(&state.config.media_path(), upload).await? {
        Some(path) => Ok(Some(path)),
        None => Err(AppError::BadRequest(media::INVALID_IMAGE.into())),
    }
}

fn group_choices(state: &AppState, selected: Option<&str>) -> AppResult<Vec<GroupChoice>> {
    let conn = state.db.get()?;
    Ok(groups::list_groups(&conn)?
        .into_iter()
        .map(|g| GroupChoice {
            selected: selected == Some(g.id.as_str()),
            id: g.id,
            title: g.title,
        })
        .collect())
}

/// Resolve `/{username}/{post_id}/` to its author and post, or NotFound.
fn author_post(state: &AppState, username: &str, post_id: &str) -> AppResult<(User, Post)> {
    let author = find_author(state, username)?;
    let conn = state.db.get()?;
    let post = posts::find_for_author(&conn, post_id, &author.id)?.ok_or(AppError::NotFound)?;
    Ok((author, post))
}

// --- Single post ---

fn render_post_page(
    state: &AppState,
    viewer: Option<CurrentUser>,
    username: &str,
    post_id: &str,
    comment_text: String,
    errors: FieldErrors,
) -> AppResult<Html<PostTemplate>> {
    let author = find_author(state, username)?;
    let conn = state.db.get()?;
    let post = fetch_post(&conn, post_id, &author.id)?.ok_or(AppError::NotFound)?;
    let author_post_count = posts::count_by_author(&conn, &author.id)?;
    let comments = comments::for_post(&conn, &post.id)?;

    Ok(Html(PostTemplate {
        can_edit: viewer.as_ref().is_some_and(|v| v.id == author.id),
        viewer: viewer.map(|v| v.username),
        post,
        author_post_count,
        comments,
        comment_text,
        errors,
    }))
}

/// GET /{username}/{post_id}/
async fn post_view(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path((username, post_id)): Path<(String, String)>,
) -> AppResult<Html<PostTemplate>> {
    render_post_page(
        &state,
        viewer,
        &username,
        &post_id,
        String::new(),
        FieldErrors::default(),
    )
}

// --- Create ---

/// GET /new/
async fn new_post_page(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Html<PostFormTemplate>> {
    Ok(Html(PostFormTemplate {
        viewer: Some(user.username),
        editing: false,
        post_id: String::new(),
        action: "/new/".to_string(),
        text: String::new(),
        groups: group_choices(&state, None)?,
        current_image: None,
        errors: FieldErrors::default(),
    }))
}

/// POST /new/
async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> AppResult<Response> {
    let submission = read_submission(multipart).await?;

    let errors = validate(&state, &submission)?;
    if !errors.is_empty() {
        tracing::debug!("Rejected new post from {}", user.username);
        return Ok(Html(PostFormTemplate {
            viewer: Some(user.username),
            editing: false,
            post_id: String::new(),
            action: "/new/".to_string(),
            groups: group_choices(&state, submission.group.as_deref())?,
            text: submission.text,
            current_image: None,
            errors,
        })
        .into_response());
    }

    let image = store_upload(&state, &submission).await?;
    let new_post = match NewPost::new(&user.id, &submission.text, Utc::now()) {
        Ok(post) => post.group(submission.group).image(image),
        Err(errors) => {
            return Ok(Html(PostFormTemplate {
                viewer: Some(user.username),
                editing: false,
                post_id: String::new(),
                action: "/new/".to_string(),
                groups: group_choices(&state, None)?,
                text: submission.text,
                current_image: None,
                errors,
            })
            .into_response())
        }
    };

    let post = {
        let conn = state.db.get()?;
        posts::insert_post(&conn, &new_post)?
    };
    tracing::info!("{} published post {}", user.username, post.id);

    Ok(Redirect::to("/").into_response())
}

// --- Edit ---

/// GET /{username}/{post_id}/edit/
async fn edit_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((username, post_id)): Path<(String, String)>,
) -> AppResult<Response> {
    let (author, post) = author_post(&state, &username, &post_id)?;
    if author.id != user.id {
        return Ok(Redirect::to(&post_url(&author.username, &post.id)).into_response());
    }

    Ok(Html(PostFormTemplate {
        viewer: Some(user.username),
        editing: true,
        action: format!("{}edit/", post_url(&author.username, &post.id)),
        groups: group_choices(&state, post.group_id.as_deref())?,
        text: post.text,
        current_image: post.image,
        post_id: post.id,
        errors: FieldErrors::default(),
    })
    .into_response())
}

/// POST /{username}/{post_id}/edit/
async fn edit_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((username, post_id)): Path<(String, String)>,
    multipart: Multipart,
) -> AppResult<Response> {
    let (author, post) = author_post(&state, &username, &post_id)?;
    let view_url = post_url(&author.username, &post.id);
    if author.id != user.id {
        tracing::warn!("{} tried to edit post {} by {}", user.username, post.id, author.username);
        return Ok(Redirect::to(&view_url).into_response());
    }

    let submission = read_submission(multipart).await?;
    let errors = validate(&state, &submission)?;
    if !errors.is_empty() {
        return Ok(Html(PostFormTemplate {
            viewer: Some(user.username),
            editing: true,
            action: format!("{}edit/", view_url),
            groups: group_choices(&state, submission.group.as_deref())?,
            text: submission.text,
            current_image: post.image,
            post_id: post.id,
            errors,
        })
        .into_response());
    }

    let previous = post.image;
    let image = match store_upload(&state, &submission).await? {
        Some(stored) => Some(stored),
        None if submission.clear_image => None,
        None => previous.clone(),
    };
    let replaced = previous.filter(|old| image.as_deref() != Some(old.as_str()));
    let edit = match PostEdit::new(&submission.text, submission.group, image) {
        Ok(edit) => edit,
        Err(errors) => {
            return Ok(Html(PostFormTemplate {
                viewer: Some(user.username),
                editing: true,
                action: format!("{}edit/", view_url),
                groups: group_choices(&state, None)?,
                text: submission.text,
                current_image: None,
                post_id: post.id,
                errors,
            })
            .into_response())
        }
    };

    {
        let conn = state.db.get()?;
        posts::update_post(&conn, &post.id, &edit)?;
    }
    tracing::info!("{} edited post {}", user.username, post.id);

    // Only once the update has committed.
    if let Some(old) = replaced {
        if let Err(e) = media::remove_image(&state.config.media_path(), &old).await {
            tracing::warn!("Could not remove replaced image {}: {}", old, e);
        }
    }

    Ok(Redirect::to(&view_url).into_response())
}

// --- Comments ---

/// GET /{username}/{post_id}/comment
async fn comment_redirect(
    _user: CurrentUser,
    Path((username, post_id)): Path<(String, String)>,
) -> Redirect {
    Redirect::to(&post_url(&username, &post_id))
}

/// POST /{username}/{post_id}/comment
async fn add_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((username, post_id)): Path<(String, String)>,
    Form(form): Form<CommentForm>,
) -> AppResult<Response> {
    let (author, post) = author_post(&state, &username, &post_id)?;

    let created = {
        let conn = state.db.get()?;
        comments::add_comment(&conn, &post.id, &user.id, &form.text, Utc::now())?
    };

    match created {
        Ok(comment) => {
            tracing::info!("{} commented on post {}", user.username, comment.post_id);
            Ok(Redirect::to(&post_url(&author.username, &post.id)).into_response())
        }
        Err(errors) => Ok(render_post_page(
            &state,
            Some(user),
            &author.username,
            &post.id,
            form.text,
            errors,
        )?
        .into_response()),
    }
}
