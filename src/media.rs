use std::path::{Component, Path, PathBuf};

use axum::extract::{Path as UrlPath, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::state::AppState;

/// Directory under the media root that post images are written to.
pub const POST_IMAGE_DIR: &str = "posts";

/// A file field pulled out of a multipart submission.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl Upload {
    /// Browsers send an empty part when no file was chosen.
    pub fn is_empty(&self) -> bool {
        self.file_name.is_empty() && self.data.is_empty()
    }

    /// Extension for the stored file, only if this looks like an image.
    pub fn image_extension(&self) -> Option<&'static str> {
        let declared = self
            .content_type
            .as_deref()
            .and_then(|ct| ct.parse::<mime_guess::mime::Mime>().ok());
        let mime = declared
            .filter(|m| m.type_() == mime_guess::mime::IMAGE)
            .or_else(|| {
                mime_guess::from_path(&self.file_name)
                    .first()
                    .filter(|m| m.type_() == mime_guess::mime::IMAGE)
            })?;

        match mime.subtype().as_str() {
            "gif" => Some("gif"),
            "png" => Some("png"),
            "jpeg" => Some("jpg"),
            "webp" => Some("webp"),
            _ => None,
        }
    }
}

pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Write an image upload under the media root. Returns the stored relative path
/// (e.g. `posts/<uuid>.gif`), or `None` if the upload is not an accepted image.
pub async fn save_image(media_root: &Path, upload: &Upload) -> std::io::Result<Option<String>> {
    let Some(ext) = upload.image_extension() else {
        tracing::warn!("Rejected upload {:?}: not an image", upload.file_name);
        return Ok(None);
    };
    if upload.data.is_empty() {
        return Ok(None);
    }

    let relative = format!("{}/{}.{}", POST_IMAGE_DIR, uuid::Uuid::now_v7(), ext);
    let target = media_root.join(&relative);
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&target, &upload.data).await?;
    tracing::info!("Stored upload {} ({} bytes)", relative, upload.data.len());

    Ok(Some(relative))
}

/// Resolve a URL path under the media root, refusing anything that escapes it.
pub fn resolve(media_root: &Path, requested: &str) -> Option<PathBuf> {
    let relative = Path::new(requested);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(media_root.join(relative))
}

/// Delete a stored image. A file that is already gone is not an error.
/// Returns whether a file was removed.
pub async fn remove_image(media_root: &Path, relative: &str) -> std::io::Result<bool> {
    let Some(target) = resolve(media_root, relative) else {
        tracing::warn!("Refusing to remove {:?} outside the media root", relative);
        return Ok(false);
    };
    match tokio::fs::remove_file(&target).await {
        Ok(()) => {
            tracing::info!("Removed upload {}", relative);
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// GET /media/{*path}
pub async fn serve(State(state): State<AppState>, UrlPath(path): UrlPath<String>) -> Response {
    let Some(file) = resolve(&state.config.media_path(), &path) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match tokio::fs::read(&file).await {
        Ok(data) => {
            let mime = mime_guess::from_path(&file).first_or_octet_stream();
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, mime.as_ref().to_string()),
                    (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
                ],
                data,
            )
                .into_response()
        }
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}
