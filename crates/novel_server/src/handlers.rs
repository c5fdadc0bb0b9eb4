//! API route handlers

use crate::error::ApiError;
use crate::SharedContext;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use novel_core::{AppError, FileEntry, ScanMode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio_util::io::ReaderStream;

#[derive(Deserialize, Debug)]
pub(crate) struct FilesQuery {
    #[serde(rename = "viewType")]
    view_type: Option<String>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct PathQuery {
    path: Option<String>,
}

#[derive(Serialize, Debug)]
pub(crate) struct CurrentDirectory {
    path: String,
}

#[derive(Serialize, Debug)]
pub(crate) struct Preview {
    preview: String,
}

/// `GET /api/current-directory`
pub(crate) async fn current_directory(State(ctx): State<SharedContext>) -> Json<CurrentDirectory> {
    let path = ctx
        .library_root()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default();
    Json(CurrentDirectory { path })
}

/// `GET /api/files?viewType=list|tree`
pub(crate) async fn files(
    State(ctx): State<SharedContext>,
    Query(query): Query<FilesQuery>,
) -> Result<Json<Vec<FileEntry>>, ApiError> {
    // Unknown view types fall back to the flat list
    let mode = query
        .view_type
        .as_deref()
        .and_then(|v| v.parse::<ScanMode>().ok())
        .unwrap_or_default();

    let options = ctx.scan_options(mode).with_forward_slashes(true);
    let entries = tokio::task::spawn_blocking(move || ctx.scan_with(&options)).await?;
    Ok(Json(entries))
}

/// Access-checked file path from a `?path=` query
async fn requested_file(ctx: &SharedContext, query: PathQuery) -> Result<std::path::PathBuf, ApiError> {
    let requested = query
        .path
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing file path parameter".to_string()))?;

    let path = ctx.resolve_in_library(&requested)?;

    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => Ok(path),
        Ok(_) => Err(AppError::NotFound(requested).into()),
        Err(e) => Err(novel_fs::FsError::from_io(&path, e).into()),
    }
}

/// `GET /api/preview?path=...`
pub(crate) async fn preview(
    State(ctx): State<SharedContext>,
    Query(query): Query<PathQuery>,
) -> Result<Json<Preview>, ApiError> {
    let path = requested_file(&ctx, query).await?;
    let preview = tokio::task::spawn_blocking(move || ctx.preview(&path)).await??;
    Ok(Json(Preview { preview }))
}

/// `Content-Disposition` value that survives non-ASCII file names
fn attachment_disposition(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "download".to_string());

    let fallback: String = name
        .chars()
        .map(|c| if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' { c } else { '_' })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(&name)
    )
}

/// `GET /api/download?path=...` streams the raw bytes
pub(crate) async fn download(
    State(ctx): State<SharedContext>,
    Query(query): Query<PathQuery>,
) -> Result<Response, ApiError> {
    let path = requested_file(&ctx, query).await?;

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|e| novel_fs::FsError::from_io(&path, e))?;
    let length = file
        .metadata()
        .await
        .map_err(|e| novel_fs::FsError::from_io(&path, e))?
        .len();

    tracing::info!("Serving download: {}", path.display());

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&attachment_disposition(&path))
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );

    let body = Body::from_stream(ReaderStream::new(file));
    Ok((headers, body).into_response())
}
