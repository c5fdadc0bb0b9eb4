//! NovelShelf HTTP interface
//!
//! Exposes library browsing, preview and download over a local HTTP API.
//! Every file path arriving in a query passes the root containment check
//! before the filesystem is touched.

mod error;
mod handlers;

pub use error::ApiError;

use axum::http::Method;
use axum::routing::get;
use axum::Router;
use novel_core::AppContext;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub(crate) type SharedContext = Arc<AppContext>;

/// Build the API router over a shared context
pub fn router(ctx: SharedContext) -> Router {
    let timeout = Duration::from_secs(ctx.config().server.request_timeout_secs.max(1));

    let cors = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_origin(Any);

    Router::new()
        .route("/api/current-directory", get(handlers::current_directory))
        .route("/api/files", get(handlers::files))
        .route("/api/preview", get(handlers::preview))
        .route("/api/download", get(handlers::download))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(ctx)
}

/// Serve the API on `addr` until Ctrl-C
pub async fn serve(ctx: SharedContext, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Novel server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Novel server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use novel_core::AppConfig;
    use serde_json::Value;
    use std::fs;
    use tower::ServiceExt;

    struct Fixture {
        _dir: tempfile::TempDir,
        root: std::path::PathBuf,
        ctx: SharedContext,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "第一章 开始\r\n他走进了房间。").unwrap();
        fs::write(dir.path().join("b.md"), "notes").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let (gbk, _, _) = encoding_rs::GBK.encode("第三章 下山\n他背着剑，一路向南。");
        fs::write(dir.path().join("sub").join("c.txt"), &gbk).unwrap();

        let ctx = Arc::new(AppContext::new(AppConfig::default(), None));
        let root = ctx.open_library(dir.path()).unwrap();
        Fixture { _dir: dir, root, ctx }
    }

    async fn get(ctx: &SharedContext, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = router(ctx.clone())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    async fn get_json(ctx: &SharedContext, uri: &str) -> (StatusCode, Value) {
        let (status, _, body) = get(ctx, uri).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn query_path(path: &std::path::Path) -> String {
        urlencoding::encode(&path.to_string_lossy()).into_owned()
    }

    #[tokio::test]
    async fn test_current_directory() {
        let fx = fixture();
        let (status, json) = get_json(&fx.ctx, "/api/current-directory").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["path"], fx.root.to_string_lossy().replace('\\', "/"));
    }

    #[tokio::test]
    async fn test_files_list_and_tree() {
        let fx = fixture();

        let (status, json) = get_json(&fx.ctx, "/api/files").await;
        assert_eq!(status, StatusCode::OK);
        let list = json.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.iter().all(|e| e["type"] == "file"));
        assert!(list.iter().all(|e| !e["path"].as_str().unwrap().contains('\\')));

        let (_, json) = get_json(&fx.ctx, "/api/files?viewType=tree").await;
        let tree = json.as_array().unwrap();
        let sub = tree.iter().find(|e| e["name"] == "sub").unwrap();
        assert_eq!(sub["type"], "directory");
        assert_eq!(sub["children"][0]["name"], "c.txt");

        // Unknown view types behave like list
        let (_, json) = get_json(&fx.ctx, "/api/files?viewType=grid").await;
        assert_eq!(json.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_files_without_library_is_empty() {
        let ctx = Arc::new(AppContext::new(AppConfig::default(), None));
        let (status, json) = get_json(&ctx, "/api/files").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_preview_utf8_and_gbk() {
        let fx = fixture();

        let uri = format!("/api/preview?path={}", query_path(&fx.root.join("a.txt")));
        let (status, json) = get_json(&fx.ctx, &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["preview"], "第一章 开始\n他走进了房间。");

        let uri = format!(
            "/api/preview?path={}",
            query_path(&fx.root.join("sub").join("c.txt"))
        );
        let (status, json) = get_json(&fx.ctx, &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["preview"], "第三章 下山\n他背着剑，一路向南。");
    }

    #[tokio::test]
    async fn test_preview_rejections() {
        let fx = fixture();

        let (status, json) = get_json(&fx.ctx, "/api/preview").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());

        let escape = format!("{}/sub/../../etc/passwd", fx.root.to_string_lossy());
        let uri = format!("/api/preview?path={}", urlencoding::encode(&escape));
        let (status, _) = get_json(&fx.ctx, &uri).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let uri = format!("/api/preview?path={}", query_path(&fx.root.join("gone.txt")));
        let (status, _) = get_json(&fx.ctx, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_download_streams_raw_bytes() {
        let fx = fixture();
        let source = fx.root.join("sub").join("c.txt");

        let uri = format!("/api/download?path={}", query_path(&source));
        let (status, headers, body) = get(&fx.ctx, &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, fs::read(&source).unwrap());
        assert_eq!(headers[header::CONTENT_TYPE], "application/octet-stream");
        let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.starts_with("attachment;"));
        assert!(disposition.contains("c.txt"));
    }

    #[tokio::test]
    async fn test_download_outside_root_forbidden() {
        let fx = fixture();
        let outside = tempfile::tempdir().unwrap();
        let secret = outside.path().join("secret.txt");
        fs::write(&secret, "secret").unwrap();

        let uri = format!("/api/download?path={}", query_path(&secret));
        let (status, _, _) = get(&fx.ctx, &uri).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
