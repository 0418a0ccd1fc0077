//! HTTP surface: one route per feed variant plus a health check.
//!
//! Each request runs [`Publisher::publish`] to completion; there is no
//! background refresh.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

use crate::publish::{FeedVariant, PublishError, Publisher};

/// Shared state handed to every handler.
pub struct AppState {
    pub publisher: Publisher,
    /// Download base used for artifact links.
    pub base_url: String,
}

/// Wraps [`PublishError`] so handlers can use `?`.
#[derive(Debug)]
pub struct AppError(PublishError);

impl From<PublishError> for AppError {
    fn from(err: PublishError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "Publishing failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("feed unavailable: {}", self.0),
        )
            .into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/rss10.xml", get(rss10))
        .route("/rss20.xml", get(rss20))
        .route("/changelog.html", get(changelog_html))
        .route("/health", get(health))
        .with_state(state)
}

async fn serve_variant(state: &AppState, variant: FeedVariant) -> Result<Response, AppError> {
    let bytes = state.publisher.publish(variant, &state.base_url).await?;
    Ok(([(header::CONTENT_TYPE, variant.content_type())], bytes).into_response())
}

async fn rss10(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    serve_variant(&state, FeedVariant::Rss10).await
}

async fn rss20(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    serve_variant(&state, FeedVariant::Rss20).await
}

async fn changelog_html(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    serve_variant(&state, FeedVariant::Html).await
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn state_with_cache(dir: &std::path::Path) -> Arc<AppState> {
        let config = Config {
            cache_dir: dir.to_path_buf(),
            ..Config::default()
        };
        Arc::new(AppState {
            publisher: Publisher::from_config(&config).unwrap(),
            base_url: config.base_url.clone(),
        })
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let response = router(state_with_cache(dir.path()))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_serves_cached_variant_with_content_type() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rss20.xml"), "<rss version=\"2.0\"/>").unwrap();

        let response = router(state_with_cache(dir.path()))
            .oneshot(Request::get("/rss20.xml").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/rss+xml; charset=utf-8"
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"<rss version=\"2.0\"/>");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let response = router(state_with_cache(dir.path()))
            .oneshot(Request::get("/atom.xml").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
