//! HTTP API over the hackathon feed.
//!
//! # Routes
//!
//! | Method | Path | Response |
//! |--------|------|----------|
//! | GET | `/api/hackathons` | `{"status":"success","count":N,"data":[...]}` |
//! | GET | `/api/hackathons/{source}` | Same, filtered by source (any case) |
//! | POST | `/api/cache/clear` | `{"status":"success","message":"cache cleared"}` |
//! | GET | `/api/cache/status` | `{"status":"success", ...cache status}` |
//! | GET | `/health` | `ok` |
//!
//! A service error becomes `500 {"status":"error","message":"..."}`.

use crate::error::ServiceError;
use crate::models::Hackathon;
use crate::service::{CacheStatus, HackathonService};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, instrument};

#[derive(Debug, Serialize)]
struct FeedResponse {
    status: &'static str,
    count: usize,
    data: Vec<Hackathon>,
}

impl FeedResponse {
    fn new(data: Vec<Hackathon>) -> Self {
        Self {
            status: "success",
            count: data.len(),
            data,
        }
    }
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    status: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    #[serde(flatten)]
    cache: CacheStatus,
}

struct ApiError(ServiceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "Request failed");
        let body = MessageResponse {
            status: "error",
            message: self.0.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        Self(e)
    }
}

pub fn router(service: Arc<HackathonService>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/hackathons", get(list_hackathons))
        .route("/api/hackathons/{source}", get(list_by_source))
        .route("/api/cache/clear", post(clear_cache))
        .route("/api/cache/status", get(cache_status))
        .with_state(service)
}

#[instrument(level = "info", skip_all)]
async fn list_hackathons(
    State(service): State<Arc<HackathonService>>,
) -> Result<Json<FeedResponse>, ApiError> {
    let hackathons = service.get_hackathons().await?;
    Ok(Json(FeedResponse::new(hackathons)))
}

#[instrument(level = "info", skip_all, fields(%source))]
async fn list_by_source(
    State(service): State<Arc<HackathonService>>,
    Path(source): Path<String>,
) -> Result<Json<FeedResponse>, ApiError> {
    let hackathons = service.get_hackathons_by_source(&source).await?;
    Ok(Json(FeedResponse::new(hackathons)))
}

async fn clear_cache(State(service): State<Arc<HackathonService>>) -> Json<MessageResponse> {
    service.clear_cache().await;
    Json(MessageResponse {
        status: "success",
        message: "cache cleared".to_string(),
    })
}

async fn cache_status(State(service): State<Arc<HackathonService>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "success",
        cache: service.cache_status().await,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::service;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app(dir: &TempDir) -> Router {
        let (svc, _) = service(dir);
        router(Arc::new(svc))
    }

    async fn call(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request build");
        let resp = app.clone().oneshot(req).await.expect("router response");
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_list_hackathons() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);
        let (status, body) = call(&app, "GET", "/api/hackathons").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["count"], 3);
        assert_eq!(body["data"][0]["source"], "MLH");
        assert_eq!(body["data"][2]["source"], "HackerEarth");
        assert!(body["data"][2]["description"].is_string());
        assert!(body["data"][0].get("description").is_none());
    }

    #[tokio::test]
    async fn test_list_by_source_any_case() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);
        let (_, lower) = call(&app, "GET", "/api/hackathons/mlh").await;
        let (_, upper) = call(&app, "GET", "/api/hackathons/MLH").await;
        assert_eq!(lower, upper);
        assert_eq!(lower["count"], 2);

        let (status, none) = call(&app, "GET", "/api/hackathons/devpost").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(none["count"], 0);
    }

    #[tokio::test]
    async fn test_clear_and_status() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);
        call(&app, "GET", "/api/hackathons").await;

        let (_, status) = call(&app, "GET", "/api/cache/status").await;
        assert_eq!(status["status"], "success");
        assert_eq!(status["populated"], true);
        assert_eq!(status["count"], 3);

        let (code, cleared) = call(&app, "POST", "/api/cache/clear").await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(cleared["message"], "cache cleared");

        let (_, status) = call(&app, "GET", "/api/cache/status").await;
        assert_eq!(status["populated"], false);
        assert_eq!(status["count"], 0);
        assert!(status["last_update"].is_null());
    }

    #[tokio::test]
    async fn test_health() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn test_service_error_is_500() {
        let resp = ApiError(ServiceError::RefreshAborted("task panicked".into())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
