//! HTTP surface of the bridge: routing and request validation.
//!
//! Handlers only ever push onto the [`JobQueue`]; nothing here touches host
//! state. No per-request logging happens above `debug`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use dispatch::{JobQueue, LOG_TARGET};
use http_body_util::LengthLimitError;
use sushi_core::{BRIDGE_PATH, ErrorResponse, HealthResponse, ImportRequest, QueuedResponse};

use crate::config::BridgeConfig;

/// Shared state for the bridge handlers.
#[derive(Debug, Clone)]
pub struct BridgeServer {
    queue: Arc<JobQueue>,
    read_timeout: Duration,
    max_body_bytes: usize,
}

impl BridgeServer {
    pub fn new(queue: Arc<JobQueue>, config: &BridgeConfig) -> Self {
        Self {
            queue,
            read_timeout: config.read_timeout,
            max_body_bytes: config.max_body_bytes,
        }
    }

    pub fn queue(&self) -> &Arc<JobQueue> {
        &self.queue
    }

    /// Build the router for `/sushi`; every other path is a bare 404.
    pub fn router(self) -> Router {
        Router::new()
            .route(BRIDGE_PATH, get(health).post(enqueue))
            .fallback(not_found)
            .with_state(self)
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

async fn enqueue(State(server): State<BridgeServer>, headers: HeaderMap, body: Body) -> Response {
    if declared_length(&headers).is_some_and(|len| len > server.max_body_bytes) {
        return StatusCode::PAYLOAD_TOO_LARGE.into_response();
    }

    let bytes = match read_body(body, server.read_timeout, server.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(status) => return status.into_response(),
    };

    let request = match parse_request(&bytes) {
        Ok(request) => request,
        Err(rejection) => return rejection,
    };

    let Some(job) = request.into_job() else {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse::unknown_action())).into_response();
    };

    let queued = job.len();
    tracing::debug!(target: LOG_TARGET, job_id = %job.id(), files = queued, "Queued import job");
    server.queue.push(job);

    Json(QueuedResponse::new(queued)).into_response()
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Read the whole body within `timeout`.
///
/// A body that is too slow yields 408 and one over `limit` yields 413. A body
/// that breaks off midway is treated like unparseable input.
async fn read_body(body: Body, timeout: Duration, limit: usize) -> Result<Bytes, StatusCode> {
    match tokio::time::timeout(timeout, axum::body::to_bytes(body, limit)).await {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err(err)) if exceeded_limit(&err) => Err(StatusCode::PAYLOAD_TOO_LARGE),
        Ok(Err(_)) => Ok(Bytes::new()),
        Err(_) => Err(StatusCode::REQUEST_TIMEOUT),
    }
}

fn exceeded_limit(err: &axum::Error) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}

/// Two-stage parse: syntax first, so malformed JSON and well-formed JSON of
/// the wrong shape get different errors.
fn parse_request(bytes: &[u8]) -> Result<ImportRequest, Response> {
    let value: serde_json::Value = serde_json::from_slice(bytes).map_err(|_| {
        (StatusCode::BAD_REQUEST, Json(ErrorResponse::invalid_json())).into_response()
    })?;

    serde_json::from_value(value).map_err(|_| {
        (StatusCode::BAD_REQUEST, Json(ErrorResponse::unknown_action())).into_response()
    })
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, Request};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    fn app(queue: Arc<JobQueue>) -> Router {
        BridgeServer::new(queue, &BridgeConfig::ephemeral()).router()
    }

    /// Helper to send a request to the router and collect status + body.
    async fn send(app: Router, method: Method, uri: &str, body: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn json_body(body: &str) -> Value {
        serde_json::from_str(body).unwrap()
    }

    #[tokio::test]
    async fn health_check_reports_app() {
        let (status, body) = send(app(Arc::new(JobQueue::new())), Method::GET, "/sushi", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"status":"ok","app":"sushi-bridge"}"#);
    }

    #[tokio::test]
    async fn import_queues_one_job_with_all_files() {
        let queue = Arc::new(JobQueue::new());
        let payload = json!({"action": "import", "files": ["/a.glb", "/b.gltf", "rel/c.glb"]});

        let (status, body) = send(
            app(queue.clone()),
            Method::POST,
            "/sushi",
            &payload.to_string(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body), json!({"status": "ok", "queued": 3}));

        let jobs = queue.drain_all();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].files(), ["/a.glb", "/b.gltf", "rel/c.glb"]);
    }

    #[tokio::test]
    async fn malformed_json_is_rejected_without_queueing() {
        let queue = Arc::new(JobQueue::new());
        for body in ["{not json", "", r#"{"action":"import","files":["#] {
            let (status, text) = send(app(queue.clone()), Method::POST, "/sushi", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
            assert_eq!(json_body(&text), json!({"error": "invalid json"}));
        }
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn wrong_action_or_no_files_is_rejected_without_queueing() {
        let queue = Arc::new(JobQueue::new());
        let bodies = [
            json!({"action": "import", "files": []}),
            json!({"action": "import"}),
            json!({"action": "import", "files": null}),
            json!({"action": "export", "files": ["/a.glb"]}),
            json!({"files": ["/a.glb"]}),
            json!({"action": 7, "files": ["/a.glb"]}),
            json!({"action": "import", "files": [1, 2]}),
            json!(["/a.glb"]),
            json!({}),
        ];
        for payload in bodies {
            let (status, text) = send(
                app(queue.clone()),
                Method::POST,
                "/sushi",
                &payload.to_string(),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload}");
            assert_eq!(json_body(&text), json!({"error": "unknown action or no files"}));
        }
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn other_paths_are_not_found_for_both_methods() {
        let queue = Arc::new(JobQueue::new());
        let payload = json!({"action": "import", "files": ["/a.glb"]}).to_string();
        for uri in ["/", "/sushi/", "/other", "/sushi/import"] {
            let (status, body) = send(app(queue.clone()), Method::GET, uri, "").await;
            assert_eq!(status, StatusCode::NOT_FOUND, "GET {uri}");
            assert!(body.is_empty());

            let (status, body) = send(app(queue.clone()), Method::POST, uri, &payload).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "POST {uri}");
            assert!(body.is_empty());
        }
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn oversized_body_is_refused() {
        let queue = Arc::new(JobQueue::new());
        let router = BridgeServer::new(
            queue.clone(),
            &BridgeConfig::ephemeral().with_max_body_bytes(16),
        )
        .router();
        let payload = json!({"action": "import", "files": ["/a/very/long/path.glb"]}).to_string();

        let (status, _) = send(router, Method::POST, "/sushi", &payload).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn sequential_posts_drain_in_order() {
        let queue = Arc::new(JobQueue::new());
        for name in ["first", "second", "third"] {
            let payload = json!({"action": "import", "files": [format!("/{name}.glb")]});
            let (status, _) = send(
                app(queue.clone()),
                Method::POST,
                "/sushi",
                &payload.to_string(),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let order: Vec<String> = queue
            .drain_all()
            .into_iter()
            .flat_map(|job| job.into_files())
            .collect();
        assert_eq!(order, ["/first.glb", "/second.glb", "/third.glb"]);
    }
}
