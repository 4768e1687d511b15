pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::jobs::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/submit", post(handlers::handle_submit))
        .route("/result/:job_id", get(handlers::handle_get_result))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::jobs::lifecycle::JobLifecycle;
    use crate::jobs::worker::{self, PoolConfig, WorkerPool};
    use crate::store::JobStore;
    use crate::testing::{memory_store, unreachable_store, StubGenerator};

    struct TestApp {
        router: Router,
        generator: Arc<StubGenerator>,
        _pool: WorkerPool,
    }

    fn app_with(store: JobStore, generator: StubGenerator, queue_capacity: usize) -> TestApp {
        let generator = Arc::new(generator);
        let (dispatcher, pool) = worker::start(
            JobLifecycle::new(store.clone(), None),
            generator.clone(),
            &PoolConfig {
                concurrency: 1,
                queue_capacity,
            },
        );
        TestApp {
            router: build_router(AppState { store, dispatcher }),
            generator,
            _pool: pool,
        }
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn submit(body: Value) -> Request<Body> {
        Request::post("/submit")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn result(job_id: &str) -> Request<Body> {
        Request::get(format!("/result/{job_id}"))
            .body(Body::empty())
            .unwrap()
    }

    async fn poll_until_terminal(router: &Router, job_id: &str) -> (StatusCode, Value) {
        for _ in 0..400 {
            let (status, body) = send(router, result(job_id)).await;
            if body["status"] != "processing" {
                return (status, body);
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("job {job_id} never left processing");
    }

    #[tokio::test]
    async fn test_submit_poll_complete() {
        let app = app_with(
            memory_store(),
            StubGenerator::succeeding("{\"footer\": \"www.immigrantnetworks.com\"}").gated(),
            8,
        );

        let (status, body) = send(
            &app.router,
            submit(json!({ "name": "Asha", "profession": "Civil Engineer" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "processing");
        assert_eq!(
            body["message"],
            "Job submitted successfully. Poll /result/<job_id> for results."
        );
        let job_id = body["job_id"].as_str().unwrap().to_string();

        let (status, body) = send(&app.router, result(&job_id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "status": "processing",
                "message": "Still processing. Please try again in a few seconds."
            })
        );

        app.generator.release();
        let (status, body) = poll_until_terminal(&app.router, &job_id).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");
        assert_eq!(body["result"], "{\"footer\": \"www.immigrantnetworks.com\"}");
        assert!(body["completed_at"].is_string());
        assert!(body.get("error").is_none());

        // Terminal records never change.
        let (_, again) = send(&app.router, result(&job_id)).await;
        assert_eq!(again, body);
    }

    #[tokio::test]
    async fn test_failed_generation_is_reported_on_poll() {
        let app = app_with(
            memory_store(),
            StubGenerator::failing(502, "upstream connect error"),
            8,
        );

        let (_, body) = send(&app.router, submit(json!({ "name": "Asha" }))).await;
        let job_id = body["job_id"].as_str().unwrap().to_string();

        let (status, body) = poll_until_terminal(&app.router, &job_id).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "API error (status 502): upstream connect error");
        assert!(body["completed_at"].is_string());
        assert!(body.get("result").is_none());
    }

    #[tokio::test]
    async fn test_unknown_job_is_404() {
        let app = app_with(memory_store(), StubGenerator::succeeding("r"), 8);

        let (status, body) = send(&app.router, result("unknown-id")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            json!({ "status": "not_found", "error": "Job ID not found or expired" })
        );
    }

    #[tokio::test]
    async fn test_empty_submission_is_accepted() {
        let app = app_with(memory_store(), StubGenerator::succeeding("r"), 8);

        let (status, body) = send(&app.router, submit(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "processing");
    }

    #[tokio::test]
    async fn test_health_reports_connected_store() {
        let app = app_with(memory_store(), StubGenerator::succeeding("r"), 8);

        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["redis"], "connected");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_health_stays_200_when_store_is_down() {
        let app = app_with(unreachable_store(), StubGenerator::succeeding("r"), 8);

        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["redis"], "error: Connection refused (os error 111)");
    }

    #[tokio::test]
    async fn test_submit_with_store_down_is_500() {
        let app = app_with(unreachable_store(), StubGenerator::succeeding("r"), 8);

        let (status, body) = send(&app.router, submit(json!({ "name": "Asha" }))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "STORE_ERROR");
        assert_eq!(app.generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_saturated_queue_is_503() {
        let app = app_with(memory_store(), StubGenerator::hanging(), 1);

        let (status, _) = send(&app.router, submit(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        app.generator.wait_for_calls(1).await;
        let (status, _) = send(&app.router, submit(json!({}))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app.router, submit(json!({}))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
    }
}
