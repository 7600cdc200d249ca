use std::collections::HashSet;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use jobscraper_core::models::{Job, RunStatus};
use jobscraper_core::traits::JobStore;
use tower::ServiceExt;

use crate::integration::common::{TEST_API_KEY, raw_jobs, setup_test_app, urls};

fn authed(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {TEST_API_KEY}"))
        .body(Body::empty())
        .unwrap()
}

async fn json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_returns_200() {
    let app = setup_test_app(Vec::new()).await;

    let response = app
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn unauthenticated_request_returns_401() {
    let app = setup_test_app(Vec::new()).await;

    let response = app
        .router
        .oneshot(Request::get("/v1/jobs").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn triggered_run_persists_new_jobs() {
    let app = setup_test_app(raw_jobs(&["https://a", "https://b", "https://broken"])).await;
    app.store
        .save_job(&Job::raw("https://a", "old"))
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(authed("POST", "/v1/scrapers/fixed/run?pages=9"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(json(response).await["pages"], 3);

    app.runner.wait_idle().await;

    let result = app.runner.registry().get("fixed").unwrap();
    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.total_jobs, 3);
    assert_eq!(result.processed_jobs, 1);
    assert_eq!(result.skipped_jobs, 1);
    assert_eq!(result.failed_jobs, 1);

    let stored = app.store.list_jobs(10).await.unwrap();
    assert_eq!(
        urls(&stored),
        HashSet::from(["https://a".to_string(), "https://b".to_string()])
    );

    let response = app
        .router
        .clone()
        .oneshot(authed("GET", "/v1/scrapers/status"))
        .await
        .unwrap();
    assert_eq!(
        json(response).await,
        serde_json::json!([{"name": "fixed", "status": "Completed", "jobs": 1}])
    );

    let response = app
        .router
        .oneshot(authed("GET", "/v1/jobs?limit=1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["jobs"].as_array().unwrap().len(), 1);
    assert_eq!(body["jobs"][0]["url"], "https://b");
    assert_eq!(body["jobs"][0]["title"], "Title for desc https://b");
}

#[tokio::test]
async fn metrics_reflect_storage_calls() {
    let app = setup_test_app(raw_jobs(&["https://x"])).await;

    app.runner.run("fixed", None).await.unwrap();

    let response = app
        .router
        .oneshot(authed("GET", "/v1/metrics"))
        .await
        .unwrap();
    let body = json(response).await;
    let operations: Vec<&str> = body["operations"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|op| op["component"] == "storage")
        .filter_map(|op| op["operation"].as_str())
        .collect();
    assert!(operations.contains(&"get_existing_urls"));
    assert!(operations.contains(&"save_job"));
}

#[tokio::test]
async fn unknown_scraper_returns_404() {
    let app = setup_test_app(Vec::new()).await;

    let response = app
        .router
        .oneshot(authed("POST", "/v1/scrapers/missing/run"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
