//! Integration test: HTTP upload contract

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use tabclass::config::StorageConfig;
use tabclass::server::{create_router, AppState};

const BOUNDARY: &str = "tabclass-test-boundary";

fn test_app(base: &std::path::Path) -> axum::Router {
    let storage = StorageConfig::rooted(base);
    storage.ensure_dirs().unwrap();
    create_router(Arc::new(AppState::new(storage)))
}

fn multipart_body(csv: &str, target_column: &str) -> String {
    format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"target_column\"\r\n\r\n\
         {target}\r\n\
         --{b}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"data.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {csv}\r\n\
         --{b}--\r\n",
        b = BOUNDARY,
        target = target_column,
        csv = csv
    )
}

fn upload_request(csv: &str, target_column: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(csv, target_column)))
        .unwrap()
}

fn sample_csv() -> String {
    let mut csv = String::from("amount,segment,churn\n");
    for i in 0..50 {
        let jitter = (i % 10) as f64 * 0.07;
        csv.push_str(&format!("{:.2},retail,no\n", 1.0 + jitter));
        csv.push_str(&format!("{:.2},enterprise,yes\n", 6.0 + jitter));
    }
    csv
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_upload_happy_path() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .oneshot(upload_request(&sample_csv(), "churn"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert!(json["job_id"].is_string());
    let result = &json["result"];
    assert_eq!(result["problem_type"], "classification");
    assert_eq!(result["accuracy"].as_f64().unwrap(), {
        let max = result["candidates"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["holdout_accuracy"].as_f64().unwrap())
            .fold(f64::NEG_INFINITY, f64::max);
        max
    });

    let best_model = result["best_model"].as_str().unwrap();
    assert!(["LogisticRegression", "RandomForest", "SVC"].contains(&best_model));

    // All three candidates were evaluated
    assert_eq!(result["candidates"].as_array().unwrap().len(), 3);

    // Artifacts were persisted, keyed by job id
    let job_id = json["job_id"].as_str().unwrap();
    let model_path = result["artifacts"]["model"].as_str().unwrap();
    assert!(model_path.contains(job_id));
    assert!(std::path::Path::new(model_path).exists());
    let predictions_path = result["artifacts"]["predictions"].as_str().unwrap();
    assert!(std::path::Path::new(predictions_path).exists());
}

#[tokio::test]
async fn test_upload_missing_target_column_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .oneshot(upload_request(&sample_csv(), "nonexistent"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Target column not found in dataset.");
}

#[tokio::test]
async fn test_upload_without_target_field_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let body = format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"data.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         a,b\r\n1,2\r\n\
         --{b}--\r\n",
        b = BOUNDARY
    );
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_upload_is_413() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .header("content-length", (100 * 1024 * 1024).to_string())
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("size limit"));
}

#[tokio::test]
async fn test_unsupported_target_is_500() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    // 15 distinct string classes
    let mut csv = String::from("f,target\n");
    for i in 0..30 {
        csv.push_str(&format!("{},class_{}\n", i, i % 15));
    }

    let response = app.oneshot(upload_request(&csv, "target")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("Unsupported problem type"));
}
