//! API integration tests for the chemviz server
//!
//! Drive the full router (auth middleware, feature routes, error mapping)
//! against an in-memory database and a temporary media directory.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::http::StatusCode;
use serde_json::json;

mod common;
use common::{json, TestApp, PASSWORD, USERNAME};

const PUMPS_CSV: &str = "Type,Flowrate\nA,10\nB,20\nA,30\n";

// ============================================================================
// Health and authentication
// ============================================================================

#[tokio::test]
async fn test_health_needs_no_token() {
    let app = TestApp::start().await;
    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["status"], "healthy");
}

#[tokio::test]
async fn test_dataset_routes_require_token() {
    let app = TestApp::start().await;

    for uri in ["/api/datasets/", "/api/latest_summary/", "/api/download/1/"] {
        let (status, body) = app.get(uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert!(json(&body)["error"].is_string());
    }

    let (status, _) = app.get("/api/datasets/", Some("not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_upload_requires_token_before_reading_body() {
    let app = TestApp::start().await;
    let (status, _) = app.upload("bogus", "file", "pumps.csv", PUMPS_CSV).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_obtain_and_refresh_token() {
    let app = TestApp::start().await;

    let (status, body) = app
        .post_json("/api/token/", json!({"username": USERNAME, "password": "wrong"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json(&body)["error"].is_string());

    let (status, body) = app
        .post_json("/api/token/", json!({"username": USERNAME, "password": PASSWORD}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let pair = json(&body);
    let access = pair["access"].as_str().unwrap().to_string();
    let refresh = pair["refresh"].as_str().unwrap().to_string();

    let (status, _) = app.get("/api/datasets/", Some(&access)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post_json("/api/token/refresh/", json!({"refresh": refresh}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let new_access = json(&body)["access"].as_str().unwrap().to_string();
    assert_ne!(new_access, access);

    let (status, _) = app.get("/api/datasets/", Some(&new_access)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_with_access_token_is_rejected() {
    let app = TestApp::start().await;
    let access = app.access_token().await;

    let (status, _) = app
        .post_json("/api/token/refresh/", json!({"refresh": access}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.post_json("/api/token/refresh/", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Upload
// ============================================================================

#[tokio::test]
async fn test_upload_returns_summary() {
    let app = TestApp::start().await;
    let token = app.access_token().await;

    let (status, body) = app.upload(&token, "file", "pumps.csv", PUMPS_CSV).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let body = json(&body);
    assert_eq!(body["message"], "Uploaded successfully");
    let summary = &body["summary"];
    assert_eq!(summary["total_rows"], 3);
    assert_eq!(summary["columns"], json!(["Type", "Flowrate"]));
    assert_eq!(summary["type_distribution"], json!({"A": 2, "B": 1}));
    assert_eq!(summary["averages"], json!({"flowrate_avg": 20.0}));
    assert_eq!(summary["preview"][0], json!({"Type": "A", "Flowrate": 10}));

    assert!(app.media.path().join("datasets").join("pumps.csv").exists());
}

#[tokio::test]
async fn test_upload_skips_malformed_row() {
    let app = TestApp::start().await;
    let token = app.access_token().await;
    let csv = format!("{}A,not_a_number,extra_field\n", PUMPS_CSV);

    let (status, body) = app.upload(&token, "file", "pumps.csv", &csv).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let summary = &json(&body)["summary"];
    assert_eq!(summary["total_rows"], 3);
    assert_eq!(summary["type_distribution"], json!({"A": 2, "B": 1}));
    assert_eq!(summary["averages"]["flowrate_avg"], 20.0);
}

#[tokio::test]
async fn test_upload_without_type_column() {
    let app = TestApp::start().await;
    let token = app.access_token().await;

    let (status, body) = app
        .upload(&token, "file", "valves.csv", "Equipment,Pressure\nV1,4\nV2,6\n")
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let summary = &json(&body)["summary"];
    assert_eq!(summary["type_distribution"], json!({}));
    assert_eq!(summary["averages"], json!({"pressure_avg": 5.0}));
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let app = TestApp::start().await;
    let token = app.access_token().await;

    let (status, body) = app.upload(&token, "document", "pumps.csv", PUMPS_CSV).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "No file uploaded");

    let (_, body) = app.get("/api/datasets/", Some(&token)).await;
    assert_eq!(json(&body), json!([]));
}

#[tokio::test]
async fn test_upload_of_empty_file_is_parse_error() {
    let app = TestApp::start().await;
    let token = app.access_token().await;

    let (status, body) = app.upload(&token, "file", "empty.csv", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = json(&body);
    assert_eq!(body["code"], "PARSE_ERROR");
    assert!(body["error"].as_str().unwrap().contains("No columns to parse"));

    let (_, body) = app.get("/api/datasets/", Some(&token)).await;
    assert_eq!(json(&body), json!([]));
}

// ============================================================================
// History, download, latest summary
// ============================================================================

#[tokio::test]
async fn test_list_is_most_recent_first_with_limit() {
    let app = TestApp::start().await;
    let token = app.access_token().await;

    for name in ["first.csv", "second.csv", "third.csv"] {
        let (status, _) = app.upload(&token, "file", name, PUMPS_CSV).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = app.get("/api/datasets/", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let items = json(&body);
    let names: Vec<_> = items
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["file_name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["third.csv", "second.csv", "first.csv"]);
    assert_eq!(items[0]["summary"]["total_rows"], 3);
    assert!(items[0].get("raw_csv").is_none());
    assert!(items[0]["uploaded_at"].is_string());

    let (_, body) = app.get("/api/datasets/?limit=2", Some(&token)).await;
    assert_eq!(json(&body).as_array().unwrap().len(), 2);

    let (status, _) = app.get("/api/datasets/?limit=-3", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_download_returns_raw_text() {
    let app = TestApp::start().await;
    let token = app.access_token().await;
    app.upload(&token, "file", "pumps.csv", PUMPS_CSV).await;

    let (_, body) = app.get("/api/datasets/", Some(&token)).await;
    let id = json(&body)[0]["id"].as_i64().unwrap();

    let (status, body) = app.get(&format!("/api/download/{}/", id), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, PUMPS_CSV);
}

#[tokio::test]
async fn test_download_unknown_id_is_not_found() {
    let app = TestApp::start().await;
    let token = app.access_token().await;

    let (status, body) = app.get("/api/download/4242/", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"], "Dataset not found");
}

#[tokio::test]
async fn test_latest_summary_without_datasets() {
    let app = TestApp::start().await;
    let token = app.access_token().await;

    let (status, body) = app.get("/api/latest_summary/", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"], "No datasets found");
}

#[tokio::test]
async fn test_latest_summary_reflects_newest_upload() {
    let app = TestApp::start().await;
    let token = app.access_token().await;
    app.upload(&token, "file", "old.csv", "Type,Pressure\nX,1\n").await;
    app.upload(&token, "file", "pumps.csv", PUMPS_CSV).await;

    let (status, body) = app.get("/api/latest_summary/", Some(&token)).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let latest = &json(&body)["latest_summary"];
    assert_eq!(latest["file_name"], "pumps.csv");
    assert_eq!(latest["total_rows"], 3);
    assert_eq!(latest["type_distribution"], json!({"A": 2, "B": 1}));
}

#[tokio::test]
async fn test_latest_summary_reads_file_on_disk() {
    let app = TestApp::start().await;
    let token = app.access_token().await;
    app.upload(&token, "file", "pumps.csv", PUMPS_CSV).await;

    let path = app.media.path().join("datasets").join("pumps.csv");
    std::fs::write(&path, "Type,Flowrate\nZ,1\n").unwrap();

    let (_, body) = app.get("/api/latest_summary/", Some(&token)).await;
    let latest = &json(&body)["latest_summary"];
    assert_eq!(latest["total_rows"], 1);
    assert_eq!(latest["type_distribution"], json!({"Z": 1}));

    std::fs::remove_file(&path).unwrap();
    let (status, body) = app.get("/api/latest_summary/", Some(&token)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json(&body)["error"].as_str().unwrap().starts_with("Could not read CSV"));
}
