//! API surface tests over an in-memory state.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use reel_api::{create_router, ApiConfig, AppState};
use reel_stages::StageConfig;
use reel_store::Store;
use reel_youtube::{OAuthConfig, YouTubeClient};

async fn test_router() -> (Router, Store) {
    let store = Store::connect("sqlite::memory:").await.unwrap();
    let youtube = YouTubeClient::new(OAuthConfig {
        client_id: "client".into(),
        client_secret: "secret".into(),
        redirect_uri: "http://localhost:8000/api/youtube/callback".into(),
        auth_base: "https://accounts.google.com".into(),
        token_base: "https://oauth2.googleapis.com".into(),
        api_base: "https://www.googleapis.com".into(),
        upload_base: "https://www.googleapis.com".into(),
    });
    let state = AppState::new(
        ApiConfig::default(),
        store.clone(),
        StageConfig::default(),
        youtube,
    );
    (create_router(state, None), store)
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_endpoint_responds() {
    let (router, _) = test_router().await;
    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn create_project_validates_input() {
    let (router, _) = test_router().await;

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/projects",
            serde_json::json!({"title": "", "script_prompt": "something"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/projects",
            serde_json::json!({"title": "My Short", "script_prompt": ""}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_and_poll_project() {
    let (router, _) = test_router().await;

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/projects",
            serde_json::json!({
                "title": "My Short",
                "script_prompt": "a video about rust",
                "category": "tech"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let created = json_body(response).await;
    assert_eq!(created["title"], "My Short");
    let id = created["id"].as_str().unwrap().to_string();

    // Polling is side-effect free and returns the full record
    let response = router
        .clone()
        .oneshot(
            Request::get(format!("/api/projects/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let detail = json_body(response).await;
    assert_eq!(detail["id"], id.as_str());
    assert!(detail["assets"].is_array());

    // Unknown projects are 404
    let response = router
        .oneshot(
            Request::get("/api/projects/does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn job_creation_rejects_bad_cron() {
    let (router, store) = test_router().await;

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/jobs",
            serde_json::json!({
                "name": "daily",
                "cron_expression": "not a cron",
                "topic_category": "tech"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing was persisted
    assert!(store.jobs().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn job_lifecycle() {
    let (router, _) = test_router().await;

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/jobs",
            serde_json::json!({
                "name": "daily shorts",
                "cron_expression": "0 2 * * *",
                "topic_category": "tech",
                "auto_upload": true
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = json_body(response).await;
    assert_eq!(created["enabled"], true);
    assert!(created["next_run_at"].is_string());
    let id = created["id"].as_str().unwrap().to_string();

    let response = router
        .clone()
        .oneshot(
            Request::post(format!("/api/jobs/{id}/disable"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let disabled = json_body(response).await;
    assert_eq!(disabled["enabled"], false);

    let response = router
        .clone()
        .oneshot(
            Request::post(format!("/api/jobs/{id}/enable"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let enabled = json_body(response).await;
    assert_eq!(enabled["enabled"], true);

    let response = router
        .clone()
        .oneshot(
            Request::delete(format!("/api/jobs/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(Request::get("/api/jobs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let listing = json_body(response).await;
    assert_eq!(listing["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn youtube_connection_endpoints() {
    let (router, _) = test_router().await;

    let response = router
        .clone()
        .oneshot(
            Request::get("/api/youtube/connection")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = json_body(response).await;
    assert_eq!(status["connected"], false);

    let response = router
        .clone()
        .oneshot(
            Request::get("/api/youtube/auth-url")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["auth_url"]
        .as_str()
        .unwrap()
        .contains("response_type=code"));

    // Disconnecting with nothing stored is a 404
    let response = router
        .oneshot(
            Request::delete("/api/youtube/connection")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
