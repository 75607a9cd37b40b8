use super::*;
use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;


/// Helper to create a test TaskManager instance wrapped in Arc
fn create_test_manager() -> (Arc<TaskManager>, tempfile::TempDir) {
    let (manager, _storage, temp_dir) = crate::downloader::test_helpers::create_test_manager();
    (Arc::new(manager), temp_dir)
}

/// Router built from the manager's own configuration
fn test_router(manager: &Arc<TaskManager>) -> Router {
    create_router(Arc::clone(manager), manager.get_config())
}

/// Read a response body as JSON
async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_api_server_stops_on_shutdown() {
    let (manager, _temp_dir) = create_test_manager();

    // Port 0 = OS assigns a free port
    let mut config = (*manager.get_config()).clone();
    config.server.bind_address = "127.0.0.1:0".parse().unwrap();
    let config = Arc::new(config);

    let api_handle = tokio::spawn({
        let manager = manager.clone();
        let config = config.clone();
        let shutdown = manager.shutdown_token();
        async move { start_api_server(manager, config, shutdown.cancelled_owned()).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    manager.shutdown().await.unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), api_handle)
        .await
        .expect("API server should stop after shutdown")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_api_server_reports_bind_failure() {
    let (manager, _temp_dir) = create_test_manager();

    // Occupy a port so the server cannot bind it
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = (*manager.get_config()).clone();
    config.server.bind_address = taken.local_addr().unwrap();

    let result = start_api_server(manager, Arc::new(config), std::future::pending()).await;
    assert!(matches!(result, Err(crate::error::Error::Io(_))));
}

#[tokio::test]
async fn test_cors_enabled() {
    let (manager, _temp_dir) = create_test_manager();
    let app = test_router(&manager);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let (manager, _temp_dir) = create_test_manager();

    let mut config = (*manager.get_config()).clone();
    config.server.cors_enabled = false;
    let app = create_router(manager, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_cors_specific_origin() {
    let (manager, _temp_dir) = create_test_manager();

    let mut config = (*manager.get_config()).clone();
    config.server.cors_origins = vec!["http://allowed.example".to_string()];
    let app = create_router(manager, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://allowed.example")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "http://allowed.example"
    );
}

#[tokio::test]
async fn test_swagger_ui_toggle() {
    let (manager, _temp_dir) = create_test_manager();

    let request = || {
        Request::builder()
            .uri("/swagger-ui")
            .body(Body::empty())
            .unwrap()
    };

    let app = test_router(&manager);
    let response = app.oneshot(request()).await.unwrap();
    assert_ne!(response.status(), StatusCode::NOT_FOUND);

    let mut config = (*manager.get_config()).clone();
    config.server.swagger_ui = false;
    let app = create_router(manager, Arc::new(config));
    let response = app.oneshot(request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
