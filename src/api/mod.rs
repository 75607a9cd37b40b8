//! REST API server module
//!
//! Provides an OpenAPI 3.1 compliant REST API for submitting download tasks
//! and following their progress.

use crate::{Config, Result, TaskManager};
use axum::{
    Router,
    http::HeaderValue,
    routing::get,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Tasks
/// - `GET /tasks` - List all tasks
/// - `POST /tasks` - Create a task from a URL list
/// - `GET /tasks/:id` - Get single task
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
/// - `GET /events` - Server-sent events stream
pub fn create_router(manager: Arc<TaskManager>, config: Arc<Config>) -> Router {
    let state = AppState::new(manager, config.clone());

    let router = Router::new()
        // Tasks
        .route("/tasks", get(routes::list_tasks).post(routes::create_task))
        .route("/tasks/:id", get(routes::get_task))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .route("/events", get(routes::event_stream));

    // Merge Swagger UI routes if enabled in config (before applying state)
    let router = if config.server.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router
        .with_state(state)
        // Handler panics become 500 responses instead of dropped connections
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http());

    // Apply CORS middleware if enabled in config
    if config.server.cors_enabled {
        let cors = build_cors_layer(&config.server.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` (or an empty list) allows any origin; otherwise only the listed
/// origins are allowed. All methods and headers are allowed.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Serves until `shutdown` resolves, then stops accepting connections and
/// returns once in-flight requests have finished.
///
/// # Example
///
/// ```no_run
/// use batch_dl::{TaskManager, Config};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let manager = Arc::new(TaskManager::new((*config).clone())?);
/// let shutdown = manager.shutdown_token();
///
/// // Serves until shutdown begins
/// batch_dl::api::start_api_server(manager, config, shutdown.cancelled_owned()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(
    manager: Arc<TaskManager>,
    config: Arc<Config>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let bind_address = config.server.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(manager, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %listener.local_addr().unwrap_or(bind_address),
        "API server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
