//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the batch-dl REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the batch-dl REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "batch-dl REST API",
        version = "0.1.0",
        description = "Submit batches of URLs as download tasks and follow their progress",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        // Tasks
        crate::api::routes::list_tasks,
        crate::api::routes::get_task,
        crate::api::routes::create_task,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::TaskId,
        crate::types::Status,
        crate::types::Task,
        crate::types::Event,

        // API request types
        crate::api::routes::CreateTaskRequest,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "tasks", description = "Download tasks - Submit URL batches and query their status"),
        (name = "system", description = "System endpoints - Health checks, OpenAPI spec, events"),
    )
)]
pub struct ApiDoc;
