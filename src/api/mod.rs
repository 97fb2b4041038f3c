pub mod handlers;
pub mod models;
pub mod openapi;

use axum::{Router, routing::get};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use handlers::AppService;

/// Full application router: health check, `/api` routes and Swagger UI.
/// Transport layers (CORS, timeouts, tracing) are added by the binary.
pub fn app(service: AppService) -> Router {
    Router::new()
        // add / route with a simple health check
        .route("/", get(|| async { "OK" }))
        .nest("/api", handlers::api_routes(service))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}
