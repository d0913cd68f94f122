use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::docs;
use crate::handlers::{self, AppState};

/// 1MB is plenty for customer and credit payloads.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// API routes without rate limiting; `main` wraps them with the governor layer.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/docs", get(docs::serve_swagger_ui))
        .route("/api-docs/openapi.json", get(docs::serve_openapi_spec))
        .route(
            "/api/credits",
            post(handlers::save_credit).get(handlers::find_all_credits_by_customer),
        )
        .route("/api/credits/:credit_code", get(handlers::find_credit_by_code))
        .route(
            "/api/customers",
            post(handlers::save_customer).patch(handlers::update_customer),
        )
        .route(
            "/api/customers/:id",
            get(handlers::find_customer_by_id).delete(handlers::delete_customer),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}

/// Full application with health check, tracing and CORS.
pub fn app(state: Arc<AppState>, api: Router<Arc<AppState>>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
