use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{emails, health, notify, status, sync};
use crate::state::AppState;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Monitoring
        .route("/status", get(status::get_status))
        .route("/emails", get(emails::list_emails))
        // Control
        .route("/check-now", post(sync::check_now))
        .route("/set-interval", post(sync::set_interval))
        .route("/test", post(notify::send_test))
}

pub fn create_app(state: AppState, cors_allowed_origins: Option<&str>) -> Router {
    api_routes()
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(cors_allowed_origins))
        .with_state(state)
}

/// Build CORS layer from the configured origin list.
///
/// Falls back to permissive CORS when no usable origin is configured.
fn build_cors_layer(allowed_origins: Option<&str>) -> CorsLayer {
    let origins: Vec<_> = allowed_origins
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, using permissive CORS");
        return CorsLayer::permissive();
    }

    tracing::info!("CORS configured for origins: {:?}", origins);
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
