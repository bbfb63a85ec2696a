//! HTTP router for the function bridge

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{any, get},
    Router,
};
use fauxfn_bridge::{handlers, FunctionService};
use tower_http::trace::TraceLayer;

/// Build the application router: a health endpoint plus the invocation
/// bridge mounted under `prefix` for every HTTP method.
pub fn create_router(service: Arc<FunctionService>, prefix: &str) -> Router {
    let route = format!("{}{{*function}}", normalize_prefix(prefix));

    Router::new()
        .route("/health", get(health_check))
        .route(&route, any(handlers::handle_invocation))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Prefix with exactly one leading and trailing slash.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, r#"{"status": "running"}"#)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("/.netlify/functions/"), "/.netlify/functions/");
        assert_eq!(normalize_prefix(".netlify/functions"), "/.netlify/functions/");
        assert_eq!(normalize_prefix("/api"), "/api/");
        assert_eq!(normalize_prefix("/"), "/");
    }
}
