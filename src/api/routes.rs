use axum::handler::Handler;
use axum::routing::{get, MethodRouter};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::api::handlers;
use crate::api::state::AppState;

/// Diagnostics live on fixed routes; every other path is a webhook callback.
///
/// Only GET reaches a diagnostic handler. HEAD requests and any other method on those
/// paths are still treated as callbacks.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", diagnostic(handlers::health_check))
        .route("/health/live", diagnostic(handlers::liveness))
        .route("/webhooks", diagnostic(handlers::webhooks::list_webhooks))
        .method_not_allowed_fallback(handlers::callbacks::handle_callback)
        .fallback(handlers::callbacks::handle_callback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn diagnostic<H, T>(handler: H) -> MethodRouter<AppState>
where
    H: Handler<T, AppState>,
    T: 'static,
{
    get(handler).head(handlers::callbacks::handle_callback)
}
