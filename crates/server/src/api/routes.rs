use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::middleware::{auth_middleware, metrics_middleware, session_middleware};
use super::{commands, handlers};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Commands need a storage session
    let command_routes = Router::new()
        .route("/messages", post(commands::post_message))
        .route("/clean", post(commands::clean))
        .route("/refresh", post(commands::refresh))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            session_middleware,
        ));

    // Authenticated, no storage access
    let protected_routes = Router::new()
        .route("/config", get(handlers::get_config))
        .route("/maintenance", get(handlers::maintenance_status))
        .merge(command_routes)
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth_middleware,
        ));

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .route_layer(middleware::from_fn(metrics_middleware))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
