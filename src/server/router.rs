use super::handlers;
use super::AppState;
use axum::routing::{get, patch};
use axum::Router;
use tower_http::trace::TraceLayer;

pub fn init(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/_admin/pages/{id}", patch(handlers::edit_page))
        .route("/{*path}", get(handlers::page_view))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
