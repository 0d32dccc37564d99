//! HTTP surface: route trees composed into the application router.

use axum::Router;

use crate::state::SharedState;

/// OpenAPI document routes.
pub mod docs;
/// Health check routes.
pub mod health;
/// Action publish routes.
pub mod play;
/// Long-poll subscribe routes.
pub mod poll;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router().merge(play::router()).merge(poll::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
