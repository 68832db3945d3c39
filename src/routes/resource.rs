//! Resource routes. Paths are parameterized so one router serves every registered resource;
//! handlers resolve the resource by its path segment.

use crate::handlers::resource::{create, list, read, update};
use crate::state::AppState;
use axum::{routing::get, Router};
use tower_http::limit::RequestBodyLimitLayer;

/// Largest accepted create/update body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

pub fn resource_routes(state: AppState) -> Router {
    Router::new()
        .route("/:path_segment", get(list).post(create))
        .route("/:path_segment/:id", get(read).patch(update).put(update))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}
