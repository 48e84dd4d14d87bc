//! API layer -- axum routes, handlers, and middleware.

mod routes;
pub mod state;

use self::state::AppState;
use axum::http::{StatusCode, Uri};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

/// Build the application router with all routes.
pub fn router(state: AppState) -> Router {
    routes::cycle_routes()
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn fallback(uri: Uri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "not found", "path": uri.path() })),
    )
}
