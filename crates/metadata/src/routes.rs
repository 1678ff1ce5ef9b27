//! Routes: HTTP surface of the metadata lookup service.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::error::MetadataResult;
use crate::state::AppState;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metadata/JSON", get(list_handler))
        .route("/metadata/JSON/{name}", get(get_handler).put(put_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "started_at": state.started_at.to_rfc3339(),
    }))
}

/// GET /metadata/JSON: names of all stored documents
async fn list_handler(State(state): State<AppState>) -> MetadataResult<Json<Value>> {
    let names = state.store.list().await?;
    Ok(Json(json!({
        "total": names.len(),
        "names": names,
    })))
}

/// GET /metadata/JSON/{name}
async fn get_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> MetadataResult<Json<Value>> {
    Ok(Json(state.store.get(&name).await?))
}

/// PUT /metadata/JSON/{name}: store (or replace) a document
async fn put_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(document): Json<Value>,
) -> MetadataResult<StatusCode> {
    state.store.put(&name, &document).await?;
    tracing::info!("Stored metadata document: {}", name);
    Ok(StatusCode::NO_CONTENT)
}
