pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::documents::{handlers as documents, upload};
use crate::matching::handlers as matching;
use crate::state::AppState;

/// Upper bound on a request body; bulk CV uploads are the largest.
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        // Intake
        .route("/upload/cv", post(upload::handle_upload_cvs))
        .route("/upload/jd", post(upload::handle_upload_jd))
        // Documents
        .route("/api/documents", get(documents::handle_list_documents))
        .route(
            "/api/documents/categories",
            get(documents::handle_list_categories),
        )
        .route(
            "/api/documents/:id",
            get(documents::handle_get_document).delete(documents::handle_delete_document),
        )
        .route(
            "/api/documents/:id/view",
            get(documents::handle_view_document),
        )
        // Matching
        .route("/api/match", post(matching::handle_match))
        .route("/api/match/history", get(matching::handle_match_history))
        .route("/api/match/:id", get(matching::handle_get_match))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
