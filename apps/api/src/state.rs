use std::sync::Arc;

use sqlx::PgPool;

use crate::documents::storage::ObjectStore;
use crate::llm_client::LlmService;
use crate::matching::batch::BatchMatcher;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub storage: ObjectStore,
    /// Categorization during intake.
    pub llm: Arc<LlmService>,
    /// Batch matching; shares the same `LlmService`.
    pub matcher: Arc<BatchMatcher>,
}
