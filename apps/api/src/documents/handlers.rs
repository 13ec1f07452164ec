use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::documents::extract::FileKind;
use crate::documents::store;
use crate::errors::AppError;
use crate::models::document::{DocKind, DocumentDetail, DocumentView};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DocumentFilter {
    pub file_type: Option<DocKind>,
    pub category: Option<String>,
}

#[derive(Serialize)]
pub struct DocumentListResponse {
    pub total: usize,
    pub documents: Vec<DocumentView>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CategorySummary {
    pub name: String,
    pub cv_count: i64,
    pub jd_count: i64,
    pub total: i64,
}

/// GET /api/documents
pub async fn handle_list_documents(
    State(state): State<AppState>,
    Query(filter): Query<DocumentFilter>,
) -> Result<Json<DocumentListResponse>, AppError> {
    let documents = store::list_documents(
        &state.db,
        filter.file_type.map(|k| k.as_str()),
        filter.category.as_deref().filter(|c| !c.is_empty()),
    )
    .await?;

    Ok(Json(DocumentListResponse {
        total: documents.len(),
        documents: documents.into_iter().map(DocumentView::from).collect(),
    }))
}

/// GET /api/documents/categories
pub async fn handle_list_categories(
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let categories: Vec<CategorySummary> = store::category_counts(&state.db)
        .await?
        .into_iter()
        .map(|row| CategorySummary {
            total: row.cv_count + row.jd_count,
            name: row.category,
            cv_count: row.cv_count,
            jd_count: row.jd_count,
        })
        .collect();

    Ok(Json(json!({ "categories": categories })))
}

/// GET /api/documents/:id
pub async fn handle_get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentDetail>, AppError> {
    let document = store::get_document(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;
    Ok(Json(DocumentDetail::from(document)))
}

/// GET /api/documents/:id/view
///
/// Streams the stored bytes back for inline display.
pub async fn handle_view_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let document = store::get_document(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

    let bytes = state
        .storage
        .get(&document.storage_key)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

    let content_type = FileKind::from_filename(&document.original_name)
        .map(|k| k.content_type())
        .unwrap_or("application/octet-stream");
    let disposition = format!(
        "inline; filename=\"{}\"",
        inline_filename(&document.original_name)
    );

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

/// DELETE /api/documents/:id
///
/// Removes the stored object first, then the row. Match results go with the
/// row through the foreign key cascade.
pub async fn handle_delete_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let document = store::get_document(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

    if let Err(e) = state.storage.delete(&document.storage_key).await {
        warn!("Could not delete object {}: {e}", document.storage_key);
    }

    if !store::delete_document(&state.db, id).await? {
        return Err(AppError::NotFound("Document not found".to_string()));
    }

    info!("Deleted document {id} ({})", document.original_name);
    Ok(Json(json!({ "message": "Document deleted successfully" })))
}

/// Header-safe filename: printable ASCII only, no quotes or backslashes.
/// Falls back to `document<ext>` when nothing usable is left.
fn inline_filename(original: &str) -> String {
    let cleaned: String = original
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .filter(|c| *c != '"' && *c != '\\')
        .collect();
    let cleaned = cleaned.trim();

    let stem_is_empty = cleaned
        .rsplit_once('.')
        .map(|(stem, _)| stem.trim().is_empty())
        .unwrap_or(cleaned.is_empty());

    if stem_is_empty {
        let ext = FileKind::from_filename(original)
            .map(|k| k.extension())
            .unwrap_or("");
        format!("document{ext}")
    } else {
        cleaned.to_string()
    }
}
