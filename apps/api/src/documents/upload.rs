//! Intake pipeline: validate → extract → categorize → store bytes → insert row.

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::documents::extract::{extract_text, FileKind};
use crate::documents::storage::object_key;
use crate::documents::store::{insert_document, NewDocument};
use crate::errors::AppError;
use crate::models::document::{DocKind, DocumentRow};
use crate::state::AppState;

const UNSUPPORTED_FORMAT: &str = "Unsupported file format. Only PDF and DOCX are supported.";
const NO_TEXT: &str = "Could not extract text from file";

#[derive(Debug, Serialize)]
pub struct UploadResult {
    pub id: Uuid,
    pub filename: String,
    pub category: String,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct UploadFailure {
    pub filename: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct BulkUploadResponse {
    pub uploaded: usize,
    pub failed: usize,
    pub results: Vec<UploadResult>,
    pub errors: Vec<UploadFailure>,
}

impl From<DocumentRow> for UploadResult {
    fn from(row: DocumentRow) -> Self {
        UploadResult {
            id: row.id,
            filename: row.original_name,
            category: row.category,
            status: "success",
        }
    }
}

/// Runs one file through intake and returns the stored row.
pub async fn ingest_file(
    state: &AppState,
    original_name: &str,
    bytes: Bytes,
    kind: DocKind,
) -> Result<DocumentRow, AppError> {
    let file_kind = FileKind::from_filename(original_name)
        .ok_or_else(|| AppError::Validation(UNSUPPORTED_FORMAT.to_string()))?;

    let text = extract_text(bytes.clone(), file_kind).await;
    if text.is_empty() {
        return Err(AppError::Validation(NO_TEXT.to_string()));
    }

    let category = state
        .llm
        .categorize(&text, kind, &state.llm.default_selector())
        .await;

    let id = Uuid::new_v4();
    let key = object_key(kind, category, id, file_kind);
    let filename = format!("{id}{}", file_kind.extension());
    let file_size = bytes.len() as i64;

    state
        .storage
        .put(&key, bytes, file_kind.content_type())
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

    let inserted = insert_document(
        &state.db,
        NewDocument {
            id,
            filename: &filename,
            original_name,
            kind,
            category: category.as_str(),
            storage_key: &key,
            file_size,
            text_content: &text,
        },
    )
    .await;

    match inserted {
        Ok(row) => Ok(row),
        Err(e) => {
            // Don't leave an orphaned object behind a failed insert.
            if let Err(cleanup) = state.storage.delete(&key).await {
                warn!("Failed to remove orphaned object {key}: {cleanup}");
            }
            Err(AppError::Database(e))
        }
    }
}

/// POST /upload/cv
///
/// Accepts one or more `files` parts. Each file succeeds or fails on its own.
pub async fn handle_upload_cvs(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<BulkUploadResponse>, AppError> {
    let mut results = Vec::new();
    let mut errors = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("files") {
            continue;
        }
        let filename = field.file_name().unwrap_or("unnamed").to_string();
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                errors.push(UploadFailure {
                    filename,
                    error: format!("Failed to read upload: {e}"),
                });
                continue;
            }
        };

        match ingest_file(&state, &filename, bytes, DocKind::Cv).await {
            Ok(row) => results.push(UploadResult::from(row)),
            Err(e) => {
                warn!("CV upload '{filename}' failed: {e}");
                errors.push(UploadFailure {
                    filename,
                    error: e.client_message(),
                });
            }
        }
    }

    if results.is_empty() && errors.is_empty() {
        return Err(AppError::Validation(
            "No files provided in 'files' field".to_string(),
        ));
    }

    info!(
        "CV upload finished: {} stored, {} failed",
        results.len(),
        errors.len()
    );

    Ok(Json(BulkUploadResponse {
        uploaded: results.len(),
        failed: errors.len(),
        results,
        errors,
    }))
}

/// POST /upload/jd
///
/// Accepts a single `file` part; any failure fails the request.
pub async fn handle_upload_jd(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResult>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("unnamed").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;

        let row = ingest_file(&state, &filename, bytes, DocKind::Jd).await?;
        return Ok(Json(UploadResult::from(row)));
    }

    Err(AppError::Validation(
        "No file provided in 'file' field".to_string(),
    ))
}
