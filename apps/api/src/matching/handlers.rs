use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::documents::store::{get_document, get_document_of_kind, list_cvs};
use crate::errors::AppError;
use crate::matching::history::{get_match, recent_matches, record_batch};
use crate::matching::models::{Candidate, MatchOutcome, UNKNOWN_CANDIDATE};
use crate::models::document::{DocKind, DocumentRow, MatchHistoryRow};
use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: i64 = 10;
const MAX_HISTORY_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub jd_id: Uuid,
    /// Omitted or empty means every stored CV.
    pub cv_ids: Option<Vec<Uuid>>,
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MatchResultView {
    pub cv_id: Uuid,
    pub cv_name: String,
    pub score: u8,
    pub match_level: &'static str,
    pub key_matches: Vec<String>,
    pub gaps: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub jd_id: Uuid,
    pub jd_name: String,
    pub total_cvs_matched: usize,
    pub results: Vec<MatchResultView>,
}

#[derive(Debug, Serialize)]
pub struct MatchHistoryResponse {
    pub matches: Vec<MatchHistoryRow>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MatchDetailResponse {
    pub id: Uuid,
    pub cv_name: String,
    pub jd_name: String,
    pub score: i32,
    pub match_date: DateTime<Utc>,
    pub details: Value,
}

fn result_view(cv_id: Uuid, outcome: &MatchOutcome) -> MatchResultView {
    MatchResultView {
        cv_id,
        cv_name: outcome.candidate_name.clone(),
        score: outcome.score,
        match_level: outcome.match_level.as_str(),
        key_matches: outcome.key_matches.clone(),
        gaps: outcome.gaps.clone(),
        summary: outcome.summary.clone(),
    }
}

/// An empty id list selects every CV, same as no list at all.
fn requested_cv_ids(cv_ids: Option<&[Uuid]>) -> Option<&[Uuid]> {
    cv_ids.filter(|ids| !ids.is_empty())
}

fn document_name(document: Option<DocumentRow>) -> String {
    document
        .map(|d| d.original_name)
        .unwrap_or_else(|| UNKNOWN_CANDIDATE.to_string())
}

fn history_limit(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT)
}

/// POST /api/match
///
/// Scores the selected CVs against one JD, stores every outcome and returns
/// them ranked by score.
pub async fn handle_match(
    State(state): State<AppState>,
    Json(req): Json<MatchRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    let jd = get_document_of_kind(&state.db, req.jd_id, DocKind::Jd)
        .await?
        .ok_or_else(|| AppError::NotFound("Job Description not found".to_string()))?;

    let cvs = list_cvs(&state.db, requested_cv_ids(req.cv_ids.as_deref())).await?;
    if cvs.is_empty() {
        return Err(AppError::NotFound("No CVs found".to_string()));
    }

    let selector = state.matcher.llm().selector(req.model.as_deref());
    info!(
        "Matching {} CVs against JD '{}' with {selector}",
        cvs.len(),
        jd.original_name
    );

    let candidates: Vec<Candidate> = cvs
        .into_iter()
        .map(|cv| Candidate {
            id: cv.id,
            name: cv.original_name,
            text: cv.text_content,
        })
        .collect();

    let outcomes = state
        .matcher
        .batch_match(&candidates, &jd.text_content, &selector)
        .await;
    let saved = record_batch(&state.db, jd.id, &outcomes).await?;

    let results: Vec<MatchResultView> = saved
        .into_iter()
        .map(|(cv_id, outcome)| result_view(cv_id, outcome))
        .collect();

    Ok(Json(MatchResponse {
        jd_id: jd.id,
        jd_name: jd.original_name,
        total_cvs_matched: results.len(),
        results,
    }))
}

/// GET /api/match/history
pub async fn handle_match_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<MatchHistoryResponse>, AppError> {
    let matches = recent_matches(&state.db, history_limit(query.limit)).await?;
    Ok(Json(MatchHistoryResponse { matches }))
}

/// GET /api/match/:id
pub async fn handle_get_match(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchDetailResponse>, AppError> {
    let record = get_match(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Match result not found".to_string()))?;

    let cv = get_document(&state.db, record.cv_id).await?;
    let jd = get_document(&state.db, record.jd_id).await?;

    Ok(Json(MatchDetailResponse {
        id: record.id,
        cv_name: document_name(cv),
        jd_name: document_name(jd),
        score: record.score,
        match_date: record.match_date,
        details: record.details,
    }))
}
