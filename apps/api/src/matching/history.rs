use anyhow::Result;
use sqlx::{PgExecutor, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::matching::models::MatchOutcome;
use crate::models::document::{MatchHistoryRow, MatchResultRow};

/// Appends one match record. The full outcome is kept in `details`.
pub async fn record_match<'e>(
    executor: impl PgExecutor<'e>,
    cv_id: Uuid,
    jd_id: Uuid,
    outcome: &MatchOutcome,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let details = serde_json::to_value(outcome)?;

    sqlx::query(
        r#"
        INSERT INTO match_results (id, cv_id, jd_id, score, explanation, details)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(cv_id)
    .bind(jd_id)
    .bind(i32::from(outcome.score))
    .bind(&outcome.summary)
    .bind(details)
    .execute(executor)
    .await?;

    Ok(id)
}

/// Persists a ranked batch in one transaction. Outcomes without a candidate
/// id are skipped. Returns the outcomes that were stored, in order.
pub async fn record_batch<'a>(
    pool: &PgPool,
    jd_id: Uuid,
    outcomes: &'a [MatchOutcome],
) -> Result<Vec<(Uuid, &'a MatchOutcome)>> {
    let mut tx = pool.begin().await?;
    let mut saved = Vec::with_capacity(outcomes.len());

    for outcome in outcomes {
        let Some(cv_id) = outcome.candidate_id else {
            continue;
        };
        record_match(&mut *tx, cv_id, jd_id, outcome).await?;
        saved.push((cv_id, outcome));
    }

    tx.commit().await?;
    info!("Stored {} match results for JD {jd_id}", saved.len());
    Ok(saved)
}

/// Most recent matches first, joined with both document names.
pub async fn recent_matches(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<MatchHistoryRow>, sqlx::Error> {
    sqlx::query_as::<_, MatchHistoryRow>(
        r#"
        SELECT m.id, cv.original_name AS cv_name, jd.original_name AS jd_name,
               m.score, m.match_date
        FROM match_results m
        JOIN documents cv ON cv.id = m.cv_id
        JOIN documents jd ON jd.id = m.jd_id
        ORDER BY m.match_date DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn get_match(pool: &PgPool, id: Uuid) -> Result<Option<MatchResultRow>, sqlx::Error> {
    sqlx::query_as::<_, MatchResultRow>("SELECT * FROM match_results WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}
