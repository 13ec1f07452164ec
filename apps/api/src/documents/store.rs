use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::document::{CategoryCountRow, DocKind, DocumentRow};

type Result<T> = std::result::Result<T, sqlx::Error>;

/// Values for a new `documents` row.
pub struct NewDocument<'a> {
    pub id: Uuid,
    pub filename: &'a str,
    pub original_name: &'a str,
    pub kind: DocKind,
    pub category: &'a str,
    pub storage_key: &'a str,
    pub file_size: i64,
    pub text_content: &'a str,
}

pub async fn insert_document(pool: &PgPool, doc: NewDocument<'_>) -> Result<DocumentRow> {
    let row = sqlx::query_as::<_, DocumentRow>(
        r#"
        INSERT INTO documents
            (id, filename, original_name, file_type, category, storage_key, file_size, text_content)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(doc.id)
    .bind(doc.filename)
    .bind(doc.original_name)
    .bind(doc.kind.as_str())
    .bind(doc.category)
    .bind(doc.storage_key)
    .bind(doc.file_size)
    .bind(doc.text_content)
    .fetch_one(pool)
    .await?;

    info!(
        "Stored {} '{}' as {} ({})",
        doc.kind, doc.original_name, row.id, row.category
    );
    Ok(row)
}

/// Newest first, optionally filtered by type and category.
pub async fn list_documents(
    pool: &PgPool,
    file_type: Option<&str>,
    category: Option<&str>,
) -> Result<Vec<DocumentRow>> {
    Ok(sqlx::query_as::<_, DocumentRow>(
        r#"
        SELECT * FROM documents
        WHERE ($1::text IS NULL OR file_type = $1)
          AND ($2::text IS NULL OR category = $2)
        ORDER BY upload_date DESC
        "#,
    )
    .bind(file_type)
    .bind(category)
    .fetch_all(pool)
    .await?)
}

pub async fn get_document(pool: &PgPool, id: Uuid) -> Result<Option<DocumentRow>> {
    Ok(
        sqlx::query_as::<_, DocumentRow>("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn get_document_of_kind(
    pool: &PgPool,
    id: Uuid,
    kind: DocKind,
) -> Result<Option<DocumentRow>> {
    Ok(sqlx::query_as::<_, DocumentRow>(
        "SELECT * FROM documents WHERE id = $1 AND file_type = $2",
    )
    .bind(id)
    .bind(kind.as_str())
    .fetch_optional(pool)
    .await?)
}

/// CVs in upload order; `None` means every CV.
pub async fn list_cvs(pool: &PgPool, ids: Option<&[Uuid]>) -> Result<Vec<DocumentRow>> {
    Ok(sqlx::query_as::<_, DocumentRow>(
        r#"
        SELECT * FROM documents
        WHERE file_type = 'cv'
          AND ($1::uuid[] IS NULL OR id = ANY($1))
        ORDER BY upload_date ASC, id ASC
        "#,
    )
    .bind(ids)
    .fetch_all(pool)
    .await?)
}

/// Returns `true` if a row was deleted.
pub async fn delete_document(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM documents WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn category_counts(pool: &PgPool) -> Result<Vec<CategoryCountRow>> {
    Ok(sqlx::query_as::<_, CategoryCountRow>(
        r#"
        SELECT category,
               COUNT(*) FILTER (WHERE file_type = 'cv') AS cv_count,
               COUNT(*) FILTER (WHERE file_type = 'jd') AS jd_count
        FROM documents
        GROUP BY category
        ORDER BY category
        "#,
    )
    .fetch_all(pool)
    .await?)
}
