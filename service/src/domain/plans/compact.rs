//! Duplicate record compaction
//!
//! `sql_queries.query_text` carries no unique constraint, so concurrent
//! chunk workers racing find-or-create can each insert a record for the
//! same text. Compaction folds each duplicated text into its oldest record
//! and stamps the observed occurrence count on it. Each candidate commits in its own
//! transaction, so an interrupted pass leaves every touched text fully
//! merged and the rest untouched. Re-running is a no-op.

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::sqlite::repositories::queries;

/// Outcome of one compaction pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CompactReport {
    /// Duplicated texts examined
    pub candidates: usize,
    /// Texts folded into a survivor
    pub merged: usize,
    /// Duplicate records deleted
    pub deleted_records: usize,
}

/// Run one compaction pass over at most `candidate_limit` duplicated texts
pub async fn compact(
    pool: &SqlitePool,
    candidate_limit: usize,
) -> Result<CompactReport, SqliteError> {
    let candidates = queries::duplicate_text_counts(pool, candidate_limit).await?;
    let mut report = CompactReport {
        candidates: candidates.len(),
        ..Default::default()
    };

    for (text, count) in candidates {
        let mut tx = pool.begin().await?;

        let ids = queries::ids_for_text(&mut *tx, &text).await?;
        let Some(&survivor) = ids.first() else {
            // Deleted concurrently since the candidate scan
            continue;
        };

        let deleted = queries::delete_duplicates(&mut *tx, &text, survivor).await?;
        let now = chrono::Utc::now().timestamp();
        queries::set_occurrence_count(&mut *tx, survivor, ids.len() as i64, now).await?;

        tx.commit().await?;

        report.merged += 1;
        report.deleted_records += deleted as usize;
        tracing::debug!(count, deleted, survivor, "Compacted duplicate query text");
    }

    tracing::info!(
        candidates = report.candidates,
        merged = report.merged,
        deleted = report.deleted_records,
        "Compaction pass complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::schema::SCHEMA;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(SCHEMA).execute(&pool).await.unwrap();
        pool
    }

    async fn insert_text(pool: &SqlitePool, text: &str) -> i64 {
        let mut conn = pool.acquire().await.unwrap();
        queries::insert(&mut conn, text, "[]", 1000).await.unwrap()
    }

    #[tokio::test]
    async fn test_compact_merges_duplicates() {
        let pool = setup_pool().await;

        let first = insert_text(&pool, "SELECT 1").await;
        insert_text(&pool, "SELECT 1").await;
        insert_text(&pool, "SELECT 1").await;
        insert_text(&pool, "SELECT 2").await;

        let report = compact(&pool, 10_000).await.unwrap();
        assert_eq!(
            report,
            CompactReport {
                candidates: 1,
                merged: 1,
                deleted_records: 2,
            }
        );

        // Survivor is the oldest record and carries the observed count
        let mut conn = pool.acquire().await.unwrap();
        let row = queries::find_by_text(&mut conn, "SELECT 1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.id, first);
        assert_eq!(row.occurrence_count, 3);
        drop(conn);

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sql_queries")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn test_compact_is_idempotent() {
        let pool = setup_pool().await;
        insert_text(&pool, "SELECT 1").await;
        insert_text(&pool, "SELECT 1").await;

        compact(&pool, 10_000).await.unwrap();
        let second = compact(&pool, 10_000).await.unwrap();
        assert_eq!(second, CompactReport::default());

        let mut conn = pool.acquire().await.unwrap();
        let row = queries::find_by_text(&mut conn, "SELECT 1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.occurrence_count, 2);
    }

    #[tokio::test]
    async fn test_compact_respects_candidate_limit() {
        let pool = setup_pool().await;
        // "SELECT a" has more duplicates than "SELECT b", so it is the
        // one candidate examined under limit 1
        for _ in 0..3 {
            insert_text(&pool, "SELECT a").await;
        }
        for _ in 0..2 {
            insert_text(&pool, "SELECT b").await;
        }

        let report = compact(&pool, 1).await.unwrap();
        assert_eq!(report.candidates, 1);
        assert_eq!(report.merged, 1);
        assert_eq!(report.deleted_records, 2);

        let mut conn = pool.acquire().await.unwrap();
        let b = queries::ids_for_text(&mut conn, "SELECT b").await.unwrap();
        assert_eq!(b.len(), 2);
    }

    #[tokio::test]
    async fn test_compact_ignores_singletons() {
        let pool = setup_pool().await;
        insert_text(&pool, "SELECT only").await;

        let report = compact(&pool, 10_000).await.unwrap();
        assert_eq!(report, CompactReport::default());

        let mut conn = pool.acquire().await.unwrap();
        let row = queries::find_by_text(&mut conn, "SELECT only")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.occurrence_count, 1);
    }
}
