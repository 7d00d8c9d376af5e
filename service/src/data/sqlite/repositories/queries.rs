//! Query record repository

use sqlx::{SqliteConnection, SqlitePool};

use crate::data::sqlite::SqliteError;
use crate::data::types::{PlanStep, QueryRow};

/// Find the query record matching the exact statement text.
///
/// When duplicates exist (pre-compaction), the lowest id wins so results
/// stay stable across passes.
pub async fn find_by_text(
    conn: &mut SqliteConnection,
    text: &str,
) -> Result<Option<QueryRow>, SqliteError> {
    let row = sqlx::query_as::<_, (i64, String, String, i64, i64, i64)>(
        "SELECT id, query_text, tables_summary, occurrence_count, created_at, updated_at \
         FROM sql_queries WHERE query_text = ? ORDER BY id ASC LIMIT 1",
    )
    .bind(text)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(
        |(id, query_text, tables_summary, occurrence_count, created_at, updated_at)| QueryRow {
            id,
            query_text,
            tables_summary,
            occurrence_count,
            created_at,
            updated_at,
        },
    ))
}

/// Insert a new query record and return its id
pub async fn insert(
    conn: &mut SqliteConnection,
    text: &str,
    tables_summary: &str,
    now: i64,
) -> Result<i64, SqliteError> {
    let result = sqlx::query(
        "INSERT INTO sql_queries (query_text, tables_summary, created_at, updated_at) \
         VALUES (?, ?, ?, ?)",
    )
    .bind(text)
    .bind(tables_summary)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Update the tables summary of an existing record
pub async fn update_summary(
    conn: &mut SqliteConnection,
    id: i64,
    tables_summary: &str,
    now: i64,
) -> Result<(), SqliteError> {
    sqlx::query("UPDATE sql_queries SET tables_summary = ?, updated_at = ? WHERE id = ?")
        .bind(tables_summary)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Load the persisted plan steps of a query with their table names,
/// in insertion order
pub async fn load_steps(
    conn: &mut SqliteConnection,
    query_id: i64,
) -> Result<Vec<(PlanStep, String)>, SqliteError> {
    type StepTuple = (
        i64,
        Option<String>,
        i64,
        Option<String>,
        Option<String>,
        Option<String>,
        i64,
        Option<String>,
        Option<String>,
        i64,
        Option<f64>,
        String,
    );

    let rows = sqlx::query_as::<_, StepTuple>(
        "SELECT s.step_id, s.select_type, s.table_ref, s.access_type, s.possible_keys, \
                s.chosen_key, s.key_length, s.ref_clause, s.extra, s.rows_estimate, \
                s.filtered_pct, t.name \
         FROM sql_plan_steps s JOIN sql_tables t ON t.id = s.table_ref \
         WHERE s.query_id = ? ORDER BY s.id ASC",
    )
    .bind(query_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(
                step_id,
                select_type,
                table_ref,
                access_type,
                possible_keys,
                chosen_key,
                key_length,
                ref_clause,
                extra,
                rows_estimate,
                filtered_pct,
                table_name,
            )| {
                (
                    PlanStep {
                        step_id,
                        select_type,
                        table_ref,
                        access_type,
                        possible_keys,
                        chosen_key,
                        key_length,
                        ref_clause,
                        extra,
                        rows_estimate,
                        filtered_pct,
                    },
                    table_name,
                )
            },
        )
        .collect())
}

/// Append one plan step to a query
pub async fn insert_step(
    conn: &mut SqliteConnection,
    query_id: i64,
    step: &PlanStep,
) -> Result<(), SqliteError> {
    sqlx::query(
        "INSERT INTO sql_plan_steps (query_id, step_id, select_type, table_ref, access_type, \
         possible_keys, chosen_key, key_length, ref_clause, extra, rows_estimate, filtered_pct) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(query_id)
    .bind(step.step_id)
    .bind(&step.select_type)
    .bind(step.table_ref)
    .bind(&step.access_type)
    .bind(&step.possible_keys)
    .bind(&step.chosen_key)
    .bind(step.key_length)
    .bind(&step.ref_clause)
    .bind(&step.extra)
    .bind(step.rows_estimate)
    .bind(step.filtered_pct)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

// =============================================================================
// Compaction queries
// =============================================================================

/// Statement texts recorded more than once, most frequent first.
///
/// Ties break on text so a compaction pass is deterministic.
pub async fn duplicate_text_counts(
    pool: &SqlitePool,
    limit: usize,
) -> Result<Vec<(String, i64)>, SqliteError> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT query_text, COUNT(*) AS cnt FROM sql_queries \
         GROUP BY query_text HAVING cnt > 1 \
         ORDER BY cnt DESC, query_text ASC LIMIT ?",
    )
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// All record ids carrying the given text, oldest first
pub async fn ids_for_text(
    conn: &mut SqliteConnection,
    text: &str,
) -> Result<Vec<i64>, SqliteError> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM sql_queries WHERE query_text = ? ORDER BY id ASC",
    )
    .bind(text)
    .fetch_all(&mut *conn)
    .await?;
    Ok(ids)
}

/// Delete every record with the given text except the survivor.
/// Plan steps cascade.
pub async fn delete_duplicates(
    conn: &mut SqliteConnection,
    text: &str,
    survivor_id: i64,
) -> Result<u64, SqliteError> {
    let result = sqlx::query("DELETE FROM sql_queries WHERE query_text = ? AND id != ?")
        .bind(text)
        .bind(survivor_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Set the occurrence count on a surviving record
pub async fn set_occurrence_count(
    conn: &mut SqliteConnection,
    id: i64,
    count: i64,
    now: i64,
) -> Result<(), SqliteError> {
    sqlx::query("UPDATE sql_queries SET occurrence_count = ?, updated_at = ? WHERE id = ?")
        .bind(count)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::repositories::tables;
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

    fn step(table_ref: i64) -> PlanStep {
        PlanStep {
            step_id: 1,
            select_type: Some("SIMPLE".to_string()),
            table_ref,
            access_type: Some("ALL".to_string()),
            possible_keys: None,
            chosen_key: None,
            key_length: 0,
            ref_clause: None,
            extra: None,
            rows_estimate: 10,
            filtered_pct: Some(100.0),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_by_text() {
        let pool = setup_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        assert!(find_by_text(&mut conn, "SELECT 1").await.unwrap().is_none());

        let id = insert(&mut conn, "SELECT 1", "[]", 1000).await.unwrap();
        let row = find_by_text(&mut conn, "SELECT 1").await.unwrap().unwrap();
        assert_eq!(row.id, id);
        assert_eq!(row.occurrence_count, 1);
        assert_eq!(row.tables_summary, "[]");
    }

    #[tokio::test]
    async fn test_find_by_text_prefers_lowest_id() {
        let pool = setup_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let first = insert(&mut conn, "SELECT 1", "[]", 1000).await.unwrap();
        let _second = insert(&mut conn, "SELECT 1", "[]", 2000).await.unwrap();

        let row = find_by_text(&mut conn, "SELECT 1").await.unwrap().unwrap();
        assert_eq!(row.id, first);
    }

    #[tokio::test]
    async fn test_steps_roundtrip_in_order() {
        let pool = setup_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let table_id = tables::find_or_create(&mut conn, "users").await.unwrap();
        let query_id = insert(&mut conn, "SELECT * FROM users", "[\"users\"]", 1000)
            .await
            .unwrap();

        let mut a = step(table_id);
        let mut b = step(table_id);
        b.step_id = 2;
        a.rows_estimate = 1;
        insert_step(&mut conn, query_id, &a).await.unwrap();
        insert_step(&mut conn, query_id, &b).await.unwrap();

        let steps = load_steps(&mut conn, query_id).await.unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].0.step_id, 1);
        assert_eq!(steps[1].0.step_id, 2);
        assert_eq!(steps[0].1, "users");
    }

    #[tokio::test]
    async fn test_delete_duplicates_cascades_steps() {
        let pool = setup_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let table_id = tables::find_or_create(&mut conn, "users").await.unwrap();
        let survivor = insert(&mut conn, "SELECT 1", "[]", 1000).await.unwrap();
        let dup = insert(&mut conn, "SELECT 1", "[]", 2000).await.unwrap();
        insert_step(&mut conn, dup, &step(table_id)).await.unwrap();

        let deleted = delete_duplicates(&mut conn, "SELECT 1", survivor)
            .await
            .unwrap();
        assert_eq!(deleted, 1);

        let steps: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sql_plan_steps")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(steps, 0);
    }

    #[tokio::test]
    async fn test_duplicate_text_counts_deterministic_order() {
        let pool = setup_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        for _ in 0..3 {
            insert(&mut conn, "SELECT b", "[]", 1000).await.unwrap();
        }
        for _ in 0..3 {
            insert(&mut conn, "SELECT a", "[]", 1000).await.unwrap();
        }
        for _ in 0..2 {
            insert(&mut conn, "SELECT c", "[]", 1000).await.unwrap();
        }
        insert(&mut conn, "SELECT unique", "[]", 1000).await.unwrap();
        drop(conn);

        let counts = duplicate_text_counts(&pool, 10).await.unwrap();
        assert_eq!(
            counts,
            vec![
                ("SELECT a".to_string(), 3),
                ("SELECT b".to_string(), 3),
                ("SELECT c".to_string(), 2),
            ]
        );

        // Limit truncates after ordering
        let top = duplicate_text_counts(&pool, 1).await.unwrap();
        assert_eq!(top, vec![("SELECT a".to_string(), 3)]);
    }
}
