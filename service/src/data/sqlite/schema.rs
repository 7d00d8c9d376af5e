//! SQLite schema definitions
//!
//! Initial schema with all tables. No migrations needed for first version.

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Complete schema SQL
pub const SCHEMA: &str = r#"
-- =============================================================================
-- Infrastructure: Schema version tracking
-- =============================================================================
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL,
    applied_at INTEGER NOT NULL,
    description TEXT
);

CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at INTEGER NOT NULL,
    checksum TEXT NOT NULL,
    execution_time_ms INTEGER,
    success INTEGER NOT NULL DEFAULT 1
);

-- =============================================================================
-- 1. Tables referenced by recorded plans (must be before plan steps due to FK)
-- =============================================================================
-- Append-only. The UNIQUE constraint on name is the single authority for
-- find-or-create under concurrent resolution.
CREATE TABLE IF NOT EXISTS sql_tables (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    created_at INTEGER NOT NULL
);

-- =============================================================================
-- 2. Recorded queries
-- =============================================================================
-- occurrence_count is mutated only by the compactor; ordinary processing
-- inserts rows with the default of 1.
CREATE TABLE IF NOT EXISTS sql_queries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    query_text TEXT NOT NULL,
    tables_summary TEXT NOT NULL DEFAULT '[]',
    occurrence_count INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sql_queries_text ON sql_queries(query_text);

-- =============================================================================
-- 3. Plan steps (references queries + tables)
-- =============================================================================
CREATE TABLE IF NOT EXISTS sql_plan_steps (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    query_id INTEGER NOT NULL REFERENCES sql_queries(id) ON DELETE CASCADE,
    step_id INTEGER NOT NULL DEFAULT 0,
    select_type TEXT,
    table_ref INTEGER NOT NULL REFERENCES sql_tables(id),
    access_type TEXT,
    possible_keys TEXT,
    chosen_key TEXT,
    key_length INTEGER NOT NULL DEFAULT 0,
    ref_clause TEXT,
    extra TEXT,
    rows_estimate INTEGER NOT NULL DEFAULT 0,
    filtered_pct REAL
);

CREATE INDEX IF NOT EXISTS idx_sql_plan_steps_query ON sql_plan_steps(query_id);
CREATE INDEX IF NOT EXISTS idx_sql_plan_steps_table ON sql_plan_steps(table_ref);
"#;
