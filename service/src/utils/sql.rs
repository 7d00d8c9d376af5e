//! SQL statement classification helpers
//!
//! Classification is prefix-based over the raw statement text, matching how
//! the statements arrive from the recorder (untrimmed, arbitrary case).

/// Case-insensitive ASCII prefix check that never slices mid-codepoint
fn starts_with_ci(s: &str, prefix: &str) -> bool {
    let s = s.as_bytes();
    let prefix = prefix.as_bytes();
    s.len() >= prefix.len()
        && s.iter()
            .zip(prefix.iter())
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
}

/// Transaction-control statements carry no plan information and are
/// dropped before processing
pub fn is_transaction_control(sql: &str) -> bool {
    let sql = sql.trim_start();
    starts_with_ci(sql, "start") || starts_with_ci(sql, "commit") || starts_with_ci(sql, "rollback")
}

/// Statements the engine can EXPLAIN
pub fn is_explainable(sql: &str) -> bool {
    let sql = sql.trim_start();
    starts_with_ci(sql, "select") || starts_with_ci(sql, "update") || starts_with_ci(sql, "delete")
}

/// INSERTs never produce a plan, so their skip is not worth a notice
pub fn is_insert(sql: &str) -> bool {
    starts_with_ci(sql.trim_start(), "insert")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_control() {
        assert!(is_transaction_control("START TRANSACTION"));
        assert!(is_transaction_control("  start transaction"));
        assert!(is_transaction_control("COMMIT"));
        assert!(is_transaction_control("rollback to savepoint s1"));
        // Only start/commit/rollback are filtered; BEGIN falls through and
        // is dropped later as planless
        assert!(!is_transaction_control("BEGIN"));
        assert!(!is_transaction_control("SELECT 1"));
        assert!(!is_transaction_control("INSERT INTO t VALUES (1)"));
    }

    #[test]
    fn test_explainable() {
        assert!(is_explainable("SELECT * FROM users"));
        assert!(is_explainable("  select 1"));
        assert!(is_explainable("UPDATE users SET name = 'x'"));
        assert!(is_explainable("DELETE FROM users"));
        assert!(!is_explainable("INSERT INTO users VALUES (1)"));
        assert!(!is_explainable("SET autocommit = 0"));
    }

    #[test]
    fn test_insert() {
        assert!(is_insert("INSERT INTO t VALUES (1)"));
        assert!(is_insert("insert ignore into t values (1)"));
        assert!(!is_insert("SELECT 1"));
    }

    #[test]
    fn test_prefix_check_handles_multibyte() {
        // Must not panic on non-ASCII statement text
        assert!(!is_explainable("sélect 1"));
        assert!(is_explainable("select 'é'"));
    }

    #[test]
    fn test_short_statements() {
        assert!(!is_explainable(""));
        assert!(!is_explainable("s"));
        assert!(is_transaction_control("commit"));
    }
}
