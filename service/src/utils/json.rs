//! JSON coercion helpers for untyped EXPLAIN rows
//!
//! The engine returns plan fields with loose typing: numbers may arrive as
//! strings, text fields may be null or absent. These helpers pin down the
//! coercion rules in one place.

use serde_json::Value;

/// Coerce a field to i64; non-numeric, unparseable, or absent values become 0
pub fn coerce_i64(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n.as_i64().unwrap_or_else(|| n.as_f64().map(|f| f as i64).unwrap_or(0)),
        Some(Value::String(s)) => s.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    }
}

/// Coerce an optional float field; absent or null stays None
pub fn coerce_f64(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Extract a nullable text field; null and absent both map to None
pub fn opt_text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_i64() {
        assert_eq!(coerce_i64(Some(&json!(42))), 42);
        assert_eq!(coerce_i64(Some(&json!("42"))), 42);
        assert_eq!(coerce_i64(Some(&json!(" 7 "))), 7);
        assert_eq!(coerce_i64(Some(&json!("not a number"))), 0);
        assert_eq!(coerce_i64(Some(&json!(null))), 0);
        assert_eq!(coerce_i64(None), 0);
        assert_eq!(coerce_i64(Some(&json!(3.9))), 3);
    }

    #[test]
    fn test_coerce_f64() {
        assert_eq!(coerce_f64(Some(&json!(99.5))), Some(99.5));
        assert_eq!(coerce_f64(Some(&json!("99.5"))), Some(99.5));
        assert_eq!(coerce_f64(Some(&json!(100))), Some(100.0));
        assert_eq!(coerce_f64(Some(&json!("abc"))), None);
        assert_eq!(coerce_f64(Some(&json!(null))), None);
        assert_eq!(coerce_f64(None), None);
    }

    #[test]
    fn test_opt_text() {
        assert_eq!(opt_text(Some(&json!("const"))), Some("const".to_string()));
        assert_eq!(opt_text(Some(&json!(null))), None);
        assert_eq!(opt_text(None), None);
        // Unexpected non-string values keep their JSON rendering
        assert_eq!(opt_text(Some(&json!(5))), Some("5".to_string()));
    }
}
