//! Helpers over [`serde_json::Value`] for rule evaluation.
//!
//! Field values are dynamically typed (text inputs, numbers, multi-selects),
//! so the engine works on `serde_json::Value` and coerces per rule: required
//! checks truthiness, length rules need a length, range rules need a number,
//! regexp rules a string.

use serde_json::Value;

/// Truthiness as the required rule sees it: non-empty string or array,
/// non-zero number, `true`, non-null.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

/// Inverse of [`is_truthy`]; used for the response-code convention where a
/// falsy code means success.
pub fn is_falsy(value: &Value) -> bool {
    !is_truthy(value)
}

/// The value's length, if it has one: character count for strings, element
/// count for arrays. Values without a length are never length-valid.
pub fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

/// Numeric reading of the value: numbers directly, numeric strings parsed.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// String coercion used for regexp matching, cache keys and URL building.
///
/// Strings pass through unquoted; null becomes the empty string; containers
/// serialize to their JSON text.
pub fn coerce_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Cache key for async validation results, derived from the value so stale
/// resolutions land in their own slot.
pub fn cache_key(value: &Value) -> String {
    coerce_string(value)
}

/// Render a float for message substitution, without a trailing `.0` for
/// whole numbers.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!([])));
        assert!(is_truthy(&json!("a")));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!([1])));
    }

    #[test]
    fn test_length_of() {
        assert_eq!(length_of(&json!("abc")), Some(3));
        assert_eq!(length_of(&json!("привет")), Some(6));
        assert_eq!(length_of(&json!([1, 2])), Some(2));
        assert_eq!(length_of(&json!(42)), None);
        assert_eq!(length_of(&Value::Null), None);
    }

    #[test]
    fn test_as_number() {
        assert_eq!(as_number(&json!(7)), Some(7.0));
        assert_eq!(as_number(&json!("7.5")), Some(7.5));
        assert_eq!(as_number(&json!(" 12 ")), Some(12.0));
        assert_eq!(as_number(&json!("abc")), None);
        assert_eq!(as_number(&json!(true)), None);
    }

    #[test]
    fn test_coerce_string() {
        assert_eq!(coerce_string(&json!("text")), "text");
        assert_eq!(coerce_string(&json!(3)), "3");
        assert_eq!(coerce_string(&Value::Null), "");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(5.5), "5.5");
    }
}
