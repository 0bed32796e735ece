//! Helpers over JSON-like value trees.

use serde_json::Value;

/// Deep equality used for dirty tracking.
///
/// Integer 42 equals float 42.0; object key order is irrelevant;
/// arrays compare element-wise by position and length.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(fa), Some(fb)) => fa == fb,
            _ => a == b,
        },
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(a, b)| deep_equal(a, b))
        }
        (Value::Object(a), Value::Object(b)) => {
            if a.len() != b.len() {
                return false;
            }
            a.iter()
                .all(|(k, v)| b.get(k).is_some_and(|bv| deep_equal(v, bv)))
        }
        _ => false,
    }
}

/// Deep equality over optional values, where `None` is a missing path.
pub fn option_deep_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => deep_equal(a, b),
        _ => false,
    }
}

/// Whether a touched subtree reports touched.
///
/// A boolean leaf is itself; an array or object is touched when any of its
/// children is. Anything else (including `null` slots) is untouched.
pub fn is_touched(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Array(items) => items.iter().any(is_touched),
        Value::Object(map) => map.values().any(is_touched),
        _ => false,
    }
}

/// Whether a validator result means "no error".
///
/// `null`, `false`, the empty string, and empty arrays or objects all count as
/// no error. An array whose every slot is empty is empty too.
pub fn is_empty_error(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.iter().all(is_empty_error),
        Value::Object(map) => map.is_empty(),
        Value::Number(_) => false,
    }
}
