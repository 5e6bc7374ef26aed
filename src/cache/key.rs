//! Cache key normalization.
//!
//! A key is the operation name plus a canonical rendering of its arguments:
//! object fields are sorted and `null` fields are dropped, so argument
//! structs that differ only in field order or in absent-vs-null filters
//! land on the same entry.

// Author: kelexine (https://github.com/kelexine)

use crate::error::Result;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    operation: String,
    signature: String,
}

impl CacheKey {
    /// Builds a key from an operation name and any serializable arguments.
    pub fn new<A: Serialize + ?Sized>(operation: &str, args: &A) -> Result<Self> {
        let value = serde_json::to_value(args)?;
        Ok(Self::from_value(operation, &value))
    }

    /// Key for an operation that takes no arguments.
    pub fn operation(operation: &str) -> Self {
        Self::from_value(operation, &Value::Null)
    }

    pub fn from_value(operation: &str, args: &Value) -> Self {
        let mut signature = String::new();
        write_canonical(args, &mut signature);
        Self {
            operation: operation.to_string(),
            signature,
        }
    }

    pub fn operation_name(&self) -> &str {
        &self.operation
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.operation, self.signature)
    }
}

// Does not rely on serde_json's map ordering, which changes with the
// `preserve_order` feature.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut fields: Vec<(&String, &Value)> =
                map.iter().filter(|(_, v)| !v.is_null()).collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (name, field)) in fields.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(name.clone()).to_string());
                out.push(':');
                write_canonical(field, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_order_does_not_matter() {
        let a = CacheKey::from_value("movies", &json!({ "page": 1, "perPage": 12 }));
        let b = CacheKey::from_value("movies", &json!({ "perPage": 12, "page": 1 }));
        assert_eq!(a, b);
    }

    #[test]
    fn test_null_fields_equal_absent_fields() {
        let a = CacheKey::from_value("movies", &json!({ "where": { "search": "x", "genre": null } }));
        let b = CacheKey::from_value("movies", &json!({ "where": { "search": "x" } }));
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_arguments_distinct_keys() {
        let a = CacheKey::from_value("movies", &json!({ "where": { "search": "alien" } }));
        let b = CacheKey::from_value("movies", &json!({ "where": { "search": "aliens" } }));
        let c = CacheKey::from_value("genres", &json!({ "where": { "search": "alien" } }));
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_string_escaping_keeps_keys_apart() {
        let a = CacheKey::from_value("movies", &json!({ "search": "a\",\"b" }));
        let b = CacheKey::from_value("movies", &json!({ "search": "a", "b": null }));
        assert_ne!(a, b);
    }

    #[test]
    fn test_display() {
        let key = CacheKey::from_value("movies", &json!({ "b": 2, "a": [1, true] }));
        assert_eq!(key.to_string(), r#"movies({"a":[1,true],"b":2})"#);
        assert_eq!(CacheKey::operation("genres").to_string(), "genres(null)");
    }
}
