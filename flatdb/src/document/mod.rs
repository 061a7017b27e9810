// Document helpers - the generic JSON tree records are loaded into

use crate::error::{FlatDbError, Result};
use serde_json::Value;
use std::path::Path;

/// Resolve `key` against a record. Dotted keys walk nested objects,
/// so `contact.email` reads `record["contact"]["email"]`.
pub fn lookup<'a>(record: &'a Value, key: &str) -> Option<&'a Value> {
    let object = record.as_object()?;
    if let Some(value) = object.get(key) {
        return Some(value);
    }

    let mut parts = key.split('.');
    let mut current = object.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Split a loaded document into its records.
/// An absent document (`Null`) has no records.
pub fn into_records(document: Value, path: &Path) -> Result<Vec<Value>> {
    match document {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items),
        _ => Err(FlatDbError::InvalidDocument {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_flat_key() {
        let record = json!({"id": "A", "name": "x"});
        assert_eq!(lookup(&record, "name"), Some(&json!("x")));
        assert_eq!(lookup(&record, "missing"), None);
    }

    #[test]
    fn test_lookup_nested_key() {
        let record = json!({"contact": {"email": "a@b.c", "phone": {"home": "1"}}});
        assert_eq!(lookup(&record, "contact.email"), Some(&json!("a@b.c")));
        assert_eq!(lookup(&record, "contact.phone.home"), Some(&json!("1")));
        assert_eq!(lookup(&record, "contact.fax"), None);
        assert_eq!(lookup(&record, "contact.email.domain"), None);
    }

    #[test]
    fn test_lookup_prefers_literal_dotted_key() {
        let record = json!({"a.b": 1, "a": {"b": 2}});
        assert_eq!(lookup(&record, "a.b"), Some(&json!(1)));
    }

    #[test]
    fn test_lookup_on_non_object() {
        assert_eq!(lookup(&json!([1, 2]), "0"), None);
        assert_eq!(lookup(&Value::Null, "id"), None);
    }

    #[test]
    fn test_into_records() {
        let path = Path::new("customers.json");
        assert!(into_records(Value::Null, path).unwrap().is_empty());
        assert_eq!(into_records(json!([{"id": 1}]), path).unwrap().len(), 1);
        assert!(matches!(
            into_records(json!({"id": 1}), path),
            Err(FlatDbError::InvalidDocument { .. })
        ));
    }
}
