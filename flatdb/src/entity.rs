use crate::error::Result;
use serde::Serialize;
use serde_json::Value;

/// Key under which every entity stores its identifier.
pub const IDENTIFIER_KEY: &str = "id";

/// Type tag of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity {
    /// Singular name, used in messages
    pub name: &'static str,
    /// Plural name, used to name the backing file
    pub category: &'static str,
}

impl Identity {
    pub const fn new(name: &'static str, category: &'static str) -> Self {
        Identity { name, category }
    }
}

/// A record type that can be persisted by a [`Driver`](crate::Driver).
///
/// The serialized form must carry the identifier under [`IDENTIFIER_KEY`],
/// since updates and deletes locate records by that key alone.
///
/// ```
/// use flatdb::{Identifiable, Identity};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Customer {
///     id: String,
///     name: String,
/// }
///
/// impl Identifiable for Customer {
///     fn identity() -> Identity {
///         Identity::new("customer", "customers")
///     }
///
///     fn identifier(&self) -> String {
///         self.id.clone()
///     }
/// }
/// ```
pub trait Identifiable: Serialize {
    fn identity() -> Identity
    where
        Self: Sized;

    fn identifier(&self) -> String;
}

/// Identifier of a stored record, formatted as a string.
///
/// Strings are returned verbatim; other values use their JSON text, so a
/// stored `42` matches an entity whose identifier is `"42"`.
pub fn identifier_of(record: &Value) -> Option<String> {
    match record.as_object()?.get(IDENTIFIER_KEY)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Identifier an entity is stored under, formatted the same way as
/// [`identifier_of`] formats stored records. Falls back to
/// [`Identifiable::identifier`] when the serialized form has no key.
pub fn stored_identifier<T: Identifiable>(entity: &T) -> Result<String> {
    let record = serde_json::to_value(entity)?;
    Ok(identifier_of(&record).unwrap_or_else(|| entity.identifier()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identifier_of_string() {
        assert_eq!(identifier_of(&json!({"id": "CUST1"})), Some("CUST1".into()));
    }

    #[test]
    fn test_identifier_of_number() {
        assert_eq!(identifier_of(&json!({"id": 42})), Some("42".into()));
    }

    #[derive(Serialize)]
    struct Reading {
        id: f64,
    }

    impl Identifiable for Reading {
        fn identity() -> Identity {
            Identity::new("reading", "readings")
        }

        fn identifier(&self) -> String {
            self.id.to_string()
        }
    }

    #[derive(Serialize)]
    struct Keyless {
        code: String,
    }

    impl Identifiable for Keyless {
        fn identity() -> Identity {
            Identity::new("keyless", "keyless")
        }

        fn identifier(&self) -> String {
            self.code.clone()
        }
    }

    #[test]
    fn test_stored_identifier_matches_stored_form() {
        let reading = Reading { id: 7.0 };
        assert_eq!(reading.identifier(), "7");
        assert_eq!(stored_identifier(&reading).unwrap(), "7.0");
        assert_eq!(identifier_of(&json!({"id": 7.0})), Some("7.0".into()));
    }

    #[test]
    fn test_stored_identifier_falls_back_without_key() {
        let entity = Keyless { code: "K1".into() };
        assert_eq!(stored_identifier(&entity).unwrap(), "K1");
    }

    #[test]
    fn test_identifier_missing() {
        assert_eq!(identifier_of(&json!({"name": "x"})), None);
        assert_eq!(identifier_of(&json!({"id": null})), None);
        assert_eq!(identifier_of(&json!(["id"])), None);
    }
}
