use crate::error::{FlatDbError, Result};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Predicate behind an operator: `(record value, clause value) -> matched`.
pub type Predicate = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// Registry mapping operator tags (`=`, `>`, `contains`, ...) to predicates.
#[derive(Clone)]
pub struct Operators {
    predicates: HashMap<String, Predicate>,
}

impl Operators {
    /// Registry with no operators at all
    pub fn empty() -> Self {
        Operators {
            predicates: HashMap::new(),
        }
    }

    /// Add or replace an operator
    pub fn register<F>(&mut self, tag: &str, predicate: F)
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.predicates.insert(tag.to_string(), Arc::new(predicate));
    }

    pub fn get(&self, tag: &str) -> Result<&Predicate> {
        self.predicates
            .get(tag)
            .ok_or_else(|| FlatDbError::UnknownOperator(tag.to_string()))
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.predicates.contains_key(tag)
    }

    /// Registered tags, sorted
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.predicates.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl Default for Operators {
    fn default() -> Self {
        let mut ops = Operators::empty();
        ops.register("=", equal);
        ops.register("==", equal);
        ops.register("!=", |a, b| !equal(a, b));
        ops.register("<>", |a, b| !equal(a, b));
        ops.register(">", |a, b| compare(a, b) == Some(Ordering::Greater));
        ops.register(">=", |a, b| {
            matches!(compare(a, b), Some(Ordering::Greater | Ordering::Equal))
        });
        ops.register("<", |a, b| compare(a, b) == Some(Ordering::Less));
        ops.register("<=", |a, b| {
            matches!(compare(a, b), Some(Ordering::Less | Ordering::Equal))
        });
        ops.register("contains", contains);
        ops.register("in", |a, b| contains(b, a));
        ops.register("startswith", |a, b| match (a, b) {
            (Value::String(s), Value::String(prefix)) => s.starts_with(prefix.as_str()),
            _ => false,
        });
        ops.register("endswith", |a, b| match (a, b) {
            (Value::String(s), Value::String(suffix)) => s.ends_with(suffix.as_str()),
            _ => false,
        });
        ops
    }
}

impl fmt::Debug for Operators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operators")
            .field("tags", &self.tags())
            .finish()
    }
}

/// JSON equality, except that numbers compare by value (`1 == 1.0`).
pub fn equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare(a, b) == Some(Ordering::Equal),
        _ => a == b,
    }
}

/// Order two scalars of the same kind. Mixed kinds are unordered.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return Some(x.cmp(&y));
            }
            if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                return Some(x.cmp(&y));
            }
            x.as_f64()?.partial_cmp(&y.as_f64()?)
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Substring test for strings, membership test for arrays.
fn contains(haystack: &Value, needle: &Value) -> bool {
    match (haystack, needle) {
        (Value::String(s), Value::String(sub)) => s.contains(sub.as_str()),
        (Value::Array(items), _) => items.iter().any(|item| equal(item, needle)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(tag: &str, a: Value, b: Value) -> bool {
        let ops = Operators::default();
        let predicate = ops.get(tag).unwrap();
        predicate(&a, &b)
    }

    #[test]
    fn test_equality() {
        assert!(check("=", json!("B"), json!("B")));
        assert!(check("=", json!(1), json!(1.0)));
        assert!(!check("=", json!("1"), json!(1)));
        assert!(check("!=", json!("A"), json!("B")));
        assert!(check("<>", json!(2), json!(3)));
    }

    #[test]
    fn test_ordering() {
        assert!(check(">", json!(10), json!(2)));
        assert!(check(">=", json!(2.5), json!(2.5)));
        assert!(check("<", json!(-1), json!(0)));
        assert!(check("<=", json!("apple"), json!("banana")));
        assert!(check(">", json!(u64::MAX), json!(1)));
    }

    #[test]
    fn test_ordering_mixed_kinds_never_match() {
        assert!(!check(">", json!("10"), json!(2)));
        assert!(!check("<", json!(null), json!(2)));
        assert!(!check("<=", json!([1]), json!([1])));
    }

    #[test]
    fn test_contains_and_in() {
        assert!(check("contains", json!("sarouje"), json!("rou")));
        assert!(check("contains", json!(["a", "b"]), json!("b")));
        assert!(!check("contains", json!(12), json!(1)));
        assert!(check("in", json!("b"), json!(["a", "b"])));
        assert!(!check("in", json!("c"), json!(["a", "b"])));
    }

    #[test]
    fn test_prefix_suffix() {
        assert!(check("startswith", json!("CUST1"), json!("CUST")));
        assert!(check("endswith", json!("CUST1"), json!("1")));
        assert!(!check("startswith", json!(1), json!("1")));
    }

    #[test]
    fn test_unknown_operator() {
        let ops = Operators::default();
        assert!(matches!(
            ops.get("~="),
            Err(FlatDbError::UnknownOperator(tag)) if tag == "~="
        ));
    }

    #[test]
    fn test_register_custom_operator() {
        let mut ops = Operators::empty();
        assert!(!ops.contains("len"));
        ops.register("len", |a, b| match (a, b.as_u64()) {
            (Value::String(s), Some(n)) => s.len() as u64 == n,
            _ => false,
        });
        assert_eq!(ops.tags(), vec!["len"]);
        assert!(ops.get("len").unwrap()(&json!("abc"), &json!(3)));
    }
}
