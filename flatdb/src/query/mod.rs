// Query engine - clause groups and their evaluation against records

pub mod operator;

pub use operator::{Operators, Predicate};

use crate::document;
use crate::error::Result;
use serde_json::Value;

/// A single `key operator value` predicate
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub key: String,
    pub operator: String,
    pub value: Value,
}

impl Clause {
    pub fn new(key: &str, operator: &str, value: impl Into<Value>) -> Self {
        Clause {
            key: key.to_string(),
            operator: operator.to_string(),
            value: value.into(),
        }
    }

    /// Missing keys never match.
    pub fn matches(&self, record: &Value, operators: &Operators) -> Result<bool> {
        let predicate = operators.get(&self.operator)?;
        Ok(match document::lookup(record, &self.key) {
            Some(actual) => predicate(actual, &self.value),
            None => false,
        })
    }
}

/// Clauses combined with AND
pub type ClauseGroup = Vec<Clause>;

/// The pending filter of a driver: clause groups combined with OR.
///
/// `push` appends to the group under the cursor; `or` moves the cursor
/// past the last group so the next clause opens a new one.
#[derive(Debug, Clone, Default)]
pub struct Query {
    groups: Vec<ClauseGroup>,
    cursor: usize,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, clause: Clause) {
        match self.groups.get_mut(self.cursor) {
            Some(group) => group.push(clause),
            None => {
                self.cursor = self.groups.len();
                self.groups.push(vec![clause]);
            }
        }
    }

    /// Start a new OR'd group. A no-op while the current group is empty.
    pub fn or(&mut self) {
        if self.groups.get(self.cursor).is_some_and(|g| !g.is_empty()) {
            self.cursor = self.groups.len();
        }
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    pub fn clear(&mut self) {
        self.groups.clear();
        self.cursor = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.is_empty())
    }

    pub fn groups(&self) -> &[ClauseGroup] {
        &self.groups
    }
}

/// A record matches when any group matches; a group matches when all of
/// its clauses match.
pub fn evaluate(record: &Value, groups: &[ClauseGroup], operators: &Operators) -> Result<bool> {
    for group in groups.iter().filter(|g| !g.is_empty()) {
        let mut matched = true;
        for clause in group {
            if !clause.matches(record, operators)? {
                matched = false;
                break;
            }
        }
        if matched {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Keep the records matching `query`, in their original order.
///
/// Every operator is resolved before any record is visited, so an unknown
/// operator fails the query even when no record would reach that clause.
pub fn process(records: &[Value], query: &Query, operators: &Operators) -> Result<Vec<Value>> {
    for clause in query.groups().iter().flatten() {
        operators.get(&clause.operator)?;
    }

    let mut matched = Vec::new();
    for record in records {
        if evaluate(record, query.groups(), operators)? {
            matched.push(record.clone());
        }
    }
    Ok(matched)
}
